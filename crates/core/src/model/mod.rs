//! The application model: the validated, cross-referenced description of an
//! app that code generators and packagers consume.

mod app;
mod binding;
mod component;
mod overridable;
mod process;

pub use app::*;
pub use binding::{Binding, EndpointType};
pub use component::{
    ApiInterface, Component, ComponentId, ComponentInstance, InterfaceInstance, InterfaceSide,
};
pub use overridable::Overridable;
pub use process::*;
