//! Components, their instances inside executables, and IPC interface instances.

use super::binding::Binding;
use crate::ast::Location;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::rc::Rc;

/// Stable handle for a component, assigned by the component modeller.
/// Used as the identity key wherever components are deduplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

/// An IPC interface declared by a component definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiInterface {
    /// Name the component's code uses for the interface.
    pub internal_name: String,
    /// The `.api` file defining the interface.
    pub api_file: PathBuf,
}

/// A reusable unit of source code plus its declared interfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    pub dir: PathBuf,
    pub has_native_code: bool,
    pub has_managed_code: bool,
    pub client_apis: Vec<ApiInterface>,
    pub server_apis: Vec<ApiInterface>,
    /// Components this one depends on; instantiated ahead of it.
    #[serde(default)]
    pub sub_components: Vec<Rc<Component>>,
}

/// One endpoint of an IPC interface on a component instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceInstance {
    /// Current name; overwritten with the external name when externalized.
    pub name: String,
    pub internal_name: String,
    pub api_file: PathBuf,
    /// Location of the extern declaration that exposed this interface.
    pub extern_mark: Option<Location>,
    /// Only ever set on client-side instances.
    pub binding: Option<Binding>,
}

impl InterfaceInstance {
    fn from_declaration(api: &ApiInterface) -> Self {
        InterfaceInstance {
            name: api.internal_name.clone(),
            internal_name: api.internal_name.clone(),
            api_file: api.api_file.clone(),
            extern_mark: None,
            binding: None,
        }
    }

    pub fn is_external(&self) -> bool {
        self.extern_mark.is_some()
    }
}

/// Which interface list of a component instance an interface lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceSide {
    Client,
    Server,
}

/// One instantiation of a component inside one executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstance {
    pub component: Rc<Component>,
    pub client_apis: Vec<InterfaceInstance>,
    pub server_apis: Vec<InterfaceInstance>,
}

impl ComponentInstance {
    pub fn new(component: Rc<Component>) -> Self {
        let client_apis = component
            .client_apis
            .iter()
            .map(InterfaceInstance::from_declaration)
            .collect();
        let server_apis = component
            .server_apis
            .iter()
            .map(InterfaceInstance::from_declaration)
            .collect();
        ComponentInstance {
            component,
            client_apis,
            server_apis,
        }
    }

    pub fn name(&self) -> &str {
        &self.component.name
    }

    /// Position of a client interface, looked up by its declared name.
    pub fn find_client_interface(&self, internal_name: &str) -> Option<usize> {
        self.client_apis
            .iter()
            .position(|i| i.internal_name == internal_name)
    }

    /// Position of a server interface, looked up by its declared name.
    pub fn find_server_interface(&self, internal_name: &str) -> Option<usize> {
        self.server_apis
            .iter()
            .position(|i| i.internal_name == internal_name)
    }

    pub fn interfaces(&self, side: InterfaceSide) -> &[InterfaceInstance] {
        match side {
            InterfaceSide::Client => &self.client_apis,
            InterfaceSide::Server => &self.server_apis,
        }
    }

    pub fn interfaces_mut(&mut self, side: InterfaceSide) -> &mut [InterfaceInstance] {
        match side {
            InterfaceSide::Client => &mut self.client_apis,
            InterfaceSide::Server => &mut self.server_apis,
        }
    }
}
