#![allow(clippy::result_large_err)]
//! adef-core: application model builder.
//!
//! Turns the section tree of a parsed application definition into a fully
//! cross-referenced [`App`] model: executables, component instances, extern
//! interfaces, IPC bindings, process environments, limits and grants.
//!
//! # Public API
//!
//! - [`build_app()`] -- run the five-pass pipeline
//! - [`BuildContext`] -- collaborators plus the current directory
//! - [`ModelError`] -- fatal modelling error (first one wins)
//! - [`LimitWarning`] -- advisory limit conflict
//! - Section tree types: [`AdefFile`], [`Section`], [`SectionBody`], [`Item`],
//!   [`Token`], [`Location`]
//!
//! Individual pass entry functions are also re-exported for selective
//! pipeline execution.

pub mod ast;
pub mod build;
pub mod context;
pub mod error;
pub mod extract;
pub mod instantiate;
pub mod model;
pub mod pass1_sections;
pub mod pass2_processes;
pub mod pass3_externs;
pub mod pass4_bindings;
pub mod pass5_check;
pub mod provider;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{AdefFile, AppSectionKind, Item, Location, Section, SectionBody, Token, TokenKind};
pub use context::BuildContext;
pub use error::{ErrorKind, ModelError};
pub use model::App;
pub use pass5_check::{LimitConflict, LimitWarning};
pub use provider::{
    ComponentCatalog, ComponentDef, ComponentModeller, EnvVarSubstitution, FileSystem,
    HostFileSystem, InMemoryFileSystem, VarSubstitution,
};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use build::{build_app, ModelledApp};
pub use pass1_sections::model_sections;
pub use pass2_processes::add_process_envs;
pub use pass3_externs::make_interfaces_external;
pub use pass4_bindings::add_bindings;
pub use pass5_check::{check_limits_conflicts, ensure_path_is_set};
