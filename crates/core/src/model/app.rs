//! The application model root and its directly-owned entities.

use super::binding::Binding;
use super::component::{Component, ComponentId, ComponentInstance, InterfaceInstance, InterfaceSide};
use super::overridable::Overridable;
use super::process::{ProcessEnv, WatchdogAction, WatchdogTimeout};
use crate::ast::{Location, Token};
use crate::error::{ErrorKind, ModelError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::rc::Rc;

pub const DEFAULT_MAX_FILE_SYSTEM_BYTES: u64 = 128 * 1024;
pub const DEFAULT_MAX_MEMORY_BYTES: u64 = 40000 * 1024;
pub const DEFAULT_MAX_MQUEUE_BYTES: u64 = 512;
pub const DEFAULT_MAX_QUEUED_SIGNALS: u64 = 100;
pub const DEFAULT_MAX_THREADS: u64 = 20;
pub const DEFAULT_MAX_SECURE_STORAGE_BYTES: u64 = 8192;
pub const DEFAULT_CPU_SHARE: u64 = 1024;

// ──────────────────────────────────────────────
// Small value types
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartTrigger {
    Auto,
    Manual,
}

/// Access permission bits for files, directories, devices and config trees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub readable: bool,
    pub writeable: bool,
    pub executable: bool,
}

impl Permissions {
    pub fn read_only() -> Self {
        Permissions {
            readable: true,
            ..Permissions::default()
        }
    }
}

/// A file or directory copied from the build host into the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundledItem {
    pub src_path: PathBuf,
    pub dest_path: PathBuf,
    pub permissions: Permissions,
    pub loc: Location,
}

/// A file or directory on the target made visible inside the sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredItem {
    pub src_path: PathBuf,
    pub dest_path: PathBuf,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredDevice {
    pub src_path: PathBuf,
    pub dest_path: PathBuf,
    pub permissions: Permissions,
    pub loc: Location,
}

// ──────────────────────────────────────────────
// Executables
// ──────────────────────────────────────────────

/// One linkable, runnable artifact of the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Executable {
    pub name: String,
    /// Output path, relative to the app's working directory.
    pub path: PathBuf,
    pub loc: Location,
    pub component_instances: Vec<ComponentInstance>,
    pub has_native_code: bool,
    pub has_managed_code: bool,
}

impl Executable {
    pub fn new(name: &str, loc: &Location) -> Self {
        Executable {
            name: name.to_owned(),
            path: PathBuf::from("staging/read-only/bin").join(name),
            loc: loc.clone(),
            component_instances: Vec::new(),
            has_native_code: false,
            has_managed_code: false,
        }
    }

    pub fn find_component_instance(&self, component_name: &str) -> Option<usize> {
        self.component_instances
            .iter()
            .position(|i| i.name() == component_name)
    }
}

/// Handle to one interface instance inside the app's executable graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRef {
    pub exe: String,
    pub instance: usize,
    pub side: InterfaceSide,
    pub index: usize,
}

// ──────────────────────────────────────────────
// App
// ──────────────────────────────────────────────

/// One fully modelled application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub name: String,
    /// Directory containing the definition file.
    pub dir: PathBuf,
    pub def_file: PathBuf,
    pub version: String,
    pub is_sandboxed: bool,
    pub start_trigger: StartTrigger,

    pub cpu_share: Overridable<u64>,
    pub max_file_system_bytes: Overridable<u64>,
    pub max_memory_bytes: Overridable<u64>,
    pub max_mqueue_bytes: Overridable<u64>,
    pub max_queued_signals: Overridable<u64>,
    pub max_threads: Overridable<u64>,
    pub max_secure_storage_bytes: Overridable<u64>,
    pub watchdog_action: Overridable<WatchdogAction>,
    pub watchdog_timeout: Overridable<WatchdogTimeout>,

    pub components: IndexMap<ComponentId, Rc<Component>>,
    pub executables: IndexMap<String, Executable>,
    pub bundled_files: Vec<BundledItem>,
    pub bundled_dirs: Vec<BundledItem>,
    pub required_files: Vec<RequiredItem>,
    pub required_dirs: Vec<RequiredItem>,
    pub required_devices: Vec<RequiredDevice>,
    pub config_trees: IndexMap<String, Permissions>,
    pub process_envs: Vec<ProcessEnv>,
    pub groups: Vec<String>,

    /// Wildcard bindings keyed by client interface name.
    pub wildcard_bindings: IndexMap<String, Binding>,
    pub extern_client_interfaces: IndexMap<String, InterfaceRef>,
    pub extern_server_interfaces: IndexMap<String, InterfaceRef>,
}

impl App {
    /// Create an empty app named after its definition file's stem.
    pub fn new(def_file: impl Into<PathBuf>) -> Self {
        let def_file = def_file.into();
        let name = def_file
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let dir = def_file
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        App {
            name,
            dir,
            def_file,
            version: String::new(),
            is_sandboxed: true,
            start_trigger: StartTrigger::Auto,
            cpu_share: Overridable::new(DEFAULT_CPU_SHARE),
            max_file_system_bytes: Overridable::new(DEFAULT_MAX_FILE_SYSTEM_BYTES),
            max_memory_bytes: Overridable::new(DEFAULT_MAX_MEMORY_BYTES),
            max_mqueue_bytes: Overridable::new(DEFAULT_MAX_MQUEUE_BYTES),
            max_queued_signals: Overridable::new(DEFAULT_MAX_QUEUED_SIGNALS),
            max_threads: Overridable::new(DEFAULT_MAX_THREADS),
            max_secure_storage_bytes: Overridable::new(DEFAULT_MAX_SECURE_STORAGE_BYTES),
            watchdog_action: Overridable::new(WatchdogAction::Restart),
            watchdog_timeout: Overridable::new(WatchdogTimeout::Never),
            components: IndexMap::new(),
            executables: IndexMap::new(),
            bundled_files: Vec::new(),
            bundled_dirs: Vec::new(),
            required_files: Vec::new(),
            required_dirs: Vec::new(),
            required_devices: Vec::new(),
            config_trees: IndexMap::new(),
            process_envs: Vec::new(),
            groups: Vec::new(),
            wildcard_bindings: IndexMap::new(),
            extern_client_interfaces: IndexMap::new(),
            extern_server_interfaces: IndexMap::new(),
        }
    }

    /// Add a component to the app's component set, keeping the first
    /// occurrence's position.
    pub fn add_component(&mut self, component: &Rc<Component>) {
        self.components
            .entry(component.id)
            .or_insert_with(|| Rc::clone(component));
    }

    pub fn is_extern_name_used(&self, name: &str) -> bool {
        self.extern_client_interfaces.contains_key(name)
            || self.extern_server_interfaces.contains_key(name)
    }

    /// Locate a component instance by exe and component name tokens.
    pub fn find_component_instance(
        &self,
        exe_token: &Token,
        component_token: &Token,
    ) -> Result<(&Executable, usize), ModelError> {
        let exe = self.executables.get(&exe_token.text).ok_or_else(|| {
            ModelError::new(
                ErrorKind::Unresolved,
                &exe_token.loc,
                format!(
                    "Executable '{}' not defined in application.",
                    exe_token.text
                ),
            )
        })?;
        let instance = exe
            .find_component_instance(&component_token.text)
            .ok_or_else(|| {
                ModelError::new(
                    ErrorKind::Unresolved,
                    &component_token.loc,
                    format!(
                        "Component '{}' not found in executable '{}'.",
                        component_token.text, exe_token.text
                    ),
                )
            })?;
        Ok((exe, instance))
    }

    /// Locate a client-side interface instance by exe, component and
    /// interface name tokens.
    pub fn find_client_interface(
        &self,
        exe_token: &Token,
        component_token: &Token,
        interface_token: &Token,
    ) -> Result<InterfaceRef, ModelError> {
        self.find_interface(
            InterfaceSide::Client,
            exe_token,
            component_token,
            interface_token,
        )
    }

    /// Locate a server-side interface instance by exe, component and
    /// interface name tokens.
    pub fn find_server_interface(
        &self,
        exe_token: &Token,
        component_token: &Token,
        interface_token: &Token,
    ) -> Result<InterfaceRef, ModelError> {
        self.find_interface(
            InterfaceSide::Server,
            exe_token,
            component_token,
            interface_token,
        )
    }

    fn find_interface(
        &self,
        side: InterfaceSide,
        exe_token: &Token,
        component_token: &Token,
        interface_token: &Token,
    ) -> Result<InterfaceRef, ModelError> {
        let (exe, instance) = self.find_component_instance(exe_token, component_token)?;
        let component_instance = &exe.component_instances[instance];
        let found = match side {
            InterfaceSide::Client => component_instance.find_client_interface(&interface_token.text),
            InterfaceSide::Server => component_instance.find_server_interface(&interface_token.text),
        };
        let index = found.ok_or_else(|| {
            let side_name = match side {
                InterfaceSide::Client => "Client",
                InterfaceSide::Server => "Server",
            };
            ModelError::new(
                ErrorKind::Unresolved,
                &interface_token.loc,
                format!(
                    "{} interface '{}' not found in component '{}' in executable '{}'.",
                    side_name, interface_token.text, component_token.text, exe_token.text
                ),
            )
        })?;
        Ok(InterfaceRef {
            exe: exe.name.clone(),
            instance,
            side,
            index,
        })
    }

    /// The interface instance a handle points at.
    ///
    /// Handles are only produced by this app's lookups, so a dangling one is
    /// a programming error.
    pub fn interface(&self, r: &InterfaceRef) -> &InterfaceInstance {
        &self.executables[r.exe.as_str()].component_instances[r.instance].interfaces(r.side)
            [r.index]
    }

    pub fn interface_mut(&mut self, r: &InterfaceRef) -> &mut InterfaceInstance {
        &mut self.executables[r.exe.as_str()].component_instances[r.instance]
            .interfaces_mut(r.side)[r.index]
    }
}
