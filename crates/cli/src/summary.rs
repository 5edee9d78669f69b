//! Human-readable application summary.

use adef_core::model::{App, Binding, EndpointType, InterfaceInstance, Permissions, StartTrigger};
use adef_core::ModelledApp;
use std::io::{self, Write};

fn permissions(p: &Permissions) -> String {
    let mut flags = Vec::new();
    if p.readable {
        flags.push("read");
    }
    if p.writeable {
        flags.push("write");
    }
    if p.executable {
        flags.push("execute");
    }
    if flags.is_empty() {
        "none".to_string()
    } else {
        flags.join(" + ")
    }
}

fn binding_target(binding: &Binding) -> String {
    match binding.server_type {
        EndpointType::Internal => format!("'{}'", binding.server_if_name),
        EndpointType::ExternalApp => format!(
            "app '{}' interface '{}'",
            binding.server_agent_name, binding.server_if_name
        ),
        EndpointType::ExternalUser => format!(
            "user '{}' interface '{}'",
            binding.server_agent_name, binding.server_if_name
        ),
    }
}

/// Write the summary of a modelled app to `out`.
pub fn write_summary(out: &mut impl Write, modelled: &ModelledApp) -> io::Result<()> {
    let app = &modelled.app;

    writeln!(out)?;
    writeln!(out, "== '{}' application summary ==", app.name)?;
    writeln!(out)?;

    if !app.version.is_empty() {
        writeln!(out, "  Version: {}", app.version)?;
    }

    if !app.components.is_empty() {
        writeln!(out, "  Uses components:")?;
        for component in app.components.values() {
            writeln!(out, "    '{}'", component.name)?;
        }
    }

    if !app.executables.is_empty() {
        writeln!(out, "  Builds executables:")?;
        for exe in app.executables.values() {
            writeln!(out, "    '{}' ({})", exe.name, exe.path.display())?;
            if !exe.component_instances.is_empty() {
                writeln!(out, "      Instantiates components:")?;
                for instance in &exe.component_instances {
                    writeln!(out, "        '{}'", instance.name())?;
                }
            }
        }
    }

    for (heading, bundled) in [
        ("  Includes files from the build host:", &app.bundled_files),
        ("  Includes directories from the build host:", &app.bundled_dirs),
    ] {
        if bundled.is_empty() {
            continue;
        }
        writeln!(out, "{}", heading)?;
        for item in bundled {
            writeln!(out, "    '{}':", item.src_path.display())?;
            writeln!(out, "      appearing inside app as: '{}'", item.dest_path.display())?;
            writeln!(out, "      permissions: {}", permissions(&item.permissions))?;
        }
    }

    if app.is_sandboxed {
        write_sandbox(out, app)?;
    } else {
        writeln!(out, "  WARNING: This application is UNSANDBOXED.")?;
    }

    match app.start_trigger {
        StartTrigger::Auto => writeln!(
            out,
            "  Will be started automatically when the Legato framework starts."
        )?,
        StartTrigger::Manual => writeln!(out, "  Will only start when requested to start.")?,
    }

    write_processes(out, app)?;

    if app.is_sandboxed && !app.groups.is_empty() {
        writeln!(out, "  Will be a member of the following access control groups:")?;
        for group in &app.groups {
            writeln!(out, "    {}", group)?;
        }
    }

    write_interfaces(out, app)?;

    if !modelled.warnings.is_empty() {
        writeln!(out, "  Limit warnings:")?;
        for warning in &modelled.warnings {
            writeln!(out, "    {}", warning.message)?;
        }
    }

    writeln!(out)
}

fn write_sandbox(out: &mut impl Write, app: &App) -> io::Result<()> {
    writeln!(out, "  Runs inside a sandbox.")?;

    for (heading, required) in [
        ("  Imports the following files from the target host:", &app.required_files),
        ("  Imports the following directories from the target host:", &app.required_dirs),
    ] {
        if required.is_empty() {
            continue;
        }
        writeln!(out, "{}", heading)?;
        for item in required {
            writeln!(out, "    '{}':", item.src_path.display())?;
            writeln!(out, "      appearing inside app as: '{}'", item.dest_path.display())?;
        }
    }

    if !app.required_devices.is_empty() {
        writeln!(out, "  Imports the following devices from the target host:")?;
        for device in &app.required_devices {
            writeln!(out, "    '{}':", device.src_path.display())?;
            writeln!(out, "      appearing inside app as: '{}'", device.dest_path.display())?;
            writeln!(out, "      permissions: {}", permissions(&device.permissions))?;
        }
    }

    writeln!(out, "  Has the following limits:")?;
    writeln!(out, "    maxSecureStorageBytes: {}", app.max_secure_storage_bytes.get())?;
    writeln!(out, "    maxThreads: {}", app.max_threads.get())?;
    writeln!(out, "    maxMQueueBytes: {}", app.max_mqueue_bytes.get())?;
    writeln!(out, "    maxQueuedSignals: {}", app.max_queued_signals.get())?;
    writeln!(out, "    maxMemoryBytes: {}", app.max_memory_bytes.get())?;
    writeln!(out, "    cpuShare: {}", app.cpu_share.get())?;
    writeln!(out, "    maxFileSystemBytes: {}", app.max_file_system_bytes.get())?;

    writeln!(out, "  Has access to the following configuration trees:")?;
    writeln!(out, "    Its own tree: read + write")?;
    for (tree, perms) in &app.config_trees {
        let access = if perms.writeable {
            "read + write"
        } else {
            "read only"
        };
        writeln!(out, "    {}: {}", tree, access)?;
    }
    Ok(())
}

fn write_processes(out: &mut impl Write, app: &App) -> io::Result<()> {
    let mut any_process = false;

    for env in &app.process_envs {
        for process in &env.processes {
            any_process = true;
            writeln!(out, "  When started, will run process: '{}'", process.name)?;
            writeln!(out, "    Executing file: '{}'", process.exe_path)?;

            if process.args.is_empty() {
                writeln!(out, "    Without any command line arguments.")?;
            } else {
                writeln!(out, "    With the following command line arguments:")?;
                for arg in &process.args {
                    writeln!(out, "      '{}'", arg)?;
                }
            }

            if let Some(priority) = env.start_priority.value() {
                writeln!(out, "    At priority: {}", priority)?;
            }

            writeln!(out, "    With the following environment variables:")?;
            for (name, value) in &env.env_vars {
                writeln!(out, "      {}={}", name, value)?;
            }

            match env.fault_action.value() {
                Some(action) => writeln!(out, "    Fault recovery action: {}", action.as_str())?,
                None => writeln!(out, "    Fault recovery action: ignore (default)")?,
            }

            let timeout = env.effective_watchdog_timeout(&app.watchdog_timeout);
            let action = env.effective_watchdog_action(&app.watchdog_action);
            if let Some(timeout) = timeout {
                writeln!(out, "    Watchdog timeout: {}", timeout)?;
            }
            if let Some(action) = action {
                writeln!(out, "    Watchdog action: {}", action.as_str())?;
            }
            if timeout.is_none() && action.is_none() {
                writeln!(out, "    Watchdog timeout: disabled")?;
            }

            if app.is_sandboxed {
                writeln!(out, "    With the following limits:")?;
                writeln!(
                    out,
                    "      Max. core dump file size: {} bytes",
                    env.max_core_dump_file_bytes.get()
                )?;
                writeln!(out, "      Max. file size: {} bytes", env.max_file_bytes.get())?;
                writeln!(
                    out,
                    "      Max. locked memory size: {} bytes",
                    env.max_locked_memory_bytes.get()
                )?;
                writeln!(
                    out,
                    "      Max. number of file descriptors: {}",
                    env.max_file_descriptors.get()
                )?;
            }
        }
    }

    if !any_process && app.is_sandboxed {
        writeln!(
            out,
            "  When \"started\", will create a sandbox without running anything in it."
        )?;
    }
    Ok(())
}

fn write_api_file(out: &mut impl Write, interface: &InterfaceInstance) -> io::Result<()> {
    writeln!(out, "        API defined in: '{}'", interface.api_file.display())
}

fn write_interfaces(out: &mut impl Write, app: &App) -> io::Result<()> {
    for exe in app.executables.values() {
        writeln!(out, "  Executable '{}':", exe.name)?;

        let servers: Vec<&InterfaceInstance> = exe
            .component_instances
            .iter()
            .flat_map(|i| &i.server_apis)
            .collect();
        let (bound, unbound): (Vec<&InterfaceInstance>, Vec<&InterfaceInstance>) = exe
            .component_instances
            .iter()
            .flat_map(|i| &i.client_apis)
            .partition(|i| i.binding.is_some());

        if !servers.is_empty() {
            writeln!(out, "    Serves the following IPC API interfaces:")?;
            for interface in servers {
                writeln!(out, "      '{}'", interface.name)?;
                write_api_file(out, interface)?;
            }
        }

        if !bound.is_empty() || !unbound.is_empty() {
            writeln!(out, "    Has the following client-side IPC API interfaces:")?;
            for interface in bound {
                if let Some(binding) = &interface.binding {
                    writeln!(
                        out,
                        "      '{}' -> {}",
                        interface.name,
                        binding_target(binding)
                    )?;
                }
                write_api_file(out, interface)?;
            }
            for interface in unbound {
                writeln!(out, "      '{}' -> UNBOUND.", interface.name)?;
                write_api_file(out, interface)?;
            }
        }
    }

    if !app.wildcard_bindings.is_empty() {
        writeln!(out, "  Has the following \"wildcard\" interface bindings:")?;
        for (interface, binding) in &app.wildcard_bindings {
            writeln!(out, "    '{}' -> {}", interface, binding_target(binding))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adef_core::model::{BundledItem, ProcessEnv, Process};
    use adef_core::Location;
    use std::path::PathBuf;

    fn render(modelled: &ModelledApp) -> String {
        let mut out = Vec::new();
        write_summary(&mut out, modelled).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn modelled(app: App) -> ModelledApp {
        ModelledApp {
            app,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn empty_sandboxed_app() {
        let text = render(&modelled(App::new("/apps/hello.adef")));
        assert!(text.contains("== 'hello' application summary =="));
        assert!(text.contains("  Runs inside a sandbox."));
        assert!(text.contains("    maxThreads: 20"));
        assert!(text.contains("will create a sandbox without running anything in it."));
        assert!(text.contains("Will be started automatically"));
    }

    #[test]
    fn unsandboxed_app_skips_limits() {
        let mut app = App::new("/apps/hello.adef");
        app.is_sandboxed = false;
        let text = render(&modelled(app));
        assert!(text.contains("UNSANDBOXED"));
        assert!(!text.contains("Has the following limits:"));
    }

    #[test]
    fn processes_and_bundles() {
        let loc = Location::new("hello.adef", 3, 1);
        let mut app = App::new("/apps/hello.adef");
        app.bundled_files.push(BundledItem {
            src_path: PathBuf::from("/apps/cfg.json"),
            dest_path: PathBuf::from("/etc/cfg.json"),
            permissions: Permissions::read_only(),
            loc: loc.clone(),
        });
        let mut env = ProcessEnv::default();
        env.processes.push(Process {
            name: "main".to_string(),
            exe_path: "hello".to_string(),
            args: vec!["-q".to_string()],
            loc,
        });
        env.env_vars.insert("PATH".to_string(), "/bin".to_string());
        app.process_envs.push(env);

        let text = render(&modelled(app));
        assert!(text.contains("    '/apps/cfg.json':"));
        assert!(text.contains("      permissions: read"));
        assert!(text.contains("  When started, will run process: 'main'"));
        assert!(text.contains("      '-q'"));
        assert!(text.contains("      PATH=/bin"));
        assert!(text.contains("    Fault recovery action: ignore (default)"));
        assert!(text.contains("    Watchdog timeout: disabled"));
    }
}
