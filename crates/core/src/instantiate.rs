//! Entity instantiators: build executables, component instances, process
//! environments and config tree grants from their sections.

use crate::ast::{Item, Section, Token, TokenKind};
use crate::context::BuildContext;
use crate::error::{ErrorKind, ModelError};
use crate::extract;
use crate::model::*;
use std::rc::Rc;
use tracing::debug;

// ──────────────────────────────────────────────
// Keyword values
// ──────────────────────────────────────────────

fn bad_keyword(token: &Token, what: &str) -> ModelError {
    ModelError::new(
        ErrorKind::BadValue,
        &token.loc,
        format!("Unknown {} '{}'.", what, token.text),
    )
}

pub fn start_trigger(token: &Token) -> Result<StartTrigger, ModelError> {
    match token.text.as_str() {
        "auto" => Ok(StartTrigger::Auto),
        "manual" => Ok(StartTrigger::Manual),
        _ => Err(bad_keyword(token, "start trigger")),
    }
}

pub fn fault_action(token: &Token) -> Result<FaultAction, ModelError> {
    FaultAction::from_keyword(&token.text).ok_or_else(|| bad_keyword(token, "fault action"))
}

pub fn watchdog_action(token: &Token) -> Result<WatchdogAction, ModelError> {
    WatchdogAction::from_keyword(&token.text).ok_or_else(|| bad_keyword(token, "watchdog action"))
}

pub fn priority(token: &Token) -> Result<Priority, ModelError> {
    Priority::from_keyword(&token.text).ok_or_else(|| bad_keyword(token, "priority"))
}

/// `never` (a name token) or a millisecond count.
pub fn watchdog_timeout(token: &Token) -> Result<WatchdogTimeout, ModelError> {
    if token.kind == TokenKind::Name {
        return match token.text.as_str() {
            "never" => Ok(WatchdogTimeout::Never),
            _ => Err(bad_keyword(token, "watchdog timeout")),
        };
    }
    Ok(WatchdogTimeout::Millis(extract::non_negative_int(token)?))
}

// ──────────────────────────────────────────────
// Executables and component instances
// ──────────────────────────────────────────────

/// Instantiate `component` (after its sub-components) inside `exe`. A
/// component is instantiated at most once per executable.
pub fn add_component_instance(exe: &mut Executable, component: &Rc<Component>) {
    if exe
        .component_instances
        .iter()
        .any(|i| i.component.id == component.id)
    {
        return;
    }

    for sub in &component.sub_components {
        add_component_instance(exe, sub);
    }

    exe.has_native_code |= component.has_native_code;
    exe.has_managed_code |= component.has_managed_code;
    exe.component_instances
        .push(ComponentInstance::new(Rc::clone(component)));
}

/// Build an executable from one item of the `executables:` section.
pub fn new_executable(
    item: &Item,
    app: &App,
    cx: &BuildContext<'_>,
) -> Result<Executable, ModelError> {
    let name_token = item.name_token()?;
    debug!(app = %app.name, exe = %name_token.text, "app contains executable");

    let mut exe = Executable::new(&name_token.text, &item.loc);
    let search_dirs = [app.dir.clone()];

    for reference in &item.tokens {
        let Some(component) = cx.components.component(reference, &search_dirs, cx)? else {
            continue;
        };
        debug!(
            app = %app.name,
            exe = %exe.name,
            component = %component.name,
            dir = %component.dir.display(),
            "executable contains component"
        );
        add_component_instance(&mut exe, &component);
    }

    if exe.has_managed_code {
        let mut path = std::mem::take(&mut exe.path).into_os_string();
        path.push(".jar");
        exe.path = path.into();
    }
    Ok(exe)
}

/// Add a finished executable to the app, pulling every component it uses
/// into the app's component set.
pub fn add_executable(app: &mut App, exe: Executable) -> Result<(), ModelError> {
    if let Some(first) = app.executables.get(&exe.name) {
        return Err(ModelError::new(
            ErrorKind::DuplicateExecutable,
            &exe.loc,
            format!("Duplicate executable found: {}.", exe.name),
        )
        .with_previous(&first.loc));
    }

    if !exe.has_native_code && !exe.has_managed_code {
        return Err(ModelError::new(
            ErrorKind::NoSourceCode,
            &exe.loc,
            "Executable doesn't contain any components that have source code files.",
        ));
    }

    for instance in &exe.component_instances {
        app.add_component(&instance.component);
    }
    app.executables.insert(exe.name.clone(), exe);
    Ok(())
}

// ──────────────────────────────────────────────
// Config trees
// ──────────────────────────────────────────────

pub fn add_config_tree(app: &mut App, item: &Item) -> Result<(), ModelError> {
    let (name, permissions, name_token) = extract::config_tree(item, &app.name)?;
    if app.config_trees.contains_key(&name) {
        return Err(ModelError::new(
            ErrorKind::DuplicateConfigTree,
            &name_token.loc,
            format!(
                "Configuration tree '{}' appears in application more than once.",
                name
            ),
        ));
    }
    app.config_trees.insert(name, permissions);
    Ok(())
}

// ──────────────────────────────────────────────
// Process environments
// ──────────────────────────────────────────────

/// One item of a `run:` subsection. Without an explicit name the exe path
/// doubles as the process name.
pub fn new_process(item: &Item) -> Result<Process, ModelError> {
    let exe_path = extract::unquote(&item.token(0, "executable path")?.text).to_owned();
    let name = match &item.name {
        Some(token) => token.text.clone(),
        None => exe_path.clone(),
    };
    let args = item.tokens[1..]
        .iter()
        .map(|t| extract::unquote(&t.text).to_owned())
        .collect();
    Ok(Process {
        name,
        exe_path,
        args,
        loc: item.loc.clone(),
    })
}

/// Build a process environment from one `processes:` section.
pub fn new_process_env(section: &Section, cx: &BuildContext<'_>) -> Result<ProcessEnv, ModelError> {
    let mut env = ProcessEnv::default();

    for subsection in section.as_complex()? {
        match subsection.name.as_str() {
            "run" => {
                for item in subsection.as_item_list()? {
                    env.processes.push(new_process(item)?);
                }
            }
            "envVars" => {
                for item in subsection.as_item_list()? {
                    let name = item.name_token()?;
                    let value_token = item.token(0, "environment variable value")?;
                    let value = cx.substitute(value_token)?;
                    env.env_vars
                        .insert(name.text.clone(), extract::unquote(&value).to_owned());
                }
            }
            "faultAction" => env.fault_action.set(fault_action(subsection.as_simple()?)?),
            "priority" => env.start_priority.set(priority(subsection.as_simple()?)?),
            "maxCoreDumpFileBytes" => env
                .max_core_dump_file_bytes
                .set(extract::non_negative_int(subsection.as_simple()?)?),
            "maxFileBytes" => env
                .max_file_bytes
                .set(extract::non_negative_int(subsection.as_simple()?)?),
            "maxFileDescriptors" => env
                .max_file_descriptors
                .set(extract::positive_int(subsection.as_simple()?)?),
            "maxLockedMemoryBytes" => env
                .max_locked_memory_bytes
                .set(extract::non_negative_int(subsection.as_simple()?)?),
            "watchdogAction" => env
                .watchdog_action
                .set(watchdog_action(subsection.as_simple()?)?),
            "watchdogTimeout" => env
                .watchdog_timeout
                .set(watchdog_timeout(subsection.as_simple()?)?),
            other => {
                return Err(ModelError::internal(
                    &subsection.loc,
                    format!("Internal error: Unrecognized section '{}'.", other),
                ))
            }
        }
    }

    Ok(env)
}
