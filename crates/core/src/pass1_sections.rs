//! Pass 1: single ordered walk over the top-level sections.
//!
//! Sections whose meaning depends on the complete executable graph
//! (`processes`, `bindings`, and every extern candidate from `extern`,
//! `provides` and `requires`) are collected into [`Deferred`] and handed
//! to the later passes.

use crate::ast::*;
use crate::context::BuildContext;
use crate::error::{ErrorKind, ModelError};
use crate::extract;
use crate::instantiate;
use crate::model::App;
use tracing::debug;

/// Work that can only be done once pass 1 has seen every section.
#[derive(Debug, Default)]
pub struct Deferred<'a> {
    pub processes: Vec<&'a Section>,
    pub bindings: Vec<&'a Section>,
    /// Extern candidates, 3 or 4 tokens each, in file order per section.
    pub externs: Vec<&'a Item>,
}

pub fn model_sections<'a>(
    adef: &'a AdefFile,
    cx: &BuildContext<'_>,
) -> Result<(App, Deferred<'a>), ModelError> {
    let mut app = App::new(&adef.path);
    let mut deferred = Deferred::default();

    debug!(app = %app.name, path = %adef.path.display(), "modelling application");

    for section in &adef.sections {
        match AppSectionKind::classify(section)? {
            AppSectionKind::Bindings => deferred.bindings.push(section),
            AppSectionKind::Bundles => add_bundled_items(&mut app, section, cx)?,
            AppSectionKind::Components => add_components(&mut app, section, cx)?,
            AppSectionKind::CpuShare => {
                app.cpu_share.set(extract::positive_int(section.as_simple()?)?)
            }
            AppSectionKind::Executables => add_executables(&mut app, section, cx)?,
            AppSectionKind::Extern => deferred.externs.extend(section.as_item_list()?),
            AppSectionKind::Groups => app.groups.extend(
                section
                    .as_token_list()?
                    .iter()
                    .map(|token| token.text.clone()),
            ),
            AppSectionKind::MaxFileSystemBytes => app
                .max_file_system_bytes
                .set(extract::non_negative_int(section.as_simple()?)?),
            AppSectionKind::MaxMemoryBytes => app
                .max_memory_bytes
                .set(extract::positive_int(section.as_simple()?)?),
            AppSectionKind::MaxMQueueBytes => app
                .max_mqueue_bytes
                .set(extract::non_negative_int(section.as_simple()?)?),
            AppSectionKind::MaxQueuedSignals => app
                .max_queued_signals
                .set(extract::non_negative_int(section.as_simple()?)?),
            AppSectionKind::MaxThreads => app
                .max_threads
                .set(extract::positive_int(section.as_simple()?)?),
            AppSectionKind::MaxSecureStorageBytes => app
                .max_secure_storage_bytes
                .set(extract::non_negative_int(section.as_simple()?)?),
            AppSectionKind::Processes => deferred.processes.push(section),
            AppSectionKind::Provides => add_provided_items(&mut deferred, section)?,
            AppSectionKind::Requires => add_required_items(&mut app, &mut deferred, section, cx)?,
            AppSectionKind::Sandboxed => {
                app.is_sandboxed = section.as_simple()?.text != "false";
            }
            AppSectionKind::Start => {
                app.start_trigger = instantiate::start_trigger(section.as_simple()?)?;
            }
            AppSectionKind::Version => {
                let token = section.as_simple()?;
                app.version = if token.text.starts_with('$') {
                    cx.substitute(token)?
                } else {
                    token.text.clone()
                };
            }
            AppSectionKind::WatchdogAction => app
                .watchdog_action
                .set(instantiate::watchdog_action(section.as_simple()?)?),
            AppSectionKind::WatchdogTimeout => app
                .watchdog_timeout
                .set(instantiate::watchdog_timeout(section.as_simple()?)?),
        }
    }

    Ok((app, deferred))
}

fn unrecognized(section: &Section) -> ModelError {
    ModelError::internal(
        &section.loc,
        format!("Internal error: Unrecognized section '{}'.", section.name),
    )
}

// ── Bundles ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum BundledKind {
    File,
    Dir,
}

fn add_bundled_items(
    app: &mut App,
    section: &Section,
    cx: &BuildContext<'_>,
) -> Result<(), ModelError> {
    for subsection in section.as_complex()? {
        let kind = match subsection.name.as_str() {
            "file" => BundledKind::File,
            "dir" => BundledKind::Dir,
            _ => return Err(unrecognized(subsection)),
        };

        for item in subsection.as_item_list()? {
            let bundled = extract::bundled_item(item, &app.dir, cx)?;
            let src = &bundled.src_path;

            let (is_right_kind, wrong_kind, missing) = match kind {
                BundledKind::File => (cx.fs.is_file(src), "Not a regular file", "File not found"),
                BundledKind::Dir => (cx.fs.is_dir(src), "Not a directory", "Directory not found"),
            };
            if !is_right_kind {
                let what = if cx.fs.exists(src) { wrong_kind } else { missing };
                return Err(ModelError::new(
                    ErrorKind::BadPath,
                    &item.loc,
                    format!("{}: '{}'.", what, src.display()),
                ));
            }

            match kind {
                BundledKind::File => app.bundled_files.push(bundled),
                BundledKind::Dir => app.bundled_dirs.push(bundled),
            }
        }
    }
    Ok(())
}

// ── Components and executables ────────────────────────────────────────────────

fn add_components(
    app: &mut App,
    section: &Section,
    cx: &BuildContext<'_>,
) -> Result<(), ModelError> {
    let search_dirs = [app.dir.clone()];
    for reference in section.as_token_list()? {
        if let Some(component) = cx.components.component(reference, &search_dirs, cx)? {
            debug!(
                app = %app.name,
                component = %component.name,
                dir = %component.dir.display(),
                "app contains component"
            );
            app.add_component(&component);
        }
    }
    Ok(())
}

fn add_executables(
    app: &mut App,
    section: &Section,
    cx: &BuildContext<'_>,
) -> Result<(), ModelError> {
    for item in section.as_item_list()? {
        let exe = instantiate::new_executable(item, app, cx)?;
        instantiate::add_executable(app, exe)?;
    }
    Ok(())
}

// ── Provides / requires ───────────────────────────────────────────────────────

fn add_provided_items<'a>(
    deferred: &mut Deferred<'a>,
    section: &'a Section,
) -> Result<(), ModelError> {
    for subsection in section.as_complex()? {
        match subsection.name.as_str() {
            "api" => deferred.externs.extend(subsection.as_item_list()?),
            _ => return Err(unrecognized(subsection)),
        }
    }
    Ok(())
}

fn add_required_items<'a>(
    app: &mut App,
    deferred: &mut Deferred<'a>,
    section: &'a Section,
    cx: &BuildContext<'_>,
) -> Result<(), ModelError> {
    for subsection in section.as_complex()? {
        match subsection.name.as_str() {
            "api" => deferred.externs.extend(subsection.as_item_list()?),
            "file" => {
                for item in subsection.as_item_list()? {
                    app.required_files.push(extract::required_item(item, cx)?);
                }
            }
            "dir" => {
                for item in subsection.as_item_list()? {
                    app.required_dirs.push(extract::required_item(item, cx)?);
                }
            }
            "device" => {
                for item in subsection.as_item_list()? {
                    app.required_devices
                        .push(extract::required_device(item, cx)?);
                }
            }
            "configTree" => {
                for item in subsection.as_item_list()? {
                    instantiate::add_config_tree(app, item)?;
                }
            }
            _ => return Err(unrecognized(subsection)),
        }
    }
    Ok(())
}
