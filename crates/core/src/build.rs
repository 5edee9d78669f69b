//! Five-pass application model builder.
//!
//! This is a thin orchestrator that calls each pass module in order.

use crate::ast::AdefFile;
use crate::context::BuildContext;
use crate::error::ModelError;
use crate::model::App;
use crate::pass1_sections;
use crate::pass2_processes;
use crate::pass3_externs;
use crate::pass4_bindings;
use crate::pass5_check::{self, LimitWarning};
use std::path::Path;
use tracing::info;

/// A fully resolved app plus the advisory warnings found while checking it.
#[derive(Debug)]
pub struct ModelledApp {
    pub app: App,
    pub warnings: Vec<LimitWarning>,
}

/// Build the model for one application definition, or return the first
/// fatal error encountered.
///
/// The definition file's directory is the context's current directory for
/// the duration of the build; the previous one is restored afterwards.
pub fn build_app(adef: &AdefFile, cx: &mut BuildContext<'_>) -> Result<ModelledApp, ModelError> {
    let def_dir = adef.path.parent().unwrap_or(Path::new(".")).to_owned();
    cx.in_dir(&def_dir, |cx| build_in_context(adef, cx))
}

fn build_in_context(adef: &AdefFile, cx: &BuildContext<'_>) -> Result<ModelledApp, ModelError> {
    // Pass 1: walk the sections, deferring what needs the whole graph
    let (mut app, deferred) = pass1_sections::model_sections(adef, cx)?;

    // Pass 2: process environments
    pass2_processes::add_process_envs(&mut app, deferred.processes, cx)?;

    // Pass 3: externs (needs every executable and component instance)
    pass3_externs::make_interfaces_external(&mut app, deferred.externs)?;

    // Pass 4: bindings (needs final external interface names)
    pass4_bindings::add_bindings(&mut app, deferred.bindings)?;

    // Pass 5: consistency checks
    pass5_check::ensure_path_is_set(&mut app);
    let warnings = pass5_check::check_limits_conflicts(&app);

    info!(
        app = %app.name,
        executables = app.executables.len(),
        components = app.components.len(),
        warnings = warnings.len(),
        "application modelled"
    );
    Ok(ModelledApp { app, warnings })
}
