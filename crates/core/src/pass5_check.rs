//! Pass 5: consistency checks on the finished model.
//!
//! Backfills `PATH` in process environments that lack one and reports
//! resource limits that will be clamped by a broader limit at run time.
//! Limit conflicts are advisory and never change the model.

use crate::model::App;
use serde::Serialize;
use std::fmt;
use tracing::warn;

pub const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Which pair of limits is in conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitConflict {
    LockedMemoryExceedsMemory,
    CoreDumpExceedsFileSize,
    CoreDumpExceedsFileSystem,
    FileSizeExceedsFileSystem,
}

/// A narrower limit that exceeds the broader limit containing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitWarning {
    pub app: String,
    pub conflict: LimitConflict,
    /// Index of the process environment the narrower limit belongs to.
    pub process_env: usize,
    pub narrower: u64,
    pub broader: u64,
    pub message: String,
}

impl fmt::Display for LimitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "** WARNING: application {}: {}", self.app, self.message)
    }
}

/// Give every process environment without a `PATH` the default one.
/// Unsandboxed apps also search their own installed `bin` directory.
pub fn ensure_path_is_set(app: &mut App) {
    let default_path = if app.is_sandboxed {
        DEFAULT_PATH.to_owned()
    } else {
        format!(
            "/legato/systems/current/apps/{}/read-only/bin:{}",
            app.name, DEFAULT_PATH
        )
    };

    for env in &mut app.process_envs {
        env.env_vars
            .entry("PATH".to_owned())
            .or_insert_with(|| default_path.clone());
    }
}

/// Compare related limits in every process environment and return one
/// warning per conflict, in environment order.
pub fn check_limits_conflicts(app: &App) -> Vec<LimitWarning> {
    let max_memory_bytes = app.max_memory_bytes.get();
    let max_file_system_bytes = app.max_file_system_bytes.get();
    let mut warnings = Vec::new();

    for (index, env) in app.process_envs.iter().enumerate() {
        let max_locked_memory_bytes = env.max_locked_memory_bytes.get();
        let max_file_bytes = env.max_file_bytes.get();
        let max_core_dump_file_bytes = env.max_core_dump_file_bytes.get();

        let mut report = |conflict, narrower: u64, broader: u64, message: String| {
            let warning = LimitWarning {
                app: app.name.clone(),
                conflict,
                process_env: index,
                narrower,
                broader,
                message,
            };
            warn!("{}", warning);
            warnings.push(warning);
        };

        if max_locked_memory_bytes > max_memory_bytes {
            report(
                LimitConflict::LockedMemoryExceedsMemory,
                max_locked_memory_bytes,
                max_memory_bytes,
                format!(
                    "maxLockedMemoryBytes ({}) will be limited by the maxMemoryBytes limit ({}).",
                    max_locked_memory_bytes, max_memory_bytes
                ),
            );
        }

        if max_core_dump_file_bytes > max_file_bytes {
            report(
                LimitConflict::CoreDumpExceedsFileSize,
                max_core_dump_file_bytes,
                max_file_bytes,
                format!(
                    "maxCoreDumpFileBytes ({}) will be limited by the maxFileBytes limit ({}).",
                    max_core_dump_file_bytes, max_file_bytes
                ),
            );
        }

        if max_core_dump_file_bytes > max_file_system_bytes {
            report(
                LimitConflict::CoreDumpExceedsFileSystem,
                max_core_dump_file_bytes,
                max_file_system_bytes,
                format!(
                    "maxCoreDumpFileBytes ({}) will be limited by the maxFileSystemBytes limit ({}) \
                     if the core file is inside the sandbox temporary file system.",
                    max_core_dump_file_bytes, max_file_system_bytes
                ),
            );
        }

        if max_file_bytes > max_file_system_bytes {
            report(
                LimitConflict::FileSizeExceedsFileSystem,
                max_file_bytes,
                max_file_system_bytes,
                format!(
                    "maxFileBytes ({}) will be limited by the maxFileSystemBytes limit ({}) \
                     if the file is inside the sandbox temporary file system.",
                    max_file_bytes, max_file_system_bytes
                ),
            );
        }
    }

    warnings
}
