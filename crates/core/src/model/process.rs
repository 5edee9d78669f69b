//! Process environments and the processes launched inside them.

use super::overridable::Overridable;
use crate::ast::Location;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_MAX_CORE_DUMP_FILE_BYTES: u64 = 8192;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 90 * 1024;
pub const DEFAULT_MAX_FILE_DESCRIPTORS: u64 = 256;
pub const DEFAULT_MAX_LOCKED_MEMORY_BYTES: u64 = 8192;

// ──────────────────────────────────────────────
// Vocabularies
// ──────────────────────────────────────────────

/// What the supervisor does when a process faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FaultAction {
    Ignore,
    Restart,
    RestartApp,
    StopApp,
    Reboot,
}

impl FaultAction {
    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            "ignore" => Some(FaultAction::Ignore),
            "restart" => Some(FaultAction::Restart),
            "restartApp" => Some(FaultAction::RestartApp),
            "stopApp" => Some(FaultAction::StopApp),
            "reboot" => Some(FaultAction::Reboot),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FaultAction::Ignore => "ignore",
            FaultAction::Restart => "restart",
            FaultAction::RestartApp => "restartApp",
            FaultAction::StopApp => "stopApp",
            FaultAction::Reboot => "reboot",
        }
    }
}

/// What the supervisor does when a watchdog expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WatchdogAction {
    Ignore,
    Restart,
    Stop,
    RestartApp,
    StopApp,
    Reboot,
}

impl WatchdogAction {
    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            "ignore" => Some(WatchdogAction::Ignore),
            "restart" => Some(WatchdogAction::Restart),
            "stop" => Some(WatchdogAction::Stop),
            "restartApp" => Some(WatchdogAction::RestartApp),
            "stopApp" => Some(WatchdogAction::StopApp),
            "reboot" => Some(WatchdogAction::Reboot),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WatchdogAction::Ignore => "ignore",
            WatchdogAction::Restart => "restart",
            WatchdogAction::Stop => "stop",
            WatchdogAction::RestartApp => "restartApp",
            WatchdogAction::StopApp => "stopApp",
            WatchdogAction::Reboot => "reboot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchdogTimeout {
    /// The watchdog never expires.
    Never,
    Millis(u64),
}

impl fmt::Display for WatchdogTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchdogTimeout::Never => f.write_str("never"),
            WatchdogTimeout::Millis(ms) => write!(f, "{}", ms),
        }
    }
}

/// Start priority of the processes in an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Idle,
    Low,
    Medium,
    High,
    /// Real-time levels `rt1` through `rt32`.
    RealTime(u8),
}

impl Priority {
    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            "idle" => Some(Priority::Idle),
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => {
                let level: u8 = text.strip_prefix("rt")?.parse().ok()?;
                (1..=32).contains(&level).then_some(Priority::RealTime(level))
            }
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Idle => f.write_str("idle"),
            Priority::Low => f.write_str("low"),
            Priority::Medium => f.write_str("medium"),
            Priority::High => f.write_str("high"),
            Priority::RealTime(level) => write!(f, "rt{}", level),
        }
    }
}

// ──────────────────────────────────────────────
// Entities
// ──────────────────────────────────────────────

/// One OS process to launch when the app starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub name: String,
    pub exe_path: String,
    pub args: Vec<String>,
    pub loc: Location,
}

/// Run-time settings shared by the processes of one `processes:` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessEnv {
    pub processes: Vec<Process>,
    pub env_vars: BTreeMap<String, String>,
    pub fault_action: Overridable<FaultAction>,
    pub start_priority: Overridable<Priority>,
    pub watchdog_action: Overridable<WatchdogAction>,
    pub watchdog_timeout: Overridable<WatchdogTimeout>,
    pub max_core_dump_file_bytes: Overridable<u64>,
    pub max_file_bytes: Overridable<u64>,
    pub max_file_descriptors: Overridable<u64>,
    pub max_locked_memory_bytes: Overridable<u64>,
}

impl Default for ProcessEnv {
    fn default() -> Self {
        ProcessEnv {
            processes: Vec::new(),
            env_vars: BTreeMap::new(),
            fault_action: Overridable::new(FaultAction::Ignore),
            start_priority: Overridable::new(Priority::Medium),
            watchdog_action: Overridable::new(WatchdogAction::Restart),
            watchdog_timeout: Overridable::new(WatchdogTimeout::Never),
            max_core_dump_file_bytes: Overridable::new(DEFAULT_MAX_CORE_DUMP_FILE_BYTES),
            max_file_bytes: Overridable::new(DEFAULT_MAX_FILE_BYTES),
            max_file_descriptors: Overridable::new(DEFAULT_MAX_FILE_DESCRIPTORS),
            max_locked_memory_bytes: Overridable::new(DEFAULT_MAX_LOCKED_MEMORY_BYTES),
        }
    }
}

impl ProcessEnv {
    /// Watchdog timeout in effect: this environment's, else the app-level
    /// one, else `None` (watchdog disabled).
    pub fn effective_watchdog_timeout(
        &self,
        app_level: &Overridable<WatchdogTimeout>,
    ) -> Option<WatchdogTimeout> {
        self.watchdog_timeout
            .value()
            .or_else(|| app_level.value())
            .copied()
    }

    pub fn effective_watchdog_action(
        &self,
        app_level: &Overridable<WatchdogAction>,
    ) -> Option<WatchdogAction> {
        self.watchdog_action
            .value()
            .or_else(|| app_level.value())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_keywords() {
        assert_eq!(Priority::from_keyword("high"), Some(Priority::High));
        assert_eq!(Priority::from_keyword("rt1"), Some(Priority::RealTime(1)));
        assert_eq!(Priority::from_keyword("rt32"), Some(Priority::RealTime(32)));
        assert_eq!(Priority::from_keyword("rt0"), None);
        assert_eq!(Priority::from_keyword("rt33"), None);
        assert_eq!(Priority::from_keyword("urgent"), None);
        assert_eq!(Priority::RealTime(7).to_string(), "rt7");
    }

    #[test]
    fn watchdog_falls_back_to_app_level() {
        let mut env = ProcessEnv::default();
        let mut app_timeout = Overridable::new(WatchdogTimeout::Never);
        assert_eq!(env.effective_watchdog_timeout(&app_timeout), None);

        app_timeout.set(WatchdogTimeout::Millis(500));
        assert_eq!(
            env.effective_watchdog_timeout(&app_timeout),
            Some(WatchdogTimeout::Millis(500))
        );

        env.watchdog_timeout.set(WatchdogTimeout::Never);
        assert_eq!(
            env.effective_watchdog_timeout(&app_timeout),
            Some(WatchdogTimeout::Never)
        );
    }
}
