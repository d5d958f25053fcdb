use serde::{Deserialize, Serialize};

/// Run-loop knobs an end user may override without recompiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Subscribe to Ctrl+C while a handler runs (default: true).
    pub handle_interrupts: bool,
    /// Evaluate argument constraints (default: true).
    pub check_constraints: bool,
    /// Command to run when a command-based app gets no arguments.
    pub default_command: Option<String>,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            handle_interrupts: true,
            check_constraints: true,
            default_command: None,
            log_filter: None,
        }
    }
}
