//! Process role

use crate::error::ConfigError;
use crate::schema::{Endpoint, WindowId};

/// Which side of the relay this process is on.
///
/// Determined once at startup and fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    /// Owns the set of dependent windows and fans actions out to them
    Coordinator,
    /// A single window's execution context
    Dependent(WindowId),
}

impl ProcessRole {
    /// Detect the role from `ACTION_RELAY_ROLE` / `ACTION_RELAY_WINDOW_ID`.
    ///
    /// # Errors
    ///
    /// Returns error if the role is unknown or a dependent has no window id
    pub fn detect() -> Result<Self, ConfigError> {
        crate::config::RelayConfig::from_env()?.process_role()
    }

    /// The endpoint this process sends from.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            ProcessRole::Coordinator => Endpoint::Coordinator,
            ProcessRole::Dependent(id) => Endpoint::Window(*id),
        }
    }

    pub fn is_coordinator(&self) -> bool {
        matches!(self, ProcessRole::Coordinator)
    }
}
