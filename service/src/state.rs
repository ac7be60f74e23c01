//! Service lifecycle states.

/// Service operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Built but the startup refresh has not run yet.
    Starting,
    /// Startup refresh done, scheduled refreshes active.
    Running,
    /// Stop requested, scheduled refreshes winding down.
    ShuttingDown,
    /// Scheduled refreshes stopped.
    Stopped,
}

impl ServiceState {
    /// Check if the service is running.
    pub fn is_operational(&self) -> bool {
        matches!(self, ServiceState::Running)
    }

    /// Check if the service is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceState::Stopped)
    }
}
