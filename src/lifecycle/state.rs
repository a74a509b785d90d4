//! Lifecycle states and transitions.

use std::fmt;

/// Operational state reported by a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    Uninitialized,
    Standby,
    Online,
}

impl ServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Uninitialized => "UNINITIALIZED",
            ServiceState::Standby => "STANDBY",
            ServiceState::Online => "ONLINE",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Startup,
    Activate,
    Deactivate,
    Shutdown,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Startup => "startup",
            Transition::Activate => "activate",
            Transition::Deactivate => "deactivate",
            Transition::Shutdown => "shutdown",
        }
    }

    /// State the transition must start from.
    pub fn from_state(&self) -> ServiceState {
        match self {
            Transition::Startup => ServiceState::Uninitialized,
            Transition::Activate => ServiceState::Standby,
            Transition::Deactivate => ServiceState::Online,
            Transition::Shutdown => ServiceState::Standby,
        }
    }

    /// State the service reports once the transition completed.
    pub fn to_state(&self) -> ServiceState {
        match self {
            Transition::Startup => ServiceState::Standby,
            Transition::Activate => ServiceState::Online,
            Transition::Deactivate => ServiceState::Standby,
            Transition::Shutdown => ServiceState::Uninitialized,
        }
    }

    /// Resulting state when applied in `state`, `None` if not allowed there.
    pub fn apply(&self, state: ServiceState) -> Option<ServiceState> {
        (state == self.from_state()).then(|| self.to_state())
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
