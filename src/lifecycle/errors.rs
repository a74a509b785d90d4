//! Lifecycle client errors.

use thiserror::Error;

use crate::lifecycle::state::{ServiceState, Transition};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid proxy identity `{identity}`: expected `object@adapter`")]
    InvalidIdentity { identity: String },

    #[error("no object `{identity}` is registered with the locator")]
    ProxyNotFound { identity: String },

    #[error("proxy `{identity}` implements `{found}`, not `{expected}`")]
    InvalidCast {
        identity: String,
        expected: String,
        found: String,
    },

    #[error("{transition} is not allowed in state {state}")]
    InvalidTransition {
        transition: Transition,
        state: ServiceState,
    },

    #[error("after {operation} the service reports {actual}, expected {expected}")]
    UnexpectedState {
        operation: String,
        expected: ServiceState,
        actual: ServiceState,
    },

    #[error("observation did not finish within {timeout:?}")]
    ObservationTimeout { timeout: std::time::Duration },

    #[error("self test of the service failed")]
    SelfTestFailed,

    #[error("remote call `{operation}` failed: {message}")]
    Remote { operation: String, message: String },
}
