//! Service lifecycle client.
//!
//! Functional tests drive a remote service through its operational states
//! and verify the state it reports after every transition:
//!
//! ```text
//!  UNINITIALIZED --startup--> STANDBY --activate--> ONLINE
//!  UNINITIALIZED <-shutdown-- STANDBY <-deactivate- ONLINE
//! ```
//!
//! The service owns the state machine; this side only calls it. Proxies are
//! obtained from a [`ServiceLocator`] by `object@adapter` identity.
//! [`SimulatedService`] and [`LocalLocator`] provide an in-process service
//! for exercising scenarios without the middleware.

mod errors;
mod locator;
mod scenario;
mod simulated;
mod state;

use std::collections::BTreeMap;
use std::time::Duration;

pub use errors::LifecycleError;
pub use locator::{LocalLocator, ProxyIdentity, Servant, ServiceLocator};
pub use scenario::{Scenario, ScenarioReport, DEFAULT_CYCLES};
pub use simulated::SimulatedService;
pub use state::{ServiceState, Transition};

/// Configuration handed to `startup`.
pub type ServiceConfig = BTreeMap<String, String>;

/// Remote lifecycle interface. Every call blocks until the service replies.
pub trait LifecycleService {
    fn startup(&self, config: &ServiceConfig) -> Result<(), LifecycleError>;

    fn activate(&self) -> Result<(), LifecycleError>;

    fn deactivate(&self) -> Result<(), LifecycleError>;

    fn shutdown(&self) -> Result<(), LifecycleError>;

    fn get_state(&self) -> Result<ServiceState, LifecycleError>;

    /// Ask the service to verify itself; `false` means it reported a fault.
    fn self_test(&self) -> Result<bool, LifecycleError>;

    /// Wait up to `timeout` for the current observation to finish.
    /// `true` when it finished in time.
    fn wait_obs(&self, timeout: Duration) -> Result<bool, LifecycleError>;
}
