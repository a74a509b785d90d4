//! In-process service enforcing the lifecycle state machine.

use std::sync::Mutex;
use std::time::Duration;

use crate::lifecycle::errors::LifecycleError;
use crate::lifecycle::state::{ServiceState, Transition};
use crate::lifecycle::{LifecycleService, ServiceConfig};

#[derive(Debug)]
struct Inner {
    state: ServiceState,
    config: ServiceConfig,
    wait_timeouts: Vec<Duration>,
}

/// A service that honours the transition table and remembers its inputs.
#[derive(Debug)]
pub struct SimulatedService {
    inner: Mutex<Inner>,
    healthy: bool,
    observations_finish: bool,
}

impl Default for SimulatedService {
    fn default() -> Self {
        SimulatedService::new()
    }
}

impl SimulatedService {
    pub fn new() -> Self {
        SimulatedService {
            inner: Mutex::new(Inner {
                state: ServiceState::Uninitialized,
                config: ServiceConfig::new(),
                wait_timeouts: Vec::new(),
            }),
            healthy: true,
            observations_finish: true,
        }
    }

    /// A service whose self test reports a fault.
    pub fn faulty() -> Self {
        SimulatedService {
            healthy: false,
            ..SimulatedService::new()
        }
    }

    /// A service whose observations never finish within the wait timeout.
    pub fn stalled() -> Self {
        SimulatedService {
            observations_finish: false,
            ..SimulatedService::new()
        }
    }

    /// Configuration received by the last `startup`.
    pub fn config(&self) -> ServiceConfig {
        self.lock().map(|inner| inner.config.clone()).unwrap_or_default()
    }

    /// Timeouts passed to `wait_obs`, in call order.
    pub fn wait_timeouts(&self) -> Vec<Duration> {
        self.lock()
            .map(|inner| inner.wait_timeouts.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, LifecycleError> {
        self.inner.lock().map_err(|_| LifecycleError::Remote {
            operation: "lock".to_string(),
            message: "service state poisoned".to_string(),
        })
    }

    fn transition(&self, transition: Transition) -> Result<(), LifecycleError> {
        let mut inner = self.lock()?;
        let next = transition
            .apply(inner.state)
            .ok_or(LifecycleError::InvalidTransition {
                transition,
                state: inner.state,
            })?;
        tracing::debug!("simulated service: {} {} -> {}", transition, inner.state, next);
        inner.state = next;
        Ok(())
    }
}

impl LifecycleService for SimulatedService {
    fn startup(&self, config: &ServiceConfig) -> Result<(), LifecycleError> {
        self.transition(Transition::Startup)?;
        self.lock()?.config = config.clone();
        Ok(())
    }

    fn activate(&self) -> Result<(), LifecycleError> {
        self.transition(Transition::Activate)
    }

    fn deactivate(&self) -> Result<(), LifecycleError> {
        self.transition(Transition::Deactivate)
    }

    fn shutdown(&self) -> Result<(), LifecycleError> {
        self.transition(Transition::Shutdown)
    }

    fn get_state(&self) -> Result<ServiceState, LifecycleError> {
        Ok(self.lock()?.state)
    }

    fn self_test(&self) -> Result<bool, LifecycleError> {
        Ok(self.healthy)
    }

    fn wait_obs(&self, timeout: Duration) -> Result<bool, LifecycleError> {
        self.lock()?.wait_timeouts.push(timeout);
        Ok(self.observations_finish)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_order_transitions() {
        let service = SimulatedService::new();

        assert!(matches!(
            service.activate(),
            Err(LifecycleError::InvalidTransition {
                transition: Transition::Activate,
                state: ServiceState::Uninitialized,
            })
        ));

        service.startup(&ServiceConfig::new()).unwrap();
        service.activate().unwrap();
        assert!(service.shutdown().is_err());
        assert_eq!(service.get_state().unwrap(), ServiceState::Online);
    }

    #[test]
    fn test_startup_keeps_config() {
        let service = SimulatedService::new();
        let config = ServiceConfig::from([("tasks.name".to_string(), "cp".to_string())]);
        service.startup(&config).unwrap();
        assert_eq!(service.config(), config);
    }
}
