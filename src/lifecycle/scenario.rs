//! The lifecycle functional-test scenario.

use std::time::Duration;

use crate::lifecycle::errors::LifecycleError;
use crate::lifecycle::locator::{ProxyIdentity, ServiceLocator};
use crate::lifecycle::state::{ServiceState, Transition};
use crate::lifecycle::{LifecycleService, ServiceConfig};

/// Activate/deactivate pairs run between startup and shutdown by default.
pub const DEFAULT_CYCLES: usize = 2;

/// startup, then `cycles` activate/deactivate pairs, then shutdown,
/// checking the reported state after every call.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub cycles: usize,
    pub config: ServiceConfig,
    /// Run `self_test` once the service is in standby
    pub self_test: bool,
    /// Call `wait_obs` with this timeout while online; an observation that
    /// does not finish in time fails the scenario
    pub wait_obs: Option<Duration>,
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            cycles: DEFAULT_CYCLES,
            config: ServiceConfig::new(),
            self_test: false,
            wait_obs: None,
        }
    }
}

/// What a completed scenario observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Each transition with the state reported after it.
    pub transitions: Vec<(Transition, ServiceState)>,
}

impl Scenario {
    pub fn with_cycles(mut self, cycles: usize) -> Self {
        self.cycles = cycles;
        self
    }

    /// Resolve `identity` (`object@adapter`) through `locator` and run the
    /// scenario against the proxy.
    pub fn run_against(
        &self,
        locator: &dyn ServiceLocator,
        identity: &str,
    ) -> Result<ScenarioReport, LifecycleError> {
        let identity: ProxyIdentity = identity.parse()?;
        let proxy = locator.lifecycle_proxy(&identity)?;
        tracing::info!("running lifecycle scenario against {}", identity);
        self.run(&*proxy)
    }

    /// Run the scenario; the first unexpected state aborts it.
    pub fn run(&self, service: &dyn LifecycleService) -> Result<ScenarioReport, LifecycleError> {
        let mut report = ScenarioReport::default();

        expect_state(service, "connect", ServiceState::Uninitialized)?;

        service.startup(&self.config)?;
        report.record(service, Transition::Startup)?;

        if self.self_test && !service.self_test()? {
            return Err(LifecycleError::SelfTestFailed);
        }

        for cycle in 0..self.cycles {
            tracing::debug!("lifecycle cycle {}/{}", cycle + 1, self.cycles);

            service.activate()?;
            report.record(service, Transition::Activate)?;

            if let Some(timeout) = self.wait_obs {
                if !service.wait_obs(timeout)? {
                    return Err(LifecycleError::ObservationTimeout { timeout });
                }
            }

            service.deactivate()?;
            report.record(service, Transition::Deactivate)?;
        }

        service.shutdown()?;
        report.record(service, Transition::Shutdown)?;

        Ok(report)
    }
}

impl ScenarioReport {
    fn record(
        &mut self,
        service: &dyn LifecycleService,
        transition: Transition,
    ) -> Result<(), LifecycleError> {
        let state = expect_state(service, transition.as_str(), transition.to_state())?;
        tracing::info!("{} -> {}", transition, state);
        self.transitions.push((transition, state));
        Ok(())
    }
}

fn expect_state(
    service: &dyn LifecycleService,
    operation: &str,
    expected: ServiceState,
) -> Result<ServiceState, LifecycleError> {
    let actual = service.get_state()?;
    if actual != expected {
        return Err(LifecycleError::UnexpectedState {
            operation: operation.to_string(),
            expected,
            actual,
        });
    }
    Ok(actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::SimulatedService;
    use std::sync::Mutex;

    #[test]
    fn test_default_scenario_against_simulated_service() {
        let service = SimulatedService::new();
        let report = Scenario::default().run(&service).unwrap();

        use ServiceState::*;
        use Transition::*;
        assert_eq!(
            report.transitions,
            vec![
                (Startup, Standby),
                (Activate, Online),
                (Deactivate, Standby),
                (Activate, Online),
                (Deactivate, Standby),
                (Shutdown, Uninitialized),
            ]
        );
        assert_eq!(service.get_state().unwrap(), Uninitialized);
    }

    #[test]
    fn test_wait_obs_timeout_is_forwarded() {
        let service = SimulatedService::new();
        let scenario = Scenario {
            wait_obs: Some(Duration::from_secs(30)),
            ..Scenario::default()
        };
        scenario.run(&service).unwrap();
        assert_eq!(
            service.wait_timeouts(),
            vec![Duration::from_secs(30), Duration::from_secs(30)]
        );
    }

    #[test]
    fn test_unfinished_observation_aborts() {
        let service = SimulatedService::stalled();
        let scenario = Scenario {
            wait_obs: Some(Duration::from_millis(500)),
            ..Scenario::default()
        };

        match scenario.run(&service) {
            Err(LifecycleError::ObservationTimeout { timeout }) => {
                assert_eq!(timeout, Duration::from_millis(500))
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(service.wait_timeouts().len(), 1);
        assert_eq!(service.get_state().unwrap(), ServiceState::Online);
    }

    #[test]
    fn test_failed_self_test_aborts() {
        let service = SimulatedService::faulty();
        let scenario = Scenario {
            self_test: true,
            ..Scenario::default()
        };
        assert!(matches!(
            scenario.run(&service),
            Err(LifecycleError::SelfTestFailed)
        ));
        assert_eq!(service.get_state().unwrap(), ServiceState::Standby);
    }

    /// Accepts every call but never leaves standby.
    struct StuckService {
        calls: Mutex<Vec<&'static str>>,
    }

    impl LifecycleService for StuckService {
        fn startup(&self, _config: &ServiceConfig) -> Result<(), LifecycleError> {
            self.calls.lock().unwrap().push("startup");
            Ok(())
        }
        fn activate(&self) -> Result<(), LifecycleError> {
            self.calls.lock().unwrap().push("activate");
            Ok(())
        }
        fn deactivate(&self) -> Result<(), LifecycleError> {
            self.calls.lock().unwrap().push("deactivate");
            Ok(())
        }
        fn shutdown(&self) -> Result<(), LifecycleError> {
            self.calls.lock().unwrap().push("shutdown");
            Ok(())
        }
        fn get_state(&self) -> Result<ServiceState, LifecycleError> {
            let calls = self.calls.lock().unwrap();
            Ok(if calls.is_empty() {
                ServiceState::Uninitialized
            } else {
                ServiceState::Standby
            })
        }
        fn self_test(&self) -> Result<bool, LifecycleError> {
            Ok(true)
        }
        fn wait_obs(&self, _timeout: Duration) -> Result<bool, LifecycleError> {
            Ok(true)
        }
    }

    #[test]
    fn test_first_unexpected_state_aborts_without_retry() {
        let service = StuckService {
            calls: Mutex::new(Vec::new()),
        };

        match Scenario::default().run(&service).unwrap_err() {
            LifecycleError::UnexpectedState {
                operation,
                expected,
                actual,
            } => {
                assert_eq!(operation, "activate");
                assert_eq!(expected, ServiceState::Online);
                assert_eq!(actual, ServiceState::Standby);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*service.calls.lock().unwrap(), vec!["startup", "activate"]);
    }
}
