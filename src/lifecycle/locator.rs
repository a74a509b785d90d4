//! Resolving service proxies from string identities.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::lifecycle::errors::LifecycleError;
use crate::lifecycle::LifecycleService;

/// Interface name of [`LifecycleService`] proxies.
pub const LIFECYCLE_INTERFACE: &str = "LifecycleService";

/// `object@adapter`, e.g. `CentralProcessorService@CentralProcessorAdapter`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyIdentity {
    pub object: String,
    pub adapter: String,
}

impl ProxyIdentity {
    pub fn new(object: impl Into<String>, adapter: impl Into<String>) -> Self {
        ProxyIdentity {
            object: object.into(),
            adapter: adapter.into(),
        }
    }
}

impl FromStr for ProxyIdentity {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LifecycleError::InvalidIdentity {
            identity: s.to_string(),
        };
        let (object, adapter) = s.split_once('@').ok_or_else(invalid)?;
        let (object, adapter) = (object.trim(), adapter.trim());
        if object.is_empty() || adapter.is_empty() || adapter.contains('@') {
            return Err(invalid());
        }
        Ok(ProxyIdentity::new(object, adapter))
    }
}

impl fmt::Display for ProxyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.object, self.adapter)
    }
}

/// Something that hands out proxies by identity.
pub trait ServiceLocator {
    /// A lifecycle proxy for `identity`.
    ///
    /// Unknown identities yield [`LifecycleError::ProxyNotFound`]; objects that
    /// do not implement the lifecycle interface yield
    /// [`LifecycleError::InvalidCast`].
    fn lifecycle_proxy(
        &self,
        identity: &ProxyIdentity,
    ) -> Result<Arc<dyn LifecycleService + Send + Sync>, LifecycleError>;
}

/// An object registered with a [`LocalLocator`].
#[derive(Clone)]
pub enum Servant {
    Lifecycle(Arc<dyn LifecycleService + Send + Sync>),
    /// An object of some other interface.
    Other { interface: String },
}

impl Servant {
    fn interface(&self) -> &str {
        match self {
            Servant::Lifecycle(_) => LIFECYCLE_INTERFACE,
            Servant::Other { interface } => interface,
        }
    }
}

impl fmt::Debug for Servant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Servant({})", self.interface())
    }
}

/// In-process registry of servants.
#[derive(Debug, Default, Clone)]
pub struct LocalLocator {
    servants: BTreeMap<ProxyIdentity, Servant>,
}

impl LocalLocator {
    pub fn new() -> Self {
        LocalLocator::default()
    }

    pub fn register(&mut self, identity: ProxyIdentity, servant: Servant) -> &mut Self {
        self.servants.insert(identity, servant);
        self
    }

    /// Convenience for parsing the identity while registering.
    pub fn register_str(&mut self, identity: &str, servant: Servant) -> Result<&mut Self, LifecycleError> {
        let identity = identity.parse()?;
        Ok(self.register(identity, servant))
    }
}

impl ServiceLocator for LocalLocator {
    fn lifecycle_proxy(
        &self,
        identity: &ProxyIdentity,
    ) -> Result<Arc<dyn LifecycleService + Send + Sync>, LifecycleError> {
        match self.servants.get(identity) {
            Some(Servant::Lifecycle(service)) => Ok(Arc::clone(service)),
            Some(other) => Err(LifecycleError::InvalidCast {
                identity: identity.to_string(),
                expected: LIFECYCLE_INTERFACE.to_string(),
                found: other.interface().to_string(),
            }),
            None => Err(LifecycleError::ProxyNotFound {
                identity: identity.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{ServiceState, SimulatedService};

    #[test]
    fn test_parse_identity() {
        let id: ProxyIdentity = "CentralProcessorService@CentralProcessorAdapter"
            .parse()
            .unwrap();
        assert_eq!(id.object, "CentralProcessorService");
        assert_eq!(id.adapter, "CentralProcessorAdapter");
        assert_eq!(id.to_string(), "CentralProcessorService@CentralProcessorAdapter");

        for bad in ["NoAdapter", "@Adapter", "Object@", "a@b@c"] {
            assert!(matches!(
                bad.parse::<ProxyIdentity>(),
                Err(LifecycleError::InvalidIdentity { .. })
            ));
        }
    }

    #[test]
    fn test_locator_resolution() {
        let mut locator = LocalLocator::new();
        locator
            .register_str(
                "CentralProcessorService@CentralProcessorAdapter",
                Servant::Lifecycle(Arc::new(SimulatedService::new())),
            )
            .unwrap()
            .register_str(
                "DataService@DataServiceAdapter",
                Servant::Other {
                    interface: "IDataService".to_string(),
                },
            )
            .unwrap();

        let proxy = locator
            .lifecycle_proxy(&"CentralProcessorService@CentralProcessorAdapter".parse().unwrap())
            .unwrap();
        assert_eq!(proxy.get_state().unwrap(), ServiceState::Uninitialized);

        assert!(matches!(
            locator.lifecycle_proxy(&ProxyIdentity::new("Missing", "Adapter")),
            Err(LifecycleError::ProxyNotFound { .. })
        ));
        match locator.lifecycle_proxy(&ProxyIdentity::new("DataService", "DataServiceAdapter")) {
            Err(LifecycleError::InvalidCast { found, .. }) => assert_eq!(found, "IDataService"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
