//! Host platform detection.

use std::collections::BTreeMap;

/// Set on Cray systems to the installed CrayOS release.
pub const CRAY_ENV: &str = "CRAYOS_VERSION";

/// The host a build runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
    /// CrayOS release, when running on a Cray
    pub cray_version: Option<String>,
}

impl Platform {
    /// Detect the current host.
    pub fn detect() -> Self {
        Platform {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            cray_version: std::env::var(CRAY_ENV).ok().filter(|v| !v.trim().is_empty()),
        }
    }

    pub fn is_cray(&self) -> bool {
        self.cray_version.is_some()
    }

    /// Compiler variables every build on this platform starts from.
    ///
    /// Cray programming environments only link correctly through the
    /// `cc`/`CC`/`ftn` wrappers.
    pub fn compiler_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        if self.is_cray() {
            for (key, value) in [("CC", "cc"), ("CXX", "CC"), ("FC", "ftn"), ("F77", "ftn")] {
                env.insert(key.to_string(), value.to_string());
            }
        }
        env
    }
}
