//! Configuration file support for rbuild.
//!
//! rbuild reads two configuration files:
//! - Global: `~/.rbuild/config.toml` - User-wide defaults
//! - Project: `<root>/.rbuild/config.toml` - Tree-specific overrides
//!
//! Project config takes precedence over global config. Environment variables
//! and command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::manifest::MissingToolPolicy;

/// Environment variable naming the base URL for archive downloads.
pub const REMOTE_ARCHIVE_ENV: &str = "RBUILD_REMOTE_ARCHIVE";

/// rbuild configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Network settings
    pub net: NetConfig,

    /// Failure policies
    pub policy: PolicyConfig,

    /// Top-level bootstrap settings
    pub bootstrap: BootstrapConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Number of parallel jobs handed to build tools (None = available cores)
    pub jobs: Option<usize>,

    /// Disable parallel builds everywhere, regardless of package settings
    pub serial: Option<bool>,

    /// Skip the implicit clean before every build
    pub no_clean: Option<bool>,
}

impl BuildConfig {
    pub fn serial(&self) -> bool {
        self.serial.unwrap_or(false)
    }

    pub fn no_clean(&self) -> bool {
        self.no_clean.unwrap_or(false)
    }
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Base URL that archives are fetched from when missing locally
    pub remote_archive: Option<String>,

    /// Offline mode (never download)
    pub offline: Option<bool>,
}

impl NetConfig {
    pub fn offline(&self) -> bool {
        self.offline.unwrap_or(false)
    }
}

/// Failure policies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// What to do when a package's build tool is absent.
    /// Packages that set their own policy keep it.
    pub on_missing_tool: Option<MissingToolPolicy>,
}

/// Settings for `rbuild bootstrap`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Update the working tree from version control first (default: yes)
    pub update: Option<bool>,

    /// Tooling archives fetched into `.rbuild/tools`
    pub tools: Vec<String>,

    /// Packages installed by the bootstrap (empty = every package)
    pub targets: Vec<String>,
}

impl BootstrapConfig {
    pub fn update(&self) -> bool {
        self.update.unwrap_or(true)
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is unusable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
            Self::default()
        })
    }

    /// Merge another config into this one (other takes precedence).
    ///
    /// Only keys that `other` sets override, so a layer can turn a flag
    /// either on or off.
    pub fn merge(&mut self, other: Config) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.build.jobs, other.build.jobs);
        take(&mut self.build.serial, other.build.serial);
        take(&mut self.build.no_clean, other.build.no_clean);

        take(&mut self.net.remote_archive, other.net.remote_archive);
        take(&mut self.net.offline, other.net.offline);

        take(&mut self.policy.on_missing_tool, other.policy.on_missing_tool);

        take(&mut self.bootstrap.update, other.bootstrap.update);
        if !other.bootstrap.tools.is_empty() {
            self.bootstrap.tools = other.bootstrap.tools;
        }
        if !other.bootstrap.targets.is_empty() {
            self.bootstrap.targets = other.bootstrap.targets;
        }
    }

    /// Apply environment overrides (`RBUILD_REMOTE_ARCHIVE`).
    pub fn apply_env(&mut self) {
        if let Ok(remote) = std::env::var(REMOTE_ARCHIVE_ENV) {
            if !remote.trim().is_empty() {
                self.net.remote_archive = Some(remote);
            }
        }
    }

    /// Effective job count for parallel builds.
    pub fn jobs(&self) -> usize {
        self.build.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Get the global rbuild config directory (~/.rbuild).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".rbuild"))
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Environment (`RBUILD_REMOTE_ARCHIVE`)
/// 2. Project config (<root>/.rbuild/config.toml)
/// 3. Global config (~/.rbuild/config.toml)
/// 4. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }
    config.merge(Config::load_or_default(project_path));
    config.apply_env();

    config
}
