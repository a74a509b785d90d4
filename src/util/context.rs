//! Global context for rbuild operations.
//!
//! Provides centralized access to the tree root, configuration paths and
//! environment-derived settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_dir, load_config, Config};

/// Environment variable naming the root of the source/install tree.
pub const ROOT_ENV: &str = "ASKAP_ROOT";

/// Name of the per-tree state directory.
pub const STATE_DIR: &str = ".rbuild";

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Root of the package tree
    root: PathBuf,

    /// Home directory for user-wide data (~/.rbuild/)
    home: Option<PathBuf>,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a context, locating the tree root.
    ///
    /// Root precedence: explicit argument, then `ASKAP_ROOT`, then the
    /// nearest ancestor of the cwd that holds a `.rbuild` directory, then
    /// the cwd itself.
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let root = match root {
            Some(root) => root,
            None => match std::env::var_os(ROOT_ENV) {
                Some(root) if !root.is_empty() => PathBuf::from(root),
                _ => find_state_root(&cwd).unwrap_or_else(|| cwd.clone()),
            },
        };
        let root = if root.is_absolute() {
            root
        } else {
            cwd.join(root)
        };

        Ok(GlobalContext {
            cwd,
            root,
            home: global_config_dir(),
            verbose: false,
        })
    }

    /// Create a context with explicit cwd and root, ignoring the environment.
    pub fn with_paths(cwd: PathBuf, root: PathBuf) -> Self {
        GlobalContext {
            cwd,
            root,
            home: None,
            verbose: false,
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the per-tree state directory (`<root>/.rbuild`).
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    /// Directory that bootstrap tooling is unpacked into.
    pub fn tools_dir(&self) -> PathBuf {
        self.state_dir().join("tools")
    }

    /// Directory that downloaded archives are cached in.
    pub fn archive_cache_dir(&self) -> PathBuf {
        self.state_dir().join("archives")
    }

    /// Get the global configuration file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join("config.toml"))
    }

    /// Get the project configuration file path.
    pub fn project_config_path(&self) -> PathBuf {
        self.state_dir().join("config.toml")
    }

    /// Load the merged configuration for this tree.
    pub fn load_config(&self) -> Config {
        load_config(
            self.global_config_path().as_deref(),
            &self.project_config_path(),
        )
    }
}

fn find_state_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(STATE_DIR).is_dir())
        .map(Path::to_path_buf)
}
