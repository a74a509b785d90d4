//! Dependency resolution.
//!
//! Packages never compute prerequisite locations themselves: they ask a
//! [`DependencyResolver`] for the install path of each declared dependency,
//! and the resolver fails fast when a dependency is unknown or not built.

pub mod errors;
mod order;

use std::path::PathBuf;

use crate::core::Workspace;

pub use errors::ResolveError;
pub use order::{build_order, dependency_tree, TreeNode};

/// Maps package names to filesystem locations.
pub trait DependencyResolver {
    /// Install prefix of a registered package, whether or not it is built yet.
    fn get_install_path(&self, name: &str) -> Result<PathBuf, ResolveError>;

    /// Install prefix of a dependency that must already be installed.
    fn get_dep_path(&self, name: &str) -> Result<PathBuf, ResolveError>;

    /// Signature recorded by the dependency's last install, if any.
    fn signature(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Resolves names against the packages indexed in a [`Workspace`].
pub struct TreeResolver<'a> {
    ws: &'a Workspace,
}

impl<'a> TreeResolver<'a> {
    pub fn new(ws: &'a Workspace) -> Self {
        TreeResolver { ws }
    }

    fn not_found(&self, name: &str) -> ResolveError {
        ResolveError::PackageNotFound {
            package: name.to_string(),
            suggestions: errors::suggest(name, self.ws.names()),
        }
    }
}

impl DependencyResolver for TreeResolver<'_> {
    fn get_install_path(&self, name: &str) -> Result<PathBuf, ResolveError> {
        self.ws
            .get(name)
            .map(|p| p.install_dir())
            .ok_or_else(|| self.not_found(name))
    }

    fn get_dep_path(&self, name: &str) -> Result<PathBuf, ResolveError> {
        let package = self.ws.get(name).ok_or_else(|| self.not_found(name))?;
        if !package.is_installed() {
            return Err(ResolveError::NotInstalled {
                package: name.to_string(),
                path: package.install_dir(),
            });
        }
        Ok(package.install_dir())
    }

    fn signature(&self, name: &str) -> Option<String> {
        let package = self.ws.get(name)?;
        std::fs::read_to_string(package.signature_path())
            .ok()
            .map(|s| s.trim().to_string())
    }
}
