//! Workspace - the index of every package in a tree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::manifest::{ManifestError, MANIFEST_NAME};
use crate::core::package::{Package, INSTALL_DIR};

/// All packages found below a tree root, keyed by name.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    packages: BTreeMap<String, Package>,
}

impl Workspace {
    /// Index every `package.toml` below `root`.
    ///
    /// Hidden directories and `install/` prefixes are never entered, and the
    /// walk does not descend into a package once its manifest is found.
    pub fn discover(root: &Path) -> Result<Self, ManifestError> {
        let mut packages: BTreeMap<String, Package> = BTreeMap::new();

        let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable path: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            if entry.depth() > 0 && is_ignored_dir(entry.file_name().to_string_lossy().as_ref()) {
                walker.skip_current_dir();
                continue;
            }

            let manifest_path = entry.path().join(MANIFEST_NAME);
            if !manifest_path.is_file() {
                continue;
            }

            let package = Package::load(entry.path())?;
            tracing::debug!("found package `{}` at {}", package.name(), entry.path().display());
            if let Some(existing) = packages.get(package.name()) {
                return Err(ManifestError::DuplicatePackage {
                    name: package.name().to_string(),
                    first: existing.root().to_path_buf(),
                    second: package.root().to_path_buf(),
                });
            }
            packages.insert(package.name().to_string(), package);
            walker.skip_current_dir();
        }

        Ok(Workspace {
            root: root.to_path_buf(),
            packages,
        })
    }

    /// Build a workspace from already-loaded packages.
    pub fn from_packages(
        root: PathBuf,
        packages: impl IntoIterator<Item = Package>,
    ) -> Result<Self, ManifestError> {
        let mut map: BTreeMap<String, Package> = BTreeMap::new();
        for package in packages {
            if let Some(existing) = map.get(package.name()) {
                return Err(ManifestError::DuplicatePackage {
                    name: package.name().to_string(),
                    first: existing.root().to_path_buf(),
                    second: package.root().to_path_buf(),
                });
            }
            map.insert(package.name().to_string(), package);
        }
        Ok(Workspace {
            root,
            packages: map,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.packages.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// The package whose directory contains `dir`, innermost first.
    pub fn package_containing(&self, dir: &Path) -> Option<&Package> {
        self.packages
            .values()
            .filter(|p| dir.starts_with(p.root()))
            .max_by_key(|p| p.root().components().count())
    }
}

fn is_ignored_dir(name: &str) -> bool {
    name.starts_with('.') || name == INSTALL_DIR || name == "target"
}

/// Find the nearest `package.toml` at or above `start`.
pub fn find_manifest(start: &Path) -> Result<PathBuf, ManifestError> {
    start
        .ancestors()
        .map(|dir| dir.join(MANIFEST_NAME))
        .find(|path| path.is_file())
        .ok_or_else(|| ManifestError::NotFound {
            dir: start.to_path_buf(),
        })
}
