//! `package.toml` manifest parsing and schema.
//!
//! Each package directory carries one manifest declaring where its sources
//! come from, which packages it depends on and how its build system is
//! driven.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::package::{archive_stem, INSTALL_DIR};
use crate::util::hash::sha256_bytes;

/// File name of a package manifest.
pub const MANIFEST_NAME: &str = "package.toml";

/// Errors raised while loading manifests or indexing a tree.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid manifest `{}`: {message}", path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("no package.toml found in `{}` or any parent directory", dir.display())]
    NotFound { dir: PathBuf },

    #[error("package `{name}` is declared twice: `{}` and `{}`", first.display(), second.display())]
    DuplicatePackage {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Build system selected for a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystemKind {
    /// `./configure && make && make install`
    Autotools,
    /// CMake configure/build/install
    #[serde(rename = "cmake")]
    CMake,
    /// SCons
    #[serde(rename = "scons")]
    SCons,
    /// Python `setup.py`
    Setuptools,
    /// Java Ant
    Ant,
    /// A tool already installed on the system
    Virtual,
    /// Plain files, no compilation
    Data,
}

impl BuildSystemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildSystemKind::Autotools => "autotools",
            BuildSystemKind::CMake => "cmake",
            BuildSystemKind::SCons => "scons",
            BuildSystemKind::Setuptools => "setuptools",
            BuildSystemKind::Ant => "ant",
            BuildSystemKind::Virtual => "virtual",
            BuildSystemKind::Data => "data",
        }
    }
}

impl fmt::Display for BuildSystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildSystemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "autotools" => Ok(BuildSystemKind::Autotools),
            "cmake" => Ok(BuildSystemKind::CMake),
            "scons" => Ok(BuildSystemKind::SCons),
            "setuptools" => Ok(BuildSystemKind::Setuptools),
            "ant" => Ok(BuildSystemKind::Ant),
            "virtual" => Ok(BuildSystemKind::Virtual),
            "data" => Ok(BuildSystemKind::Data),
            other => Err(format!(
                "unknown build system `{}`; expected one of autotools, cmake, scons, setuptools, ant, virtual, data",
                other
            )),
        }
    }
}

/// What to do when the tool a package's build system needs is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingToolPolicy {
    /// Abort the build with an error
    #[default]
    Fail,
    /// Warn and report the package as skipped
    Skip,
}

/// The `[package]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageMetadata {
    /// Package name, unique within the tree
    pub name: String,

    /// Upstream version (informational)
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Archive holding the sources, looked up next to the manifest and
    /// fetched from the remote archive when absent
    #[serde(default)]
    pub archive: Option<String>,

    /// Expected SHA256 of the archive
    #[serde(default)]
    pub sha256: Option<String>,

    /// Leading directory stripped when extracting the archive
    #[serde(default)]
    pub strip_prefix: Option<String>,

    /// Directory the archive is extracted into (defaults to the archive stem)
    #[serde(default)]
    pub work_dir: Option<String>,

    /// In-place source directory relative to the manifest (defaults to `.`)
    #[serde(default)]
    pub source: Option<String>,

    /// Packages that must be installed before this one
    #[serde(default)]
    pub dependencies: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// The `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSettings {
    /// Build system driving this package
    pub system: BuildSystemKind,

    #[serde(default)]
    pub configure_args: Vec<String>,

    #[serde(default)]
    pub build_args: Vec<String>,

    #[serde(default)]
    pub install_args: Vec<String>,

    /// Replaces the configure command; an empty list disables the step
    #[serde(default)]
    pub configure: Option<Vec<String>>,

    /// Replaces the build command
    #[serde(default)]
    pub build: Option<Vec<String>>,

    /// Replaces the install command
    #[serde(default)]
    pub install: Option<Vec<String>>,

    /// Extra environment for every command of this package
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Silence compiler warnings (`-w`)
    #[serde(default)]
    pub no_warnings: bool,

    /// Let the build tool run parallel jobs
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Clean before every build
    #[serde(default = "default_true")]
    pub clean: bool,

    #[serde(default)]
    pub on_missing_tool: Option<MissingToolPolicy>,

    /// Executable located by the virtual build system
    #[serde(default)]
    pub executable: Option<String>,

    /// Globs copied by the data build system, relative to the work dir
    #[serde(default)]
    pub files: Vec<String>,

    /// Ant target (defaults to the project default)
    #[serde(default)]
    pub target: Option<String>,
}

impl BuildSettings {
    /// Default settings for a build system.
    pub fn new(system: BuildSystemKind) -> Self {
        BuildSettings {
            system,
            configure_args: Vec::new(),
            build_args: Vec::new(),
            install_args: Vec::new(),
            configure: None,
            build: None,
            install: None,
            env: BTreeMap::new(),
            no_warnings: false,
            parallel: true,
            clean: true,
            on_missing_tool: None,
            executable: None,
            files: Vec::new(),
            target: None,
        }
    }
}

/// The `[hooks]` section: commands run around the compile steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookSettings {
    /// Run after unpacking, before configure
    #[serde(default)]
    pub pre: Vec<Vec<String>>,

    /// Run after install
    #[serde(default)]
    pub post: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    package: PackageMetadata,
    build: BuildSettings,
    #[serde(default)]
    hooks: HookSettings,
}

/// A parsed and validated `package.toml`.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub package: PackageMetadata,
    pub build: BuildSettings,
    pub hooks: HookSettings,

    /// Path of the manifest file
    pub manifest_path: PathBuf,

    /// SHA256 of the manifest bytes
    pub content_hash: String,
}

impl Manifest {
    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    /// Parse manifest text; `path` is used for diagnostics.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(contents).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;

        let manifest = Manifest {
            package: raw.package,
            build: raw.build,
            hooks: raw.hooks,
            manifest_path: path.to_path_buf(),
            content_hash: sha256_bytes(contents.as_bytes()),
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Directory containing the manifest.
    pub fn manifest_dir(&self) -> &Path {
        self.manifest_path.parent().unwrap_or(Path::new("."))
    }

    pub fn name(&self) -> &str {
        &self.package.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.package.dependencies
    }

    fn invalid(&self, message: impl Into<String>) -> ManifestError {
        ManifestError::Invalid {
            path: self.manifest_path.clone(),
            message: message.into(),
        }
    }

    /// `dir` must stay inside the package root and outside the install prefix.
    ///
    /// Only `source` may name the package root itself.
    fn check_package_subdir(&self, key: &str, dir: &str, allow_root: bool) -> Result<(), ManifestError> {
        let mut parts = Vec::new();
        for component in Path::new(dir).components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => parts.push(part),
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(self.invalid(format!(
                        "`{}` must be a relative path inside the package, got `{}`",
                        key, dir
                    )));
                }
            }
        }

        match parts.first() {
            None if allow_root && !dir.is_empty() => Ok(()),
            None => Err(self.invalid(format!(
                "`{}` must name a directory below the package root, got `{}`",
                key, dir
            ))),
            Some(first) if *first == INSTALL_DIR => Err(self.invalid(format!(
                "`{}` must not be inside the `{}` prefix",
                key, INSTALL_DIR
            ))),
            Some(_) => Ok(()),
        }
    }

    fn validate(&self) -> Result<(), ManifestError> {
        let name = &self.package.name;
        if name.is_empty() {
            return Err(self.invalid("package name must not be empty"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'))
        {
            return Err(self.invalid(format!(
                "package name `{}` may only contain ASCII letters, digits, `-`, `_`, `.` and `+`",
                name
            )));
        }

        if let Some(version) = &self.package.version {
            if semver::Version::parse(version).is_err() && !is_loose_version(version) {
                return Err(self.invalid(format!("invalid version `{}`", version)));
            }
        }

        if self.package.archive.is_some() && self.package.source.is_some() {
            return Err(self.invalid("`archive` and `source` are mutually exclusive"));
        }
        if self.package.archive.is_none()
            && (self.package.sha256.is_some()
                || self.package.strip_prefix.is_some()
                || self.package.work_dir.is_some())
        {
            return Err(self.invalid(
                "`sha256`, `strip_prefix` and `work_dir` require an `archive`",
            ));
        }

        if let Some(archive) = &self.package.archive {
            match &self.package.work_dir {
                Some(dir) => self.check_package_subdir("work_dir", dir, false)?,
                None => self
                    .check_package_subdir("work_dir", archive_stem(archive), false)
                    .map_err(|_| {
                        self.invalid(format!(
                            "archive `{}` does not name a usable work dir; set `work_dir`",
                            archive
                        ))
                    })?,
            }
        }
        if let Some(dir) = &self.package.source {
            self.check_package_subdir("source", dir, true)?;
        }

        let mut seen = std::collections::HashSet::new();
        for dep in &self.package.dependencies {
            if dep == name {
                return Err(self.invalid(format!("package `{}` depends on itself", name)));
            }
            if !seen.insert(dep.as_str()) {
                return Err(self.invalid(format!("dependency `{}` is listed twice", dep)));
            }
        }

        for (label, cmd) in [("build", &self.build.build), ("install", &self.build.install)] {
            if matches!(cmd, Some(argv) if argv.is_empty()) {
                return Err(self.invalid(format!("`build.{}` override must not be empty", label)));
            }
        }
        if self
            .hooks
            .pre
            .iter()
            .chain(self.hooks.post.iter())
            .any(|argv| argv.is_empty())
        {
            return Err(self.invalid("hook commands must not be empty"));
        }

        match self.build.system {
            BuildSystemKind::Virtual if self.build.executable.is_none() => {
                return Err(self.invalid("virtual packages must name an `executable`"));
            }
            BuildSystemKind::Data if self.build.files.is_empty() => {
                return Err(self.invalid("data packages must list `files` to install"));
            }
            _ => {}
        }

        Ok(())
    }
}

// Upstream tarballs often carry versions like `1.2` or `2.0.0b3`.
fn is_loose_version(version: &str) -> bool {
    version.chars().next().is_some_and(|c| c.is_ascii_digit())
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+'))
}
