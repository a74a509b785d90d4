//! Package - a manifest bound to its directory in the tree.

use std::path::{Path, PathBuf};

use crate::core::manifest::{BuildSettings, BuildSystemKind, Manifest, ManifestError};

/// Name of the install prefix inside every package directory.
pub const INSTALL_DIR: &str = "install";

/// Name of the signature file recording the last successful install.
pub const SIGNATURE_FILE: &str = ".packagesig";

/// Where a package's sources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLayout {
    /// Sources are unpacked from an archive into `work_dir`.
    Archive {
        archive: String,
        sha256: Option<String>,
        strip_prefix: Option<String>,
        work_dir: PathBuf,
    },
    /// Sources are checked into the tree at this directory.
    InPlace(PathBuf),
}

/// A package in the tree.
#[derive(Debug, Clone)]
pub struct Package {
    manifest: Manifest,
    root: PathBuf,
    layout: SourceLayout,
}

impl Package {
    /// Create a package from a manifest; the package root is the manifest's directory.
    pub fn new(manifest: Manifest) -> Self {
        let root = manifest.manifest_dir().to_path_buf();
        let meta = &manifest.package;

        let layout = match &meta.archive {
            Some(archive) => {
                let stem = meta
                    .work_dir
                    .clone()
                    .unwrap_or_else(|| archive_stem(archive).to_string());
                SourceLayout::Archive {
                    archive: archive.clone(),
                    sha256: meta.sha256.clone(),
                    strip_prefix: meta.strip_prefix.clone(),
                    work_dir: root.join(stem),
                }
            }
            None => SourceLayout::InPlace(
                meta.source
                    .as_deref()
                    .map(|s| root.join(s))
                    .unwrap_or_else(|| root.clone()),
            ),
        };

        Package {
            manifest,
            root,
            layout,
        }
    }

    /// Load the package whose manifest lives in `dir`.
    pub fn load(dir: &Path) -> Result<Self, ManifestError> {
        Manifest::load(&dir.join(crate::core::manifest::MANIFEST_NAME)).map(Package::new)
    }

    pub fn name(&self) -> &str {
        self.manifest.name()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn build_settings(&self) -> &BuildSettings {
        &self.manifest.build
    }

    pub fn system(&self) -> BuildSystemKind {
        self.manifest.build.system
    }

    pub fn dependencies(&self) -> &[String] {
        self.manifest.dependencies()
    }

    /// Package directory (where the manifest lives).
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &SourceLayout {
        &self.layout
    }

    /// Directory the build tool runs in.
    pub fn work_dir(&self) -> &Path {
        match &self.layout {
            SourceLayout::Archive { work_dir, .. } => work_dir,
            SourceLayout::InPlace(dir) => dir,
        }
    }

    /// Whether sources are unpacked from an archive.
    pub fn is_archived(&self) -> bool {
        matches!(self.layout, SourceLayout::Archive { .. })
    }

    /// Install prefix of this package.
    pub fn install_dir(&self) -> PathBuf {
        self.root.join(INSTALL_DIR)
    }

    /// Path of the `.packagesig` file.
    pub fn signature_path(&self) -> PathBuf {
        self.root.join(SIGNATURE_FILE)
    }

    /// Whether a previous build completed its install.
    pub fn is_installed(&self) -> bool {
        self.install_dir().is_dir() && self.signature_path().is_file()
    }
}

/// Strip archive extensions from a file name (`zlib-1.2.8.tar.gz` -> `zlib-1.2.8`).
pub fn archive_stem(archive: &str) -> &str {
    let file = archive.rsplit('/').next().unwrap_or(archive);
    for ext in [".tar.gz", ".tgz", ".tar"] {
        if let Some(stem) = file.strip_suffix(ext) {
            return stem;
        }
    }
    file
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(contents: &str) -> Package {
        Package::new(
            Manifest::parse(contents, Path::new("/tree/3rdParty/zlib/package.toml")).unwrap(),
        )
    }

    #[test]
    fn test_archive_stem() {
        assert_eq!(archive_stem("zlib-1.2.8.tar.gz"), "zlib-1.2.8");
        assert_eq!(archive_stem("Ice-3.5.0.tgz"), "Ice-3.5.0");
        assert_eq!(archive_stem("measures.tar"), "measures");
        assert_eq!(archive_stem("dist/blas.tar.gz"), "blas");
        assert_eq!(archive_stem("notes.zip"), "notes.zip");
    }

    #[test]
    fn test_archive_layout() {
        let pkg = package(
            "[package]\nname = \"zlib\"\narchive = \"zlib-1.2.8.tar.gz\"\n[build]\nsystem = \"autotools\"\n",
        );

        assert!(pkg.is_archived());
        assert_eq!(pkg.work_dir(), Path::new("/tree/3rdParty/zlib/zlib-1.2.8"));
        assert_eq!(pkg.install_dir(), PathBuf::from("/tree/3rdParty/zlib/install"));
        assert_eq!(
            pkg.signature_path(),
            PathBuf::from("/tree/3rdParty/zlib/.packagesig")
        );
    }

    #[test]
    fn test_in_place_layout() {
        let pkg = package(
            "[package]\nname = \"askap\"\nsource = \"current\"\n[build]\nsystem = \"scons\"\n",
        );
        assert!(!pkg.is_archived());
        assert_eq!(pkg.work_dir(), Path::new("/tree/3rdParty/zlib/current"));

        let pkg = package("[package]\nname = \"askap\"\n[build]\nsystem = \"scons\"\n");
        assert_eq!(pkg.work_dir(), Path::new("/tree/3rdParty/zlib"));
    }
}
