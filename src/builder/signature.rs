//! Package signatures for skipping redundant reinstalls.
//!
//! A signature captures every input of a package build: the manifest bytes,
//! the builder kind, the resolved options and environment, and the
//! signatures of the dependencies it was built against. It is stored in
//! `.packagesig` as a single hex line once an install has succeeded.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::builder::context::PackageContext;
use crate::builder::errors::BuildError;
use crate::core::SourceLayout;
use crate::util::fs::write_string;
use crate::util::hash::Fingerprint;

/// Fingerprint of a package's build inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSignature(String);

impl PackageSignature {
    /// Compute the signature for a package about to be built.
    ///
    /// `dep_signatures` holds the recorded signature of each dependency;
    /// dependencies without one contribute an empty component.
    pub fn compute(
        ctx: &PackageContext<'_>,
        dep_signatures: &BTreeMap<String, String>,
    ) -> Result<Self, BuildError> {
        let package = ctx.package;
        let settings = package.build_settings();
        let mut fp = Fingerprint::new();

        fp.update_str(&package.manifest().content_hash)
            .update_str(package.system().as_str());

        fp.update_list("configure_args", &ctx.expand_all(&settings.configure_args)?)
            .update_list("build_args", &ctx.expand_all(&settings.build_args)?)
            .update_list("install_args", &ctx.expand_all(&settings.install_args)?);

        for (label, overridden) in [
            ("configure", &settings.configure),
            ("build", &settings.build),
            ("install", &settings.install),
        ] {
            match overridden {
                Some(argv) => fp.update_list(label, &ctx.expand_all(argv)?),
                None => fp.update_str(label).update_bool(false),
            };
        }

        fp.update_pairs("env", &ctx.env)
            .update_bool(settings.no_warnings)
            .update_str(&ctx.install_dir().display().to_string());

        if let SourceLayout::Archive { archive, sha256, .. } = package.layout() {
            fp.update_str(archive)
                .update_str(sha256.as_deref().unwrap_or_default());
        }

        for dep in package.dependencies() {
            let sig = dep_signatures.get(dep).map(String::as_str).unwrap_or_default();
            fp.update_str(dep).update_str(sig);
        }

        Ok(PackageSignature(fp.finish()))
    }

    /// Signature recorded at `path`, if any.
    pub fn load(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PackageSignature(trimmed.to_string()))
        }
    }

    /// Record the signature at `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_string(path, &format!("{}\n", self.0))
            .with_context(|| format!("failed to write signature: {}", path.display()))
    }

    /// Whether a previously recorded signature matches this one.
    pub fn matches(&self, recorded: Option<&PackageSignature>) -> bool {
        recorded.is_some_and(|r| r == self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
