//! SCons builds. There is no configure step; `configure_args` are passed as
//! `key=value` options to both the build and install invocations.

use crate::builder::context::PackageContext;
use crate::builder::errors::BuildError;
use crate::builder::step::StepAction;
use crate::builder::systems::{jobs_flag, BuildSystem};
use crate::core::BuildSystemKind;
use crate::util::ProcessBuilder;

#[derive(Debug, Clone, Copy, Default)]
pub struct SCons;

impl SCons {
    fn base(ctx: &PackageContext<'_>) -> Result<ProcessBuilder, BuildError> {
        let settings = ctx.package.build_settings();
        Ok(ctx
            .command("scons")
            .arg(format!("prefix={}", ctx.install_dir().display()))
            .args(ctx.expand_all(&settings.configure_args)?))
    }
}

impl BuildSystem for SCons {
    fn kind(&self) -> BuildSystemKind {
        BuildSystemKind::SCons
    }

    fn required_tools(&self, _ctx: &PackageContext<'_>) -> Vec<&'static str> {
        vec!["scons"]
    }

    fn install_hint(&self) -> Option<&'static str> {
        Some("install SCons (e.g. `pip install scons`)")
    }

    fn build(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let settings = ctx.package.build_settings();

        let mut cmd = Self::base(ctx)?;
        if let Some(jobs) = jobs_flag(ctx) {
            cmd = cmd.arg(jobs);
        }
        cmd = cmd.args(ctx.expand_all(&settings.build_args)?);

        Ok(vec![StepAction::run(cmd)])
    }

    fn install(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let settings = ctx.package.build_settings();

        let cmd = Self::base(ctx)?
            .arg("install")
            .args(ctx.expand_all(&settings.install_args)?);

        Ok(vec![StepAction::run(cmd)])
    }

    fn clean(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        Ok(vec![StepAction::run_optional(Self::base(ctx)?.arg("-c"))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::context::BuildContext;
    use crate::test_support::{described, manifest, package_at};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_scons_commands() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("askap");
        let pkg = package_at(
            &dir,
            &manifest("askap", "scons", &[], "configure_args = [\"version=1.2\"]\n"),
        );
        let build = BuildContext::new(tmp.path().to_path_buf()).with_jobs(2);
        let ctx = PackageContext::new(&pkg, &build, BTreeMap::new()).unwrap();
        let prefix = format!("prefix={}", dir.join("install").display());

        assert!(SCons.configure(&ctx).unwrap().is_empty());
        assert_eq!(
            described(&SCons.build(&ctx).unwrap()),
            vec![format!("scons {} version=1.2 -j2", prefix)]
        );
        assert_eq!(
            described(&SCons.install(&ctx).unwrap()),
            vec![format!("scons {} version=1.2 install", prefix)]
        );
        assert_eq!(
            described(&SCons.clean(&ctx).unwrap()),
            vec![format!("scons {} version=1.2 -c", prefix)]
        );
    }
}
