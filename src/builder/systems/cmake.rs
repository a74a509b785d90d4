//! CMake integration.
//!
//! Configures out of source into `<work_dir>/build`, then drives the build
//! and install through `cmake --build` and `cmake --install`.

use std::path::PathBuf;

use crate::builder::context::PackageContext;
use crate::builder::errors::BuildError;
use crate::builder::step::StepAction;
use crate::builder::systems::BuildSystem;
use crate::core::BuildSystemKind;

/// Build type used unless the package passes its own `-DCMAKE_BUILD_TYPE`.
const DEFAULT_BUILD_TYPE: &str = "Release";

#[derive(Debug, Clone, Copy, Default)]
pub struct CMake;

impl CMake {
    fn build_dir(ctx: &PackageContext<'_>) -> PathBuf {
        ctx.work_dir().join("build")
    }
}

impl BuildSystem for CMake {
    fn kind(&self) -> BuildSystemKind {
        BuildSystemKind::CMake
    }

    fn required_tools(&self, _ctx: &PackageContext<'_>) -> Vec<&'static str> {
        vec!["cmake"]
    }

    fn install_hint(&self) -> Option<&'static str> {
        Some("install CMake from https://cmake.org/download/ or your package manager")
    }

    fn configure(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let settings = ctx.package.build_settings();
        let args = ctx.expand_all(&settings.configure_args)?;

        let mut cmd = ctx.command("cmake");
        cmd = cmd.arg("-S").arg(ctx.work_dir());
        cmd = cmd.arg("-B").arg(Self::build_dir(ctx));
        cmd = cmd.arg(format!(
            "-DCMAKE_INSTALL_PREFIX={}",
            ctx.install_dir().display()
        ));
        if !args.iter().any(|a| a.starts_with("-DCMAKE_BUILD_TYPE=")) {
            cmd = cmd.arg(format!("-DCMAKE_BUILD_TYPE={}", DEFAULT_BUILD_TYPE));
        }
        cmd = cmd.args(args);

        Ok(vec![StepAction::run(cmd)])
    }

    fn build(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let settings = ctx.package.build_settings();

        let mut cmd = ctx.command("cmake");
        cmd = cmd.arg("--build").arg(Self::build_dir(ctx));
        if let Some(jobs) = ctx.jobs() {
            cmd = cmd.arg("--parallel").arg(jobs.to_string());
        }
        cmd = cmd.args(ctx.expand_all(&settings.build_args)?);

        Ok(vec![StepAction::run(cmd)])
    }

    fn install(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let settings = ctx.package.build_settings();

        let cmd = ctx
            .command("cmake")
            .arg("--install")
            .arg(Self::build_dir(ctx))
            .args(ctx.expand_all(&settings.install_args)?);

        Ok(vec![StepAction::run(cmd)])
    }

    fn clean(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        Ok(vec![StepAction::RemoveDir(Self::build_dir(ctx))])
    }
}
