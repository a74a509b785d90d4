//! GNU autotools: `./configure && make && make install`.

use crate::builder::context::PackageContext;
use crate::builder::errors::BuildError;
use crate::builder::step::StepAction;
use crate::builder::systems::{jobs_flag, BuildSystem};
use crate::core::BuildSystemKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct Autotools;

impl BuildSystem for Autotools {
    fn kind(&self) -> BuildSystemKind {
        BuildSystemKind::Autotools
    }

    fn required_tools(&self, _ctx: &PackageContext<'_>) -> Vec<&'static str> {
        vec!["make"]
    }

    fn install_hint(&self) -> Option<&'static str> {
        Some("install GNU make (e.g. `apt install build-essential`)")
    }

    fn configure(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let settings = ctx.package.build_settings();

        let mut cmd = ctx.command(ctx.work_dir().join("configure"));
        cmd = cmd.arg(format!("--prefix={}", ctx.install_dir().display()));
        cmd = cmd.args(ctx.expand_all(&settings.configure_args)?);

        Ok(vec![StepAction::run(cmd)])
    }

    fn build(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let settings = ctx.package.build_settings();

        let mut cmd = ctx.command("make");
        if let Some(jobs) = jobs_flag(ctx) {
            cmd = cmd.arg(jobs);
        }
        cmd = cmd.args(ctx.expand_all(&settings.build_args)?);

        Ok(vec![StepAction::run(cmd)])
    }

    fn install(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let settings = ctx.package.build_settings();

        let cmd = ctx
            .command("make")
            .arg("install")
            .args(ctx.expand_all(&settings.install_args)?);

        Ok(vec![StepAction::run(cmd)])
    }

    fn clean(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        // A tree that was never configured has no Makefile to clean with.
        if !ctx.work_dir().join("Makefile").is_file() {
            return Ok(Vec::new());
        }
        Ok(vec![StepAction::run_optional(
            ctx.command("make").arg("distclean"),
        )])
    }
}
