//! Python packages built with `setup.py`.

use crate::builder::context::PackageContext;
use crate::builder::errors::BuildError;
use crate::builder::step::StepAction;
use crate::builder::systems::BuildSystem;
use crate::core::BuildSystemKind;

const PYTHON: &str = "python3";

#[derive(Debug, Clone, Copy, Default)]
pub struct Setuptools;

impl BuildSystem for Setuptools {
    fn kind(&self) -> BuildSystemKind {
        BuildSystemKind::Setuptools
    }

    fn required_tools(&self, _ctx: &PackageContext<'_>) -> Vec<&'static str> {
        vec![PYTHON]
    }

    fn install_hint(&self) -> Option<&'static str> {
        Some("install Python 3 and make sure `python3` is on PATH")
    }

    fn build(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let settings = ctx.package.build_settings();

        let cmd = ctx
            .command(PYTHON)
            .args(["setup.py", "build"])
            .args(ctx.expand_all(&settings.configure_args)?)
            .args(ctx.expand_all(&settings.build_args)?);

        Ok(vec![StepAction::run(cmd)])
    }

    fn install(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let settings = ctx.package.build_settings();

        let cmd = ctx
            .command(PYTHON)
            .args(["setup.py", "install"])
            .arg(format!("--prefix={}", ctx.install_dir().display()))
            .args(ctx.expand_all(&settings.install_args)?);

        Ok(vec![StepAction::run(cmd)])
    }

    fn clean(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        Ok(vec![StepAction::run_optional(
            ctx.command(PYTHON).args(["setup.py", "clean", "--all"]),
        )])
    }
}
