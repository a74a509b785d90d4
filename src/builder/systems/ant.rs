//! Java packages built with Apache Ant. Requires `JAVA_HOME`.

use std::path::PathBuf;

use crate::builder::context::PackageContext;
use crate::builder::errors::BuildError;
use crate::builder::step::StepAction;
use crate::builder::systems::BuildSystem;
use crate::core::BuildSystemKind;
use crate::util::ProcessBuilder;

#[derive(Debug, Clone, Copy, Default)]
pub struct Ant;

impl Ant {
    /// `JAVA_HOME` from the package env, falling back to the invocation's.
    fn java_home(ctx: &PackageContext<'_>) -> Option<PathBuf> {
        ctx.env
            .get("JAVA_HOME")
            .map(PathBuf::from)
            .or_else(|| ctx.build.java_home.clone())
    }

    fn base(ctx: &PackageContext<'_>) -> ProcessBuilder {
        let mut cmd = ctx.command("ant");
        if let Some(java_home) = Self::java_home(ctx) {
            cmd = cmd.env("JAVA_HOME", java_home.display().to_string());
        }
        cmd.arg(format!("-Dprefix={}", ctx.install_dir().display()))
    }
}

impl BuildSystem for Ant {
    fn kind(&self) -> BuildSystemKind {
        BuildSystemKind::Ant
    }

    fn required_tools(&self, _ctx: &PackageContext<'_>) -> Vec<&'static str> {
        vec!["ant"]
    }

    fn install_hint(&self) -> Option<&'static str> {
        Some("install Apache Ant from https://ant.apache.org/")
    }

    fn check_tools(&self, ctx: &PackageContext<'_>) -> Result<(), BuildError> {
        if Self::java_home(ctx).is_none() {
            return Err(BuildError::ToolNotFound {
                package: ctx.name().to_string(),
                tool: "JAVA_HOME".to_string(),
                hint: Some("set JAVA_HOME to the root of a JDK installation".to_string()),
            });
        }
        if ctx.find_tool("ant").is_none() {
            return Err(BuildError::ToolNotFound {
                package: ctx.name().to_string(),
                tool: "ant".to_string(),
                hint: self.install_hint().map(str::to_string),
            });
        }
        Ok(())
    }

    fn build(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let settings = ctx.package.build_settings();

        let mut cmd = Self::base(ctx).args(ctx.expand_all(&settings.configure_args)?);
        if let Some(target) = &settings.target {
            cmd = cmd.arg(ctx.expand(target)?);
        }
        cmd = cmd.args(ctx.expand_all(&settings.build_args)?);

        Ok(vec![StepAction::run(cmd)])
    }

    fn install(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let settings = ctx.package.build_settings();

        let cmd = Self::base(ctx)
            .args(ctx.expand_all(&settings.configure_args)?)
            .arg("install")
            .args(ctx.expand_all(&settings.install_args)?);

        Ok(vec![StepAction::run(cmd)])
    }

    fn clean(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        Ok(vec![StepAction::run_optional(Self::base(ctx).arg("clean"))])
    }
}
