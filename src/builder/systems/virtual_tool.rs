//! Packages satisfied by a tool already installed on the system.
//!
//! Nothing is compiled. The executable is located on the search path and
//! exposed as `<install>/bin/<executable>`, so dependents can treat the
//! package like any other installed prerequisite.

use std::path::Path;

use crate::builder::context::PackageContext;
use crate::builder::errors::BuildError;
use crate::builder::step::StepAction;
use crate::builder::systems::BuildSystem;
use crate::core::BuildSystemKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct Virtual;

impl Virtual {
    fn executable<'c>(ctx: &'c PackageContext<'_>) -> Result<&'c str, BuildError> {
        ctx.package
            .build_settings()
            .executable
            .as_deref()
            .ok_or_else(|| BuildError::ToolNotFound {
                package: ctx.name().to_string(),
                tool: String::new(),
                hint: Some("virtual packages must name an `executable`".to_string()),
            })
    }
}

impl BuildSystem for Virtual {
    fn kind(&self) -> BuildSystemKind {
        BuildSystemKind::Virtual
    }

    fn check_tools(&self, ctx: &PackageContext<'_>) -> Result<(), BuildError> {
        let exe = Self::executable(ctx)?;
        match ctx.find_tool(exe) {
            Some(_) => Ok(()),
            None => Err(BuildError::ToolNotFound {
                package: ctx.name().to_string(),
                tool: exe.to_string(),
                hint: Some(format!(
                    "`{}` is provided by the system; install it and make sure it is on PATH",
                    exe
                )),
            }),
        }
    }

    fn build(&self, _ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        Ok(Vec::new())
    }

    fn install(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        let exe = Self::executable(ctx)?;
        let found = ctx.find_tool(exe).ok_or_else(|| BuildError::ToolNotFound {
            package: ctx.name().to_string(),
            tool: exe.to_string(),
            hint: None,
        })?;

        let file_name = Path::new(exe)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| exe.into());

        Ok(vec![StepAction::LinkExecutable {
            executable: found,
            to: ctx.install_dir().join("bin").join(file_name),
        }])
    }
}
