//! Build system variants.
//!
//! Each variant turns a [`PackageContext`] into the actions of the
//! configure, build, install and clean steps. Variants never run anything
//! themselves; the package builder executes what they return.

mod ant;
mod autotools;
mod cmake;
mod data;
mod scons;
mod setuptools;
mod virtual_tool;

pub use ant::Ant;
pub use autotools::Autotools;
pub use cmake::CMake;
pub use data::Data;
pub use scons::SCons;
pub use setuptools::Setuptools;
pub use virtual_tool::Virtual;

use crate::builder::context::PackageContext;
use crate::builder::errors::BuildError;
use crate::builder::step::StepAction;
use crate::core::BuildSystemKind;

/// Capability interface shared by all build system variants.
pub trait BuildSystem {
    fn kind(&self) -> BuildSystemKind;

    /// Programs that must be on the search path before any step runs.
    fn required_tools(&self, _ctx: &PackageContext<'_>) -> Vec<&'static str> {
        Vec::new()
    }

    /// How to obtain a missing tool.
    fn install_hint(&self) -> Option<&'static str> {
        None
    }

    /// Verify the variant's tools are available.
    fn check_tools(&self, ctx: &PackageContext<'_>) -> Result<(), BuildError> {
        for tool in self.required_tools(ctx) {
            if ctx.find_tool(tool).is_none() {
                return Err(BuildError::ToolNotFound {
                    package: ctx.name().to_string(),
                    tool: tool.to_string(),
                    hint: self.install_hint().map(str::to_string),
                });
            }
        }
        Ok(())
    }

    /// Configure actions; empty when the variant has no configure step.
    fn configure(&self, _ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        Ok(Vec::new())
    }

    fn build(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError>;

    fn install(&self, ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError>;

    /// Extra clean actions for in-place sources.
    fn clean(&self, _ctx: &PackageContext<'_>) -> Result<Vec<StepAction>, BuildError> {
        Ok(Vec::new())
    }
}

/// The build system implementing `kind`.
pub fn for_kind(kind: BuildSystemKind) -> Box<dyn BuildSystem> {
    match kind {
        BuildSystemKind::Autotools => Box::new(Autotools),
        BuildSystemKind::CMake => Box::new(CMake),
        BuildSystemKind::SCons => Box::new(SCons),
        BuildSystemKind::Setuptools => Box::new(Setuptools),
        BuildSystemKind::Ant => Box::new(Ant),
        BuildSystemKind::Virtual => Box::new(Virtual),
        BuildSystemKind::Data => Box::new(Data),
    }
}

/// `-jN` for tools that take make-style job flags.
fn jobs_flag(ctx: &PackageContext<'_>) -> Option<String> {
    ctx.jobs().map(|n| format!("-j{}", n))
}
