//! Build steps and the actions they are made of.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::util::ProcessBuilder;

/// A stage of the package lifecycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStep {
    Clean,
    Unpack,
    PreHook,
    Configure,
    Build,
    Install,
    PostHook,
}

impl BuildStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStep::Clean => "clean",
            BuildStep::Unpack => "unpack",
            BuildStep::PreHook => "pre-hook",
            BuildStep::Configure => "configure",
            BuildStep::Build => "build",
            BuildStep::Install => "install",
            BuildStep::PostHook => "post-hook",
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work inside a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Run an external command. Failures of optional commands are logged
    /// and the step carries on.
    Run {
        command: ProcessBuilder,
        optional: bool,
    },

    /// Copy everything matching `patterns` (relative to `from`) into `to`,
    /// keeping relative paths.
    CopyFiles {
        from: PathBuf,
        patterns: Vec<String>,
        to: PathBuf,
    },

    /// Expose an existing executable as `to`.
    LinkExecutable { executable: PathBuf, to: PathBuf },

    /// Delete a directory tree if present.
    RemoveDir(PathBuf),
}

impl StepAction {
    /// A required command.
    pub fn run(command: ProcessBuilder) -> Self {
        StepAction::Run {
            command,
            optional: false,
        }
    }

    /// A command whose failure is tolerated.
    pub fn run_optional(command: ProcessBuilder) -> Self {
        StepAction::Run {
            command,
            optional: true,
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            StepAction::Run { command, .. } => command.display_command(),
            StepAction::CopyFiles { patterns, to, .. } => {
                format!("copy {} -> {}", patterns.join(" "), to.display())
            }
            StepAction::LinkExecutable { executable, to } => {
                format!("link {} -> {}", executable.display(), to.display())
            }
            StepAction::RemoveDir(path) => format!("remove {}", path.display()),
        }
    }
}
