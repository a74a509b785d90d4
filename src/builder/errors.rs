//! Classified build failures.
//!
//! These are raised inside `anyhow` chains; callers that need to react to a
//! particular failure use `downcast_ref::<BuildError>()`.

use thiserror::Error;

use crate::builder::step::BuildStep;
use crate::resolver::ResolveError;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("`{package}` cannot be built: dependency `{dependency}` is unavailable")]
    MissingDependency {
        package: String,
        dependency: String,
        #[source]
        source: ResolveError,
    },

    #[error("`{package}` refers to `${{dep:{dependency}}}` but does not declare `{dependency}` as a dependency")]
    UndeclaredDependency { package: String, dependency: String },

    #[error("`{package}` uses unknown placeholder `${{{placeholder}}}`")]
    UnknownPlaceholder { package: String, placeholder: String },

    #[error("`{package}` needs `{tool}`, which was not found{}", format_hint(hint))]
    ToolNotFound {
        package: String,
        tool: String,
        hint: Option<String>,
    },

    #[error("{step} step of `{package}` failed: `{command}` exited with {}{}", format_code(*code), format_output(output))]
    CommandFailed {
        package: String,
        step: BuildStep,
        command: String,
        code: Option<i32>,
        output: String,
    },
}

impl BuildError {
    /// Step a command failure happened in.
    pub fn step(&self) -> Option<BuildStep> {
        match self {
            BuildError::CommandFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}

fn format_hint(hint: &Option<String>) -> String {
    hint.as_ref().map(|h| format!("\n{}", h)).unwrap_or_default()
}

fn format_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

fn format_output(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!("\n{}", output)
    }
}
