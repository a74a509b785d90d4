//! Test utilities and mocks for rbuild unit tests.
//!
//! [`MockRunner`] stands in for the system command runner: it records every
//! command the builder would have spawned and answers with scripted
//! outputs, so the build lifecycle can be tested without autotools, cmake
//! or any other tool installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use rbuild::test_support::{CommandPattern, MockProcessOutput, MockRunner};
//!
//! let runner = MockRunner::new();
//! runner.expect(CommandPattern::Contains("make install".into()), MockProcessOutput::failure(2, "boom"));
//! // build with &runner, then inspect runner.commands()
//! ```

pub mod fixtures;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Output};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::resolver::{DependencyResolver, ResolveError};
use crate::util::{CommandRunner, ProcessBuilder};

pub use fixtures::*;

/// Output of a mocked process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    fn to_output(&self) -> Output {
        Output {
            status: exit_status(self.status),
            stdout: self.stdout.clone().into_bytes(),
            stderr: self.stderr.clone().into_bytes(),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

#[cfg(unix)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

/// Pattern for matching commands in [`MockRunner`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Any => true,
        }
    }
}

/// Records commands instead of running them.
#[derive(Debug, Default)]
pub struct MockRunner {
    expectations: Mutex<Vec<(CommandPattern, MockProcessOutput)>>,
    recorded: Mutex<Vec<ProcessBuilder>>,
    refuse_spawn: Mutex<Vec<CommandPattern>>,
}

impl MockRunner {
    /// A runner on which every command succeeds with empty output.
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Answer commands matching `pattern` with `output`. The first matching
    /// expectation wins.
    pub fn expect(&self, pattern: CommandPattern, output: MockProcessOutput) -> &Self {
        self.expectations
            .lock()
            .unwrap()
            .push((pattern, output));
        self
    }

    /// Fail to spawn commands matching `pattern`, as if the program was missing.
    pub fn refuse(&self, pattern: CommandPattern) -> &Self {
        self.refuse_spawn.lock().unwrap().push(pattern);
        self
    }

    /// Every command seen so far, as display strings.
    pub fn commands(&self) -> Vec<String> {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .map(ProcessBuilder::display_command)
            .collect()
    }

    /// Every command seen so far.
    pub fn recorded(&self) -> Vec<ProcessBuilder> {
        self.recorded.lock().unwrap().clone()
    }

    /// Forget all recorded commands.
    pub fn clear(&self) {
        self.recorded.lock().unwrap().clear();
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<Output> {
        let display = cmd.display_command();
        self.recorded.lock().unwrap().push(cmd.clone());

        if self
            .refuse_spawn
            .lock()
            .unwrap()
            .iter()
            .any(|p| p.matches(&display))
        {
            bail!("failed to spawn `{}`", cmd.get_program().display());
        }

        let expectations = self.expectations.lock().unwrap();
        let output = expectations
            .iter()
            .find(|(pattern, _)| pattern.matches(&display))
            .map(|(_, output)| output.clone())
            .unwrap_or_default();
        Ok(output.to_output())
    }
}

/// Resolver over a fixed name → install path map.
#[derive(Debug, Default, Clone)]
pub struct MapResolver {
    pub paths: BTreeMap<String, PathBuf>,
    pub signatures: BTreeMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        MapResolver::default()
    }

    pub fn with(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(name.to_string(), path.into());
        self
    }

    pub fn with_signature(mut self, name: &str, signature: &str) -> Self {
        self.signatures
            .insert(name.to_string(), signature.to_string());
        self
    }
}

impl DependencyResolver for MapResolver {
    fn get_install_path(&self, name: &str) -> Result<PathBuf, ResolveError> {
        self.paths
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::PackageNotFound {
                package: name.to_string(),
                suggestions: Vec::new(),
            })
    }

    fn get_dep_path(&self, name: &str) -> Result<PathBuf, ResolveError> {
        self.get_install_path(name)
    }

    fn signature(&self, name: &str) -> Option<String> {
        self.signatures.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_records_and_scripts() {
        let runner = MockRunner::new();
        runner.expect(
            CommandPattern::StartsWith("make install".to_string()),
            MockProcessOutput::failure(2, "no rule"),
        );

        let ok = runner.run(&ProcessBuilder::new("make").arg("-j2")).unwrap();
        assert!(ok.status.success());

        let failed = runner.run(&ProcessBuilder::new("make").arg("install")).unwrap();
        assert_eq!(failed.status.code(), Some(2));
        assert_eq!(String::from_utf8_lossy(&failed.stderr), "no rule");

        assert_eq!(runner.commands(), vec!["make -j2", "make install"]);
    }

    #[test]
    fn test_map_resolver() {
        let resolver = MapResolver::new().with("zlib", "/opt/zlib");
        assert_eq!(resolver.get_dep_path("zlib").unwrap(), PathBuf::from("/opt/zlib"));
        assert!(resolver.get_dep_path("blas").is_err());
    }
}
