//! Build event types for JSON output.
//!
//! This module defines the JSON schema for machine-readable build output,
//! emitted one object per line on stdout with `--message-format=json`.
//!
//! # Event Types
//!
//! - `build-started`: An invocation is about to build `package_count` packages
//! - `package-started`: A package entered its lifecycle
//! - `step-finished`: A build step of a package completed
//! - `package-finished`: A package was built, found up to date, or skipped
//! - `build-finished`: The invocation completed (success or failure)
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use serde::Serialize;

use crate::builder::step::BuildStep;

/// A build event emitted during the build process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    #[serde(rename = "build-started")]
    BuildStarted { package_count: u64 },

    #[serde(rename = "package-started")]
    PackageStarted { package: String },

    #[serde(rename = "step-finished")]
    StepFinished {
        package: String,
        step: BuildStep,
        duration_ms: u64,
    },

    /// `outcome` is one of `built`, `up-to-date`, `skipped`.
    #[serde(rename = "package-finished")]
    PackageFinished {
        package: String,
        outcome: String,
        duration_ms: u64,
    },

    #[serde(rename = "build-finished")]
    BuildFinished {
        success: bool,
        duration_ms: u64,
        /// Number of packages actually rebuilt
        packages_built: u64,
    },
}

impl BuildEvent {
    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receives build events as they happen.
pub trait BuildObserver {
    fn event(&self, event: &BuildEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BuildObserver for NoopObserver {
    fn event(&self, _event: &BuildEvent) {}
}

/// Prints every event as a JSON line on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonObserver;

impl BuildObserver for JsonObserver {
    fn event(&self, event: &BuildEvent) {
        println!("{}", event.to_json());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_finished_serialization() {
        let event = BuildEvent::StepFinished {
            package: "zlib".to_string(),
            step: BuildStep::PreHook,
            duration_ms: 12,
        };
        let json = event.to_json();
        assert!(json.contains("\"reason\":\"step-finished\""));
        assert!(json.contains("\"step\":\"pre-hook\""));
        assert!(json.contains("\"duration_ms\":12"));
    }

    #[test]
    fn test_finished_serialization() {
        let event = BuildEvent::BuildFinished {
            success: true,
            duration_ms: 2340,
            packages_built: 3,
        };
        let json = event.to_json();
        assert!(json.contains("\"reason\":\"build-finished\""));
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"packages_built\":3"));
    }
}
