//! Core data structures for rbuild.
//!
//! This module contains the foundational types used throughout rbuild:
//! - Package manifests and their build settings
//! - Packages bound to their directory layout
//! - The workspace index of a tree
//! - Host platform detection

pub mod manifest;
pub mod package;
pub mod platform;
pub mod workspace;

pub use manifest::{BuildSystemKind, Manifest, ManifestError, MissingToolPolicy, MANIFEST_NAME};
pub use package::{Package, SourceLayout};
pub use platform::Platform;
pub use workspace::{find_manifest, Workspace};
