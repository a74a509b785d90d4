//! High-level operations.
//!
//! This module contains the implementation of rbuild commands.

pub mod bootstrap;
pub mod rbuild_build;
pub mod tree;

pub use bootstrap::{bootstrap, install_tools, update_tree, BootstrapOptions, BootstrapSummary, TreeUpdate};
pub use rbuild_build::{build, clean, default_selection, BuildOptions, BuildSummary};
pub use tree::{install_path, render_trees};
