//! rbuild - builds and installs a tree of interdependent native packages
//!
//! Every package in the tree carries a `package.toml` naming its build
//! system (autotools, CMake, SCons, setuptools, Ant, or one of the
//! virtual/data kinds) and its dependencies. rbuild resolves the install
//! prefixes of those dependencies, drives each package through its build
//! steps in dependency order, and records a `.packagesig` so unchanged
//! packages are not rebuilt. A small client for the service lifecycle
//! protocol is included for functional tests of deployed services.

pub mod builder;
pub mod core;
pub mod lifecycle;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities and mocks for rbuild unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recording command runner, a fixed-path
/// dependency resolver and package tree fixtures.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildContext, BuildOutcome, PackageBuilder};
pub use core::{Manifest, Package, Workspace};
pub use resolver::{DependencyResolver, TreeResolver};
pub use util::context::GlobalContext;
