//! Package builder.
//!
//! This module runs packages through the clean, configure, build and
//! install lifecycle using one of the supported build systems.

pub mod archive;
pub mod context;
pub mod errors;
pub mod events;
pub mod package_builder;
pub mod signature;
pub mod step;
pub mod systems;

pub use context::{BuildContext, PackageContext};
pub use errors::BuildError;
pub use events::{BuildEvent, BuildObserver, JsonObserver, NoopObserver};
pub use package_builder::{BuildOutcome, Hook, PackageBuilder};
pub use signature::PackageSignature;
pub use step::{BuildStep, StepAction};
pub use systems::{for_kind, BuildSystem};
