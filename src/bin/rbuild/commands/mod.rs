//! Command implementations

pub mod bootstrap;
pub mod build;
pub mod clean;
pub mod completions;
pub mod path;
pub mod tree;

use anyhow::{Context, Result};

use rbuild::core::Workspace;
use rbuild::util::GlobalContext;

/// Index the packages under the tree root.
fn discover(gctx: &GlobalContext) -> Result<Workspace> {
    let ws = Workspace::discover(gctx.root())
        .with_context(|| format!("failed to read packages under {}", gctx.root().display()))?;
    if ws.is_empty() {
        tracing::warn!("no packages found under {}", gctx.root().display());
    }
    Ok(ws)
}
