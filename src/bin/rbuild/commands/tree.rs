//! `rbuild tree` command

use anyhow::Result;

use crate::cli::TreeArgs;
use rbuild::ops::render_trees;
use rbuild::util::GlobalContext;

pub fn execute(args: TreeArgs, gctx: &GlobalContext) -> Result<()> {
    let ws = super::discover(gctx)?;
    print!("{}", render_trees(&ws, &args.packages, args.depth)?);
    Ok(())
}
