//! `rbuild path` command

use anyhow::Result;

use crate::cli::PathArgs;
use rbuild::ops::install_path;
use rbuild::util::GlobalContext;

pub fn execute(args: PathArgs, gctx: &GlobalContext) -> Result<()> {
    let ws = super::discover(gctx)?;
    println!("{}", install_path(&ws, &args.name)?.display());
    Ok(())
}
