//! `rbuild clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use rbuild::builder::BuildContext;
use rbuild::ops::{clean, default_selection};
use rbuild::util::shell::{Shell, Status};
use rbuild::util::{GlobalContext, SystemRunner};

pub fn execute(args: CleanArgs, gctx: &GlobalContext) -> Result<()> {
    let ws = super::discover(gctx)?;
    let config = gctx.load_config();
    let build_ctx = BuildContext::from_config(gctx, &config)?;

    let packages = if args.packages.is_empty() {
        default_selection(&ws, gctx.cwd())
    } else {
        args.packages
    };

    let shell = Shell::from_flags(gctx.is_verbose(), false);
    let cleaned = clean(&ws, &build_ctx, &SystemRunner, &shell, &packages)?;
    shell.status(Status::Finished, format!("cleaning {} package(s)", cleaned));
    Ok(())
}
