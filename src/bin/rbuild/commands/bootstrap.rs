//! `rbuild bootstrap` command

use anyhow::Result;

use crate::cli::BootstrapArgs;
use rbuild::builder::{BuildContext, NoopObserver};
use rbuild::ops::{bootstrap, BootstrapOptions};
use rbuild::util::shell::Shell;
use rbuild::util::{GlobalContext, SystemRunner};

pub fn execute(args: BootstrapArgs, gctx: &GlobalContext) -> Result<()> {
    let mut config = gctx.load_config();
    if args.jobs.is_some() {
        config.build.jobs = args.jobs;
    }
    let build_ctx = BuildContext::from_config(gctx, &config)?;

    let mut opts = BootstrapOptions::from_config(&config.bootstrap);
    if args.no_update {
        opts.update = false;
    }
    if !args.targets.is_empty() {
        opts.targets = args.targets;
    }

    let mut shell = Shell::from_flags(gctx.is_verbose(), false);
    let summary = bootstrap(
        &build_ctx,
        &gctx.tools_dir(),
        &SystemRunner,
        &NoopObserver,
        &mut shell,
        &opts,
    )?;

    if !summary.tools.is_empty() {
        tracing::info!("{} tool(s) available in {}", summary.tools.len(), gctx.tools_dir().display());
    }
    Ok(())
}
