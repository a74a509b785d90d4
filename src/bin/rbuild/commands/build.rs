//! `rbuild build` command

use anyhow::Result;

use crate::cli::{BuildArgs, MessageFormat};
use rbuild::builder::{BuildContext, BuildObserver, JsonObserver, NoopObserver};
use rbuild::ops::{build, default_selection, BuildOptions};
use rbuild::util::shell::Shell;
use rbuild::util::{GlobalContext, SystemRunner};

pub fn execute(args: BuildArgs, gctx: &GlobalContext) -> Result<()> {
    let ws = super::discover(gctx)?;

    // CLI flags override config
    let mut config = gctx.load_config();
    if args.jobs.is_some() {
        config.build.jobs = args.jobs;
    }
    if args.no_clean {
        config.build.no_clean = Some(true);
    }
    let build_ctx = BuildContext::from_config(gctx, &config)?.with_force(args.force);

    let packages = if args.packages.is_empty() {
        default_selection(&ws, gctx.cwd())
    } else {
        args.packages
    };
    let opts = BuildOptions {
        packages,
        no_deps: args.no_deps,
    };

    let json = args.message_format == MessageFormat::Json;
    let mut shell = Shell::from_flags(gctx.is_verbose(), json);
    let observer: &dyn BuildObserver = if json { &JsonObserver } else { &NoopObserver };

    build(&ws, &build_ctx, &SystemRunner, observer, &mut shell, &opts)?;
    Ok(())
}
