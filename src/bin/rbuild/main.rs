//! rbuild CLI - builds and installs a tree of native packages

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use rbuild::util::GlobalContext;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("rbuild=debug")
    } else {
        EnvFilter::new("rbuild=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let mut gctx = GlobalContext::new(cli.root)?;
    gctx.set_verbose(cli.verbose);

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &gctx),
        Commands::Clean(args) => commands::clean::execute(args, &gctx),
        Commands::Bootstrap(args) => commands::bootstrap::execute(args, &gctx),
        Commands::Tree(args) => commands::tree::execute(args, &gctx),
        Commands::Path(args) => commands::path::execute(args, &gctx),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
