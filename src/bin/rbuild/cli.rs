//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// rbuild - builds and installs a tree of native packages in dependency order
#[derive(Parser)]
#[command(name = "rbuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Root of the package tree
    #[arg(long, global = true, env = "ASKAP_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and install packages after their dependencies
    #[command(visible_alias = "install")]
    Build(BuildArgs),

    /// Remove build products and install prefixes
    Clean(CleanArgs),

    /// Update the tree, install tooling and build the top-level targets
    Bootstrap(BootstrapArgs),

    /// Display the dependency tree
    Tree(TreeArgs),

    /// Print the install prefix of a package
    Path(PathArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    #[default]
    Human,
    Json,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Packages to build (defaults to the package in the current directory, else all)
    pub packages: Vec<String>,

    /// Build only the named packages, not their dependencies
    #[arg(long)]
    pub no_deps: bool,

    /// Rebuild even if the package signature is unchanged
    #[arg(short, long)]
    pub force: bool,

    /// Skip the clean before each build
    #[arg(long)]
    pub no_clean: bool,

    /// Number of parallel jobs handed to build tools
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output format for build events
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Packages to clean (defaults to the package in the current directory, else all)
    pub packages: Vec<String>,
}

#[derive(Args)]
pub struct BootstrapArgs {
    /// Packages to build (overrides `bootstrap.targets`)
    pub targets: Vec<String>,

    /// Do not update the working tree from version control
    #[arg(long)]
    pub no_update: bool,

    /// Number of parallel jobs handed to build tools
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Packages to show the tree for (defaults to all)
    pub packages: Vec<String>,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct PathArgs {
    /// Package name
    pub name: String,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_install_alias() {
        let cli = Cli::try_parse_from(["rbuild", "install", "zlib", "--no-deps", "-j", "4"]).unwrap();
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.packages, vec!["zlib"]);
                assert!(args.no_deps);
                assert_eq!(args.jobs, Some(4));
                assert_eq!(args.message_format, MessageFormat::Human);
            }
            _ => panic!("expected build"),
        }
    }
}
