//! Implementation of `rbuild bootstrap`.
//!
//! A bootstrap brings a fresh or stale checkout to a usable state: it
//! updates the working tree, installs the dependency-manager tooling and
//! then builds the top-level targets.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use git2::{build::CheckoutBuilder, ErrorCode, Repository, StatusOptions};

use crate::builder::archive::{self, ArchiveSource};
use crate::builder::{BuildContext, BuildObserver};
use crate::core::package::archive_stem;
use crate::core::Workspace;
use crate::ops::rbuild_build::{build, BuildOptions, BuildSummary};
use crate::util::config::BootstrapConfig;
use crate::util::shell::{Shell, Status};
use crate::util::CommandRunner;

/// Options for the bootstrap command.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Update the working tree from `origin` first
    pub update: bool,

    /// Tooling archives installed into the tools dir
    pub tools: Vec<String>,

    /// Packages to build (empty = all)
    pub targets: Vec<String>,
}

impl BootstrapOptions {
    pub fn from_config(config: &BootstrapConfig) -> Self {
        BootstrapOptions {
            update: config.update(),
            tools: config.tools.clone(),
            targets: config.targets.clone(),
        }
    }
}

/// What the working tree update did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeUpdate {
    /// `--no-update`, or disabled in config
    Disabled,
    /// The root is not a git repository
    NotARepository,
    /// HEAD is detached, so there is no branch to advance
    Detached,
    UpToDate {
        branch: String,
    },
    FastForwarded {
        branch: String,
        from: String,
        to: String,
    },
}

#[derive(Debug, Clone)]
pub struct BootstrapSummary {
    pub update: TreeUpdate,
    /// Directories that tooling archives were unpacked into
    pub tools: Vec<PathBuf>,
    pub build: BuildSummary,
}

/// Run the three bootstrap stages in order.
///
/// The package tree is discovered after the update, so manifests brought
/// in by it take part in the build.
pub fn bootstrap(
    build_ctx: &BuildContext,
    tools_dir: &Path,
    runner: &dyn CommandRunner,
    observer: &dyn BuildObserver,
    shell: &mut Shell,
    opts: &BootstrapOptions,
) -> Result<BootstrapSummary> {
    let root = build_ctx.root.as_path();

    let update = if opts.update {
        update_tree(root).context("failed to update the working tree")?
    } else {
        TreeUpdate::Disabled
    };
    match &update {
        TreeUpdate::Disabled => tracing::debug!("working tree update disabled"),
        TreeUpdate::NotARepository => {
            tracing::info!("{} is not a git repository, not updating", root.display())
        }
        TreeUpdate::Detached => shell.warn("HEAD is detached, not updating the working tree"),
        TreeUpdate::UpToDate { branch } => tracing::info!("`{}` is up to date", branch),
        TreeUpdate::FastForwarded { branch, from, to } => shell.status(
            Status::Updating,
            format!("{} {}..{}", branch, short(from), short(to)),
        ),
    }

    let tools = install_tools(build_ctx, tools_dir, &opts.tools, shell)?;

    let ws = Workspace::discover(root)
        .with_context(|| format!("failed to discover packages under {}", root.display()))?;
    let build_opts = BuildOptions {
        packages: opts.targets.clone(),
        no_deps: false,
    };
    let build = build(&ws, build_ctx, runner, observer, shell, &build_opts)?;

    Ok(BootstrapSummary {
        update,
        tools,
        build,
    })
}

/// Fetch `origin` and fast-forward the checked-out branch.
pub fn update_tree(root: &Path) -> Result<TreeUpdate> {
    let repo = match Repository::open(root) {
        Ok(repo) => repo,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(TreeUpdate::NotARepository),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to open repository at {}", root.display()))
        }
    };

    let head = repo.head().context("failed to read HEAD")?;
    if !head.is_branch() {
        return Ok(TreeUpdate::Detached);
    }
    let branch = head
        .shorthand()
        .context("branch name is not valid UTF-8")?
        .to_string();
    let from = head.peel_to_commit()?.id();

    tracing::info!("fetching origin/{}", branch);
    let mut remote = repo
        .find_remote("origin")
        .context("repository has no `origin` remote")?;
    remote
        .fetch(&[branch.as_str()], None, None)
        .with_context(|| format!("failed to fetch `{}` from origin", branch))?;

    let fetch_head = repo.find_reference("FETCH_HEAD")?;
    let fetched = repo.reference_to_annotated_commit(&fetch_head)?;
    let (analysis, _) = repo.merge_analysis(&[&fetched])?;

    if analysis.is_up_to_date() {
        return Ok(TreeUpdate::UpToDate { branch });
    }
    if !analysis.is_fast_forward() {
        bail!(
            "local branch `{}` has diverged from origin; merge or rebase it by hand",
            branch
        );
    }

    let dirty = modified_paths(&repo)?;
    if !dirty.is_empty() {
        bail!(
            "working tree has uncommitted changes to {}; commit or stash them before bootstrapping",
            dirty.join(", ")
        );
    }

    let target = repo.find_commit(fetched.id())?;
    repo.checkout_tree(target.as_object(), Some(CheckoutBuilder::new().safe()))
        .context("failed to check out the updated branch")?;

    let refname = format!("refs/heads/{}", branch);
    let mut reference = repo.find_reference(&refname)?;
    reference.set_target(fetched.id(), "rbuild bootstrap: fast-forward")?;
    repo.set_head(&refname)?;

    Ok(TreeUpdate::FastForwarded {
        branch,
        from: from.to_string(),
        to: fetched.id().to_string(),
    })
}

/// Tracked files with staged or unstaged changes.
fn modified_paths(repo: &Repository) -> Result<Vec<String>> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(false).include_ignored(false);
    let statuses = repo
        .statuses(Some(&mut opts))
        .context("failed to read working tree status")?;

    Ok(statuses
        .iter()
        .filter(|entry| entry.status() != git2::Status::CURRENT)
        .map(|entry| entry.path().unwrap_or("<non-UTF-8 path>").to_string())
        .collect())
}

/// Unpack each tooling archive into its own directory under `tools_dir`.
///
/// Tools that are already unpacked are left alone.
pub fn install_tools(
    build_ctx: &BuildContext,
    tools_dir: &Path,
    tools: &[String],
    shell: &Shell,
) -> Result<Vec<PathBuf>> {
    let source = ArchiveSource {
        remote: build_ctx.remote_archive.as_ref(),
        cache_dir: &build_ctx.archive_cache,
        offline: build_ctx.offline,
    };

    let mut installed = Vec::new();
    for tool in tools {
        let dest = tools_dir.join(archive_stem(tool));
        if dest.is_dir() {
            tracing::debug!("{} is already installed", tool);
            installed.push(dest);
            continue;
        }

        shell.status(Status::Fetching, tool);
        let path = source
            .locate(&build_ctx.root, tool, None)
            .with_context(|| format!("failed to fetch bootstrap tool `{}`", tool))?;

        shell.status(Status::Unpacking, format!("{} into {}", tool, dest.display()));
        archive::extract_file_or_remove(&path, &dest, None, &dest)
            .with_context(|| format!("failed to install bootstrap tool `{}`", tool))?;
        installed.push(dest);
    }
    Ok(installed)
}

fn short(oid: &str) -> &str {
    &oid[..8.min(oid.len())]
}
