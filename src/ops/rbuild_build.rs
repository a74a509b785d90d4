//! Implementation of `rbuild build`.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::builder::{BuildContext, BuildEvent, BuildObserver, BuildOutcome, PackageBuilder};
use crate::core::Workspace;
use crate::resolver::{build_order, TreeResolver};
use crate::util::shell::{format_duration, Shell, Status};
use crate::util::CommandRunner;

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Packages to build (empty = the package containing the cwd, else all)
    pub packages: Vec<String>,

    /// Build only the named packages, not their dependencies
    pub no_deps: bool,
}

/// What one invocation did, per package in build order.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub outcomes: Vec<(String, BuildOutcome)>,
    pub duration: Duration,
}

impl BuildSummary {
    pub fn built(&self) -> usize {
        self.count(|o| matches!(o, BuildOutcome::Built))
    }

    pub fn up_to_date(&self) -> usize {
        self.count(|o| matches!(o, BuildOutcome::UpToDate))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, BuildOutcome::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&BuildOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Packages selected when none are named: the one whose tree holds `cwd`,
/// or every package when `cwd` is outside all of them.
pub fn default_selection(ws: &Workspace, cwd: &Path) -> Vec<String> {
    ws.package_containing(cwd)
        .map(|p| vec![p.name().to_string()])
        .unwrap_or_default()
}

/// Build the selected packages after their dependencies, one at a time.
///
/// The first failure stops the run; packages already installed stay
/// installed.
pub fn build(
    ws: &Workspace,
    build_ctx: &BuildContext,
    runner: &dyn CommandRunner,
    observer: &dyn BuildObserver,
    shell: &mut Shell,
    opts: &BuildOptions,
) -> Result<BuildSummary> {
    let start = Instant::now();
    let order = build_order(ws, &opts.packages, !opts.no_deps)?;
    tracing::debug!(
        "build order: {}",
        order.iter().map(|p| p.name()).collect::<Vec<_>>().join(" -> ")
    );

    observer.event(&BuildEvent::BuildStarted {
        package_count: order.len() as u64,
    });
    shell.start_progress(order.len() as u64, "building");

    let resolver = TreeResolver::new(ws);
    let mut summary = BuildSummary::default();
    let mut failure = None;

    {
        let shell: &Shell = shell;
        for package in &order {
            let name = package.name();
            let package_start = Instant::now();
            observer.event(&BuildEvent::PackageStarted {
                package: name.to_string(),
            });

            let builder = PackageBuilder::new(package, build_ctx, &resolver, runner)
                .with_observer(observer)
                .pre_hook(|ctx| {
                    shell.status(Status::Compiling, ctx.name());
                    Ok(())
                });

            let outcome = match builder.build() {
                Ok(outcome) => outcome,
                Err(err) => {
                    failure = Some(err.context(format!("failed to build `{}`", name)));
                    break;
                }
            };

            match &outcome {
                BuildOutcome::Built => {}
                BuildOutcome::UpToDate => shell.status(Status::Fresh, name),
                BuildOutcome::Skipped { reason } => {
                    shell.status(Status::Skipped, format!("{} ({})", name, reason))
                }
            }
            observer.event(&BuildEvent::PackageFinished {
                package: name.to_string(),
                outcome: outcome.as_str().to_string(),
                duration_ms: package_start.elapsed().as_millis() as u64,
            });
            shell.tick(name);
            summary.outcomes.push((name.to_string(), outcome));
        }
    }

    shell.finish_progress();
    summary.duration = start.elapsed();
    observer.event(&BuildEvent::BuildFinished {
        success: failure.is_none(),
        duration_ms: summary.duration.as_millis() as u64,
        packages_built: summary.built() as u64,
    });

    if let Some(err) = failure {
        return Err(err);
    }

    shell.status(
        Status::Finished,
        format!(
            "{} built, {} fresh, {} skipped in {}",
            summary.built(),
            summary.up_to_date(),
            summary.skipped(),
            format_duration(summary.duration)
        ),
    );
    Ok(summary)
}

/// Remove the build products of the named packages (empty = all),
/// dependents before their dependencies.
pub fn clean(
    ws: &Workspace,
    build_ctx: &BuildContext,
    runner: &dyn CommandRunner,
    shell: &Shell,
    packages: &[String],
) -> Result<usize> {
    let mut order = build_order(ws, packages, false)?;
    order.reverse();

    let resolver = TreeResolver::new(ws);
    for package in &order {
        PackageBuilder::new(package, build_ctx, &resolver, runner)
            .clean()
            .with_context(|| format!("failed to clean `{}`", package.name()))?;
        shell.status(Status::Removed, format!("build products of {}", package.name()));
    }
    Ok(order.len())
}
