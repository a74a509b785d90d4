//! Running one package through its lifecycle.
//!
//! ```text
//! resolve deps -> signature check -> tool check -> clean -> unpack
//!   -> pre hooks -> configure -> build -> install -> post hooks -> .packagesig
//! ```
//!
//! Every step must succeed before the next one starts. The signature is
//! written only after install and the post hooks have succeeded.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};

use crate::builder::archive::{self, ArchiveSource};
use crate::builder::context::{BuildContext, PackageContext};
use crate::builder::errors::BuildError;
use crate::builder::events::{BuildEvent, BuildObserver, NoopObserver};
use crate::builder::signature::PackageSignature;
use crate::builder::step::{BuildStep, StepAction};
use crate::builder::systems::{self, BuildSystem};
use crate::core::{BuildSystemKind, MissingToolPolicy, Package, SourceLayout};
use crate::resolver::DependencyResolver;
use crate::util::fs::{
    copy_dir_all, copy_file, ensure_dir, glob_paths, remove_dir_all_if_exists,
    remove_file_if_exists, symlink,
};
use crate::util::process::captured_output;
use crate::util::CommandRunner;

/// Result of a successful [`PackageBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Every step ran and the package is installed.
    Built,
    /// The recorded signature matched; nothing ran.
    UpToDate,
    /// A required tool is missing and the package's policy is `skip`.
    Skipped { reason: String },
}

impl BuildOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildOutcome::Built => "built",
            BuildOutcome::UpToDate => "up-to-date",
            BuildOutcome::Skipped { .. } => "skipped",
        }
    }
}

/// An in-process callback run before configure or after install.
pub type Hook<'h> = Box<dyn Fn(&PackageContext<'_>) -> Result<()> + 'h>;

/// Drives one package through clean, configure, build and install.
pub struct PackageBuilder<'a> {
    package: &'a Package,
    build: &'a BuildContext,
    resolver: &'a dyn DependencyResolver,
    runner: &'a dyn CommandRunner,
    observer: &'a dyn BuildObserver,
    system: Box<dyn BuildSystem>,
    pre_hooks: Vec<Hook<'a>>,
    post_hooks: Vec<Hook<'a>>,
}

impl<'a> PackageBuilder<'a> {
    pub fn new(
        package: &'a Package,
        build: &'a BuildContext,
        resolver: &'a dyn DependencyResolver,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        PackageBuilder {
            package,
            build,
            resolver,
            runner,
            observer: &NoopObserver,
            system: systems::for_kind(package.system()),
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
        }
    }

    /// Report step timings to `observer`.
    pub fn with_observer(mut self, observer: &'a dyn BuildObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Run `hook` after the manifest's pre hooks, before configure.
    pub fn pre_hook(mut self, hook: impl Fn(&PackageContext<'_>) -> Result<()> + 'a) -> Self {
        self.pre_hooks.push(Box::new(hook));
        self
    }

    /// Run `hook` after the manifest's post hooks.
    pub fn post_hook(mut self, hook: impl Fn(&PackageContext<'_>) -> Result<()> + 'a) -> Self {
        self.post_hooks.push(Box::new(hook));
        self
    }

    pub fn kind(&self) -> BuildSystemKind {
        self.system.kind()
    }

    /// Install paths of every declared dependency, which must all be installed.
    pub fn resolve_dependencies(&self) -> Result<BTreeMap<String, PathBuf>, BuildError> {
        let mut deps = BTreeMap::new();
        for dep in self.package.dependencies() {
            let path = self
                .resolver
                .get_dep_path(dep)
                .map_err(|source| BuildError::MissingDependency {
                    package: self.package.name().to_string(),
                    dependency: dep.clone(),
                    source,
                })?;
            deps.insert(dep.clone(), path);
        }
        Ok(deps)
    }

    /// Signature the package would be recorded with if built now.
    pub fn signature(&self, ctx: &PackageContext<'_>) -> Result<PackageSignature, BuildError> {
        let dep_signatures: BTreeMap<String, String> = self
            .package
            .dependencies()
            .iter()
            .filter_map(|dep| self.resolver.signature(dep).map(|sig| (dep.clone(), sig)))
            .collect();
        PackageSignature::compute(ctx, &dep_signatures)
    }

    /// Build and install the package.
    pub fn build(&self) -> Result<BuildOutcome> {
        let name = self.package.name();

        let deps = self.resolve_dependencies()?;
        let ctx = PackageContext::new(self.package, self.build, deps)?;

        let signature = self.signature(&ctx)?;
        let recorded = PackageSignature::load(&self.package.signature_path());
        if !self.build.force
            && ctx.install_dir().is_dir()
            && signature.matches(recorded.as_ref())
        {
            tracing::debug!("`{}` is up to date ({})", name, &signature.as_str()[..12]);
            return Ok(BuildOutcome::UpToDate);
        }

        if let Err(err) = self.check_tools(&ctx) {
            let settings = self.package.build_settings();
            let policy = settings.on_missing_tool.unwrap_or(self.build.default_policy);
            if policy == MissingToolPolicy::Skip {
                tracing::warn!("skipping `{}`: {}", name, err);
                return Ok(BuildOutcome::Skipped {
                    reason: err.to_string(),
                });
            }
            return Err(err.into());
        }

        if self.build.clean && self.package.build_settings().clean {
            self.clean_with(Some(&ctx))?;
        }

        self.timed(BuildStep::Unpack, || self.unpack(&ctx))?;

        let pre = self.hook_actions(&ctx, &self.package.manifest().hooks.pre)?;
        self.timed(BuildStep::PreHook, || {
            self.run_actions(&ctx, BuildStep::PreHook, &pre)?;
            for hook in &self.pre_hooks {
                hook(&ctx).with_context(|| format!("pre-hook of `{}` failed", name))?;
            }
            Ok(())
        })?;

        for step in [BuildStep::Configure, BuildStep::Build, BuildStep::Install] {
            let actions = self.plan(&ctx, step)?;
            if actions.is_empty() {
                tracing::debug!("`{}` has no {} step", name, step);
                continue;
            }
            self.timed(step, || self.run_actions(&ctx, step, &actions))?;
        }

        let post = self.hook_actions(&ctx, &self.package.manifest().hooks.post)?;
        self.timed(BuildStep::PostHook, || {
            self.run_actions(&ctx, BuildStep::PostHook, &post)?;
            for hook in &self.post_hooks {
                hook(&ctx).with_context(|| format!("post-hook of `{}` failed", name))?;
            }
            Ok(())
        })?;

        ensure_dir(&ctx.install_dir())?;
        signature.save(&self.package.signature_path())?;
        Ok(BuildOutcome::Built)
    }

    /// Remove build products: the install dir, the signature and, for
    /// archived sources, the unpacked work dir. In-place sources also run
    /// the build system's own clean.
    pub fn clean(&self) -> Result<()> {
        // Dependencies need not be installed to clean; resolve what we can.
        let deps: BTreeMap<String, PathBuf> = self
            .package
            .dependencies()
            .iter()
            .filter_map(|dep| {
                self.resolver
                    .get_install_path(dep)
                    .ok()
                    .map(|path| (dep.clone(), path))
            })
            .collect();

        match PackageContext::new(self.package, self.build, deps) {
            Ok(ctx) => self.clean_with(Some(&ctx)),
            Err(err) => {
                tracing::warn!("skipping build system clean of `{}`: {}", self.package.name(), err);
                self.clean_with(None)
            }
        }
    }

    fn clean_with(&self, ctx: Option<&PackageContext<'_>>) -> Result<()> {
        self.timed(BuildStep::Clean, || {
            match self.package.layout() {
                SourceLayout::Archive { work_dir, .. } => remove_dir_all_if_exists(work_dir)?,
                SourceLayout::InPlace(_) => {
                    if let Some(ctx) = ctx {
                        let actions = self.system.clean(ctx)?;
                        self.run_actions(ctx, BuildStep::Clean, &actions)?;
                    }
                }
            }
            remove_dir_all_if_exists(&self.package.install_dir())?;
            remove_file_if_exists(&self.package.signature_path())
        })
    }

    fn check_tools(&self, ctx: &PackageContext<'_>) -> Result<(), BuildError> {
        let settings = self.package.build_settings();
        let all_overridden =
            settings.configure.is_some() && settings.build.is_some() && settings.install.is_some();
        if all_overridden {
            return Ok(());
        }
        self.system.check_tools(ctx)
    }

    fn unpack(&self, ctx: &PackageContext<'_>) -> Result<()> {
        let SourceLayout::Archive {
            archive,
            sha256,
            strip_prefix,
            work_dir,
        } = self.package.layout()
        else {
            return Ok(());
        };

        if work_dir.is_dir() {
            tracing::debug!("{} is already unpacked", work_dir.display());
            return Ok(());
        }

        let source = ArchiveSource {
            remote: self.build.remote_archive.as_ref(),
            cache_dir: &self.build.archive_cache,
            offline: self.build.offline,
        };
        let path = source.locate(self.package.root(), archive, sha256.as_deref())?;

        // Without a prefix to strip the archive's top-level directory is
        // expected to become the work dir.
        let dest = match strip_prefix {
            Some(_) => work_dir.as_path(),
            None => self.package.root(),
        };
        archive::extract_file_or_remove(&path, dest, strip_prefix.as_deref(), work_dir)?;

        if !work_dir.is_dir() {
            bail!(
                "unpacking {} for `{}` did not produce {}; set `work_dir` or `strip_prefix`",
                archive,
                ctx.name(),
                work_dir.display()
            );
        }
        Ok(())
    }

    /// Actions of a step, honouring manifest command overrides.
    fn plan(&self, ctx: &PackageContext<'_>, step: BuildStep) -> Result<Vec<StepAction>, BuildError> {
        let settings = self.package.build_settings();
        let overridden = match step {
            BuildStep::Configure => settings.configure.as_ref(),
            BuildStep::Build => settings.build.as_ref(),
            BuildStep::Install => settings.install.as_ref(),
            _ => None,
        };

        if let Some(argv) = overridden {
            return Ok(ctx
                .command_from_argv(argv)?
                .map(StepAction::run)
                .into_iter()
                .collect());
        }

        match step {
            BuildStep::Configure => self.system.configure(ctx),
            BuildStep::Build => self.system.build(ctx),
            BuildStep::Install => self.system.install(ctx),
            _ => Ok(Vec::new()),
        }
    }

    fn hook_actions(
        &self,
        ctx: &PackageContext<'_>,
        hooks: &[Vec<String>],
    ) -> Result<Vec<StepAction>, BuildError> {
        let mut actions = Vec::new();
        for argv in hooks {
            if let Some(cmd) = ctx.command_from_argv(argv)? {
                actions.push(StepAction::run(cmd));
            }
        }
        Ok(actions)
    }

    fn timed(&self, step: BuildStep, f: impl FnOnce() -> Result<()>) -> Result<()> {
        let start = Instant::now();
        f()?;
        self.observer.event(&BuildEvent::StepFinished {
            package: self.package.name().to_string(),
            step,
            duration_ms: start.elapsed().as_millis() as u64,
        });
        Ok(())
    }

    fn run_actions(
        &self,
        ctx: &PackageContext<'_>,
        step: BuildStep,
        actions: &[StepAction],
    ) -> Result<()> {
        for action in actions {
            tracing::debug!("[{}] {}: {}", ctx.name(), step, action.describe());
            self.execute(ctx, step, action)?;
        }
        Ok(())
    }

    fn execute(&self, ctx: &PackageContext<'_>, step: BuildStep, action: &StepAction) -> Result<()> {
        match action {
            StepAction::Run { command, optional } => {
                let shown = command.display_command();
                let output = match self.runner.run(command) {
                    Ok(output) => output,
                    Err(err) if *optional => {
                        tracing::warn!("[{}] ignoring failed {} command: {:#}", ctx.name(), step, err);
                        return Ok(());
                    }
                    Err(err) => {
                        return Err(err.context(format!("{} step of `{}` failed", step, ctx.name())))
                    }
                };

                let captured = captured_output(&output);
                if !captured.is_empty() {
                    tracing::debug!("{}", captured);
                }

                if output.status.success() {
                    return Ok(());
                }
                if *optional {
                    tracing::warn!(
                        "[{}] `{}` exited with {}; continuing",
                        ctx.name(),
                        shown,
                        output.status
                    );
                    return Ok(());
                }
                Err(BuildError::CommandFailed {
                    package: ctx.name().to_string(),
                    step,
                    command: shown,
                    code: output.status.code(),
                    output: captured,
                }
                .into())
            }

            StepAction::CopyFiles { from, patterns, to } => {
                ensure_dir(to)?;
                for pattern in patterns {
                    let matches = glob_paths(from, std::slice::from_ref(pattern))?;
                    if matches.is_empty() {
                        bail!(
                            "`{}` matched no files in {} for `{}`",
                            pattern,
                            from.display(),
                            ctx.name()
                        );
                    }
                    for path in matches {
                        let rel = path.strip_prefix(from).unwrap_or(&path);
                        let target = to.join(rel);
                        if path.is_dir() {
                            copy_dir_all(&path, &target)?;
                        } else {
                            copy_file(&path, &target)?;
                        }
                    }
                }
                Ok(())
            }

            StepAction::LinkExecutable { executable, to } => {
                if let Some(parent) = to.parent() {
                    ensure_dir(parent)?;
                }
                remove_file_if_exists(to)?;
                if let Err(err) = symlink(executable, to) {
                    tracing::debug!("symlink failed ({}), copying {}", err, executable.display());
                    copy_file(executable, to)?;
                }
                Ok(())
            }

            StepAction::RemoveDir(path) => remove_dir_all_if_exists(path),
        }
    }
}
