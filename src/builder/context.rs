//! Build contexts.
//!
//! [`BuildContext`] holds the settings of one `rbuild` invocation;
//! [`PackageContext`] is derived from it for a single package once its
//! dependencies are resolved. Every command a build system produces is
//! created through [`PackageContext::command`], which pins its working
//! directory and environment.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use url::Url;

use crate::builder::errors::BuildError;
use crate::core::{MissingToolPolicy, Package, Platform};
use crate::util::{Config, GlobalContext, ProcessBuilder};

/// Invocation-wide build settings.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Root of the package tree
    pub root: PathBuf,

    /// Job count handed to parallel-capable tools
    pub jobs: usize,

    /// Force serial builds for every package
    pub serial: bool,

    /// Run the implicit clean before building
    pub clean: bool,

    /// Rebuild even when the signature is unchanged
    pub force: bool,

    pub platform: Platform,

    /// Base URL archives are downloaded from
    pub remote_archive: Option<Url>,

    /// Never download
    pub offline: bool,

    /// Where downloaded archives are kept
    pub archive_cache: PathBuf,

    /// Policy for packages that do not set `on_missing_tool`
    pub default_policy: MissingToolPolicy,

    /// `JAVA_HOME`, consulted by Ant builds
    pub java_home: Option<PathBuf>,

    /// Search path for build tools, `PATH` when unset
    pub search_path: Option<OsString>,
}

impl BuildContext {
    /// Defaults for a tree rooted at `root`, with nothing read from the environment.
    pub fn new(root: PathBuf) -> Self {
        let archive_cache = root.join(crate::util::context::STATE_DIR).join("archives");
        BuildContext {
            root,
            jobs: 1,
            serial: false,
            clean: true,
            force: false,
            platform: Platform {
                os: std::env::consts::OS,
                arch: std::env::consts::ARCH,
                cray_version: None,
            },
            remote_archive: None,
            offline: false,
            archive_cache,
            default_policy: MissingToolPolicy::Fail,
            java_home: None,
            search_path: None,
        }
    }

    /// Settings for this invocation from the global context and merged config.
    pub fn from_config(gctx: &GlobalContext, config: &Config) -> anyhow::Result<Self> {
        let remote_archive = match &config.net.remote_archive {
            Some(raw) => Some(parse_base_url(raw)?),
            None => None,
        };

        Ok(BuildContext {
            root: gctx.root().to_path_buf(),
            jobs: config.jobs(),
            serial: config.build.serial(),
            clean: !config.build.no_clean(),
            force: false,
            platform: Platform::detect(),
            remote_archive,
            offline: config.net.offline(),
            archive_cache: gctx.archive_cache_dir(),
            default_policy: config.policy.on_missing_tool.unwrap_or_default(),
            java_home: std::env::var_os("JAVA_HOME")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            search_path: None,
        })
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_remote_archive(mut self, url: Option<Url>) -> Self {
        self.remote_archive = url;
        self
    }

    pub fn with_default_policy(mut self, policy: MissingToolPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn with_java_home(mut self, java_home: Option<PathBuf>) -> Self {
        self.java_home = java_home;
        self
    }

    pub fn with_search_path(mut self, path: Option<OsString>) -> Self {
        self.search_path = path;
        self
    }

    /// The tool search path in effect.
    pub fn search_path(&self) -> Option<OsString> {
        self.search_path.clone().or_else(|| std::env::var_os("PATH"))
    }
}

/// Parse a base URL, making sure relative joins append to its path.
pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash).map_err(|e| anyhow::anyhow!("invalid remote archive URL `{}`: {}", raw, e))
}

/// Everything a build system needs to produce commands for one package.
#[derive(Debug, Clone)]
pub struct PackageContext<'a> {
    pub package: &'a Package,
    pub build: &'a BuildContext,

    /// Resolved dependency install prefixes, by name
    pub deps: BTreeMap<String, PathBuf>,

    /// Environment every command of the package runs with
    pub env: BTreeMap<String, String>,
}

impl<'a> PackageContext<'a> {
    /// Assemble the context; `deps` must hold every declared dependency.
    pub fn new(
        package: &'a Package,
        build: &'a BuildContext,
        deps: BTreeMap<String, PathBuf>,
    ) -> Result<Self, BuildError> {
        let mut ctx = PackageContext {
            package,
            build,
            deps,
            env: BTreeMap::new(),
        };
        ctx.env = ctx.compose_env()?;
        Ok(ctx)
    }

    pub fn name(&self) -> &str {
        self.package.name()
    }

    pub fn install_dir(&self) -> PathBuf {
        self.package.install_dir()
    }

    pub fn work_dir(&self) -> &Path {
        self.package.work_dir()
    }

    /// Job count for this package, `None` when it must build serially.
    pub fn jobs(&self) -> Option<usize> {
        if self.build.serial || !self.package.build_settings().parallel || self.build.jobs <= 1 {
            None
        } else {
            Some(self.build.jobs)
        }
    }

    /// Locate a tool on the package's search path, dependency `bin/` dirs first.
    pub fn find_tool(&self, name: &str) -> Option<PathBuf> {
        let path = self
            .env
            .get("PATH")
            .map(OsString::from)
            .or_else(|| self.build.search_path())?;
        which::which_in(name, Some(path), self.work_dir()).ok()
    }

    /// A command running in the work dir with the package environment.
    pub fn command(&self, program: impl AsRef<Path>) -> ProcessBuilder {
        ProcessBuilder::new(program)
            .cwd(self.work_dir())
            .envs(&self.env)
    }

    /// A command from an argv list, placeholders expanded.
    pub fn command_from_argv(&self, argv: &[String]) -> Result<Option<ProcessBuilder>, BuildError> {
        let argv = self.expand_all(argv)?;
        Ok(ProcessBuilder::from_argv(&argv)
            .map(|cmd| cmd.cwd(self.work_dir()).envs(&self.env)))
    }

    /// Expand `${prefix}`, `${source}`, `${root}` and `${dep:NAME}`.
    ///
    /// `$$` yields a literal `$`; a `$` not followed by `{` is kept as is.
    pub fn expand(&self, input: &str) -> Result<String, BuildError> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                out.push('$');
                rest = tail;
                continue;
            }

            let Some(body) = after.strip_prefix('{') else {
                out.push('$');
                rest = after;
                continue;
            };
            let Some(end) = body.find('}') else {
                out.push('$');
                rest = after;
                continue;
            };

            let key = &body[..end];
            out.push_str(&self.lookup(key)?);
            rest = &body[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Expand every element of a list.
    pub fn expand_all(&self, items: &[String]) -> Result<Vec<String>, BuildError> {
        items.iter().map(|s| self.expand(s)).collect()
    }

    fn lookup(&self, key: &str) -> Result<String, BuildError> {
        let path = match key {
            "prefix" => self.install_dir(),
            "source" => self.work_dir().to_path_buf(),
            "root" => self.build.root.clone(),
            _ => match key.strip_prefix("dep:") {
                Some(dep) => self.deps.get(dep).cloned().ok_or_else(|| {
                    BuildError::UndeclaredDependency {
                        package: self.name().to_string(),
                        dependency: dep.to_string(),
                    }
                })?,
                None => {
                    return Err(BuildError::UnknownPlaceholder {
                        package: self.name().to_string(),
                        placeholder: key.to_string(),
                    })
                }
            },
        };
        Ok(path.display().to_string())
    }

    fn compose_env(&self) -> Result<BTreeMap<String, String>, BuildError> {
        let mut env = self.build.platform.compiler_env();

        let mut bin_dirs = Vec::new();
        let mut cppflags = Vec::new();
        let mut ldflags = Vec::new();
        for dep_path in self.deps.values() {
            let bin = dep_path.join("bin");
            if bin.is_dir() {
                bin_dirs.push(bin);
            }
            let include = dep_path.join("include");
            if include.is_dir() {
                cppflags.push(format!("-I{}", include.display()));
            }
            let lib = dep_path.join("lib");
            if lib.is_dir() {
                ldflags.push(format!("-L{}", lib.display()));
            }
        }

        if !bin_dirs.is_empty() {
            let current: Vec<PathBuf> = self
                .build
                .search_path()
                .map(|p| std::env::split_paths(&p).collect())
                .unwrap_or_default();
            let joined: OsString = std::env::join_paths(bin_dirs.into_iter().chain(current))
                .unwrap_or_default();
            env.insert("PATH".to_string(), joined.to_string_lossy().into_owned());
        }
        if !cppflags.is_empty() {
            env.insert("CPPFLAGS".to_string(), cppflags.join(" "));
        }
        if !ldflags.is_empty() {
            env.insert("LDFLAGS".to_string(), ldflags.join(" "));
        }

        let settings = self.package.build_settings();
        for (key, value) in &settings.env {
            let value = self.expand(value)?;
            match env.get_mut(key) {
                Some(existing) if matches!(key.as_str(), "CPPFLAGS" | "LDFLAGS" | "PATH") => {
                    let sep = if key == "PATH" { ":" } else { " " };
                    *existing = format!("{}{}{}", value, sep, existing);
                }
                _ => {
                    env.insert(key.clone(), value);
                }
            }
        }

        if settings.no_warnings {
            for key in ["CFLAGS", "CXXFLAGS", "FFLAGS"] {
                let value = env
                    .get(key)
                    .map(|v| format!("{} -w", v))
                    .unwrap_or_else(|| "-w".to_string());
                env.insert(key.to_string(), value);
            }
        }

        Ok(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Manifest;
    use std::fs;
    use tempfile::TempDir;

    fn package(root: &Path, extra_build: &str) -> Package {
        let contents = format!(
            "[package]\nname = \"fftw\"\ndependencies = [\"zlib\"]\n[build]\nsystem = \"autotools\"\n{}",
            extra_build
        );
        Package::new(Manifest::parse(&contents, &root.join("fftw/package.toml")).unwrap())
    }

    #[test]
    fn test_expand_placeholders() {
        let tmp = TempDir::new().unwrap();
        let pkg = package(tmp.path(), "");
        let build = BuildContext::new(tmp.path().to_path_buf());
        let deps = BTreeMap::from([("zlib".to_string(), PathBuf::from("/opt/zlib/install"))]);
        let ctx = PackageContext::new(&pkg, &build, deps).unwrap();

        assert_eq!(
            ctx.expand("--with-zlib=${dep:zlib}").unwrap(),
            "--with-zlib=/opt/zlib/install"
        );
        assert_eq!(
            ctx.expand("--prefix=${prefix}").unwrap(),
            format!("--prefix={}", tmp.path().join("fftw/install").display())
        );
        assert_eq!(ctx.expand("cost $$5 and $HOME").unwrap(), "cost $5 and $HOME");
        assert_eq!(ctx.expand("unterminated ${prefix").unwrap(), "unterminated ${prefix");
    }

    #[test]
    fn test_expand_rejects_undeclared_and_unknown() {
        let tmp = TempDir::new().unwrap();
        let pkg = package(tmp.path(), "");
        let build = BuildContext::new(tmp.path().to_path_buf());
        let deps = BTreeMap::from([("zlib".to_string(), PathBuf::from("/opt/zlib"))]);
        let ctx = PackageContext::new(&pkg, &build, deps).unwrap();

        assert!(matches!(
            ctx.expand("${dep:blas}").unwrap_err(),
            BuildError::UndeclaredDependency { .. }
        ));
        assert!(matches!(
            ctx.expand("${home}").unwrap_err(),
            BuildError::UnknownPlaceholder { .. }
        ));
    }

    #[test]
    fn test_environment_composition() {
        let tmp = TempDir::new().unwrap();
        let zlib = tmp.path().join("zlib/install");
        fs::create_dir_all(zlib.join("include")).unwrap();
        fs::create_dir_all(zlib.join("lib")).unwrap();
        fs::create_dir_all(zlib.join("bin")).unwrap();

        let pkg = package(
            tmp.path(),
            "no_warnings = true\n[build.env]\nCFLAGS = \"-O2\"\nZLIB_ROOT = \"${dep:zlib}\"\n",
        );
        let build = BuildContext::new(tmp.path().to_path_buf()).with_platform(Platform {
            os: "linux",
            arch: "x86_64",
            cray_version: Some("6".to_string()),
        });
        let deps = BTreeMap::from([("zlib".to_string(), zlib.clone())]);
        let ctx = PackageContext::new(&pkg, &build, deps).unwrap();

        assert_eq!(ctx.env["CC"], "cc");
        assert_eq!(ctx.env["CFLAGS"], "-O2 -w");
        assert_eq!(ctx.env["CXXFLAGS"], "-w");
        assert_eq!(ctx.env["CPPFLAGS"], format!("-I{}", zlib.join("include").display()));
        assert_eq!(ctx.env["LDFLAGS"], format!("-L{}", zlib.join("lib").display()));
        assert_eq!(ctx.env["ZLIB_ROOT"], zlib.display().to_string());
        assert!(ctx.env["PATH"].starts_with(&zlib.join("bin").display().to_string()));

        let cmd = ctx.command("make");
        assert_eq!(cmd.get_cwd(), Some(ctx.work_dir()));
        assert_eq!(cmd.get_env().get("CC").map(String::as_str), Some("cc"));
    }

    #[test]
    fn test_jobs_respect_parallel_toggle() {
        let tmp = TempDir::new().unwrap();
        let build = BuildContext::new(tmp.path().to_path_buf()).with_jobs(8);
        let deps = BTreeMap::from([("zlib".to_string(), PathBuf::from("/opt/zlib"))]);

        let parallel = package(tmp.path(), "");
        let ctx = PackageContext::new(&parallel, &build, deps.clone()).unwrap();
        assert_eq!(ctx.jobs(), Some(8));

        let serial = package(tmp.path(), "parallel = false\n");
        let ctx = PackageContext::new(&serial, &build, deps).unwrap();
        assert_eq!(ctx.jobs(), None);
    }

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("https://archive.example.org/tarballs").unwrap();
        assert_eq!(
            url.join("zlib.tar.gz").unwrap().as_str(),
            "https://archive.example.org/tarballs/zlib.tar.gz"
        );
        assert!(parse_base_url("not a url").is_err());
    }
}
