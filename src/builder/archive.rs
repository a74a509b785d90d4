//! Source archives: locating, downloading, verifying and extracting.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use tar::Archive;
use url::Url;

use crate::util::fs::remove_dir_all_if_exists;
use crate::util::hash::{sha256_bytes, sha256_file};

/// Compression of an archive, from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Tar,
}

impl ArchiveFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar") {
            Some(ArchiveFormat::Tar)
        } else {
            None
        }
    }
}

/// Where archives are looked up and downloaded to.
#[derive(Debug, Clone)]
pub struct ArchiveSource<'a> {
    /// Base URL archives are downloaded from
    pub remote: Option<&'a Url>,
    /// Directory downloads are cached in
    pub cache_dir: &'a Path,
    /// Never download
    pub offline: bool,
}

impl ArchiveSource<'_> {
    /// Local path of `archive`, downloading it if it is not present.
    ///
    /// The package directory is searched first, then the download cache.
    pub fn locate(&self, package_dir: &Path, archive: &str, sha256: Option<&str>) -> Result<PathBuf> {
        let local = package_dir.join(archive);
        if local.is_file() {
            verify(&local, sha256)?;
            return Ok(local);
        }

        let file_name = archive.rsplit('/').next().unwrap_or(archive);
        let cached = self.cache_dir.join(file_name);
        if cached.is_file() {
            verify(&cached, sha256)?;
            return Ok(cached);
        }

        let Some(remote) = self.remote else {
            bail!(
                "archive `{}` not found in {} and no remote archive is configured (set {})",
                archive,
                package_dir.display(),
                crate::util::config::REMOTE_ARCHIVE_ENV
            );
        };
        if self.offline {
            bail!("archive `{}` is not cached and downloads are disabled (offline)", archive);
        }

        let url = remote
            .join(archive)
            .with_context(|| format!("invalid archive name `{}`", archive))?;
        let data = download(&url)?;
        if let Some(expected) = sha256 {
            check_hash(&url.to_string(), expected, &sha256_bytes(&data))?;
        }

        std::fs::create_dir_all(self.cache_dir)
            .with_context(|| format!("failed to create directory: {}", self.cache_dir.display()))?;
        std::fs::write(&cached, &data)
            .with_context(|| format!("failed to write {}", cached.display()))?;
        Ok(cached)
    }
}

/// Download a file into memory.
pub fn download(url: &Url) -> Result<Vec<u8>> {
    tracing::info!("downloading {}", url);

    let response = reqwest::blocking::get(url.clone())
        .with_context(|| format!("failed to download {}", url))?;

    if !response.status().is_success() {
        bail!("failed to download {}: HTTP {}", url, response.status());
    }

    let bytes = response
        .bytes()
        .with_context(|| format!("failed to read response body from {}", url))?;
    Ok(bytes.to_vec())
}

fn verify(path: &Path, sha256: Option<&str>) -> Result<()> {
    if let Some(expected) = sha256 {
        check_hash(&path.display().to_string(), expected, &sha256_file(path)?)?;
    }
    Ok(())
}

fn check_hash(what: &str, expected: &str, actual: &str) -> Result<()> {
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        bail!(
            "archive hash mismatch for {}:\n  expected: {}\n  actual:   {}",
            what,
            expected,
            actual
        );
    }
    tracing::debug!("archive hash verified: {}", &actual[..16.min(actual.len())]);
    Ok(())
}

/// Extract an archive file into `dest`.
pub fn extract_file(archive: &Path, dest: &Path, strip_prefix: Option<&str>) -> Result<()> {
    let name = archive.to_string_lossy();
    let format = ArchiveFormat::from_name(&name)
        .with_context(|| format!("unsupported archive format: {}", archive.display()))?;

    let file = File::open(archive)
        .with_context(|| format!("failed to open archive: {}", archive.display()))?;
    let reader = BufReader::new(file);

    let extracted = match format {
        ArchiveFormat::TarGz => extract(GzDecoder::new(reader), dest, strip_prefix),
        ArchiveFormat::Tar => extract(reader, dest, strip_prefix),
    };
    extracted.with_context(|| format!("failed to extract {}", archive.display()))
}

/// Extract like [`extract_file`], removing `produced` again on failure.
///
/// `produced` is the directory whose presence later runs take to mean the
/// archive is fully unpacked.
pub fn extract_file_or_remove(
    archive: &Path,
    dest: &Path,
    strip_prefix: Option<&str>,
    produced: &Path,
) -> Result<()> {
    let err = match extract_file(archive, dest, strip_prefix) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    if let Err(cleanup) = remove_dir_all_if_exists(produced) {
        tracing::warn!("failed to remove partial unpack {}: {:#}", produced.display(), cleanup);
    }
    Err(err)
}

/// Extract a tar stream into `dest`, optionally stripping a leading directory.
pub fn extract<R: Read>(reader: R, dest: &Path, strip_prefix: Option<&str>) -> Result<()> {
    let mut archive = Archive::new(reader);

    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create destination directory: {}", dest.display()))?;

    for entry in archive.entries().context("failed to read archive entries")? {
        let mut entry = entry.context("failed to read archive entry")?;
        let entry_path = entry.path().context("failed to get entry path")?.into_owned();
        let entry_str = entry_path.to_string_lossy().replace('\\', "/");

        let relative = match strip_prefix {
            Some(prefix) => {
                let prefix = prefix.trim_end_matches('/');
                match entry_str.strip_prefix(prefix) {
                    Some("") | Some("/") => continue,
                    Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/').to_string(),
                    _ => entry_str.clone(),
                }
            }
            None => entry_str.clone(),
        };

        if relative.is_empty() || relative == "." || relative == "./" {
            continue;
        }

        if Path::new(&relative)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir | std::path::Component::RootDir))
        {
            bail!("archive entry escapes destination directory: {}", entry_str);
        }

        let output_path = dest.join(&relative);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        match entry.header().entry_type() {
            tar::EntryType::Directory => {
                std::fs::create_dir_all(&output_path).with_context(|| {
                    format!("failed to create directory: {}", output_path.display())
                })?;
            }
            tar::EntryType::Regular
            | tar::EntryType::Continuous
            | tar::EntryType::Link
            | tar::EntryType::Symlink => {
                entry.unpack(&output_path).with_context(|| {
                    format!("failed to extract file: {}", output_path.display())
                })?;
            }
            other => {
                tracing::debug!("skipping archive entry {} ({:?})", entry_str, other);
            }
        }
    }

    Ok(())
}
