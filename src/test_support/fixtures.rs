//! Test fixtures for package trees.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{Manifest, Package};

/// A package parsed from `manifest` as if it lived in `dir`, without touching disk.
pub fn package_at(dir: &Path, manifest: &str) -> Package {
    Package::new(Manifest::parse(manifest, &dir.join("package.toml")).unwrap())
}

/// Write `manifest` to `<root>/<rel>/package.toml` and load it.
pub fn write_package(root: &Path, rel: &str, manifest: &str) -> Package {
    let dir = root.join(rel);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("package.toml"), manifest).unwrap();
    Package::load(&dir).unwrap()
}

/// Minimal manifest for `name` using `system`, plus any extra lines.
pub fn manifest(name: &str, system: &str, deps: &[&str], extra: &str) -> String {
    let deps = deps
        .iter()
        .map(|d| format!("\"{}\"", d))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "[package]\nname = \"{name}\"\ndependencies = [{deps}]\n\n[build]\nsystem = \"{system}\"\n{extra}"
    )
}

/// Write an executable shell script, for tool lookup tests.
pub fn write_tool(dir: &Path, name: &str, script: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}

/// A gzipped tarball holding `entries` (path, contents).
pub fn tarball(entries: &[(&str, &str)]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// A gzipped tarball of `top/` cut off half way through its data.
pub fn truncated_tarball(top: &str) -> Vec<u8> {
    let table: String = (0..20_000u32)
        .map(|i| format!("{} {}\n", i, i.wrapping_mul(2_654_435_761)))
        .collect();
    let configure = format!("{}/configure", top);
    let data = format!("{}/share/table.txt", top);
    let mut bytes = tarball(&[
        (configure.as_str(), "#!/bin/sh\n"),
        (data.as_str(), table.as_str()),
    ]);
    bytes.truncate(bytes.len() / 2);
    bytes
}

/// Descriptions of a list of step actions.
pub fn described(actions: &[crate::builder::step::StepAction]) -> Vec<String> {
    actions.iter().map(|a| a.describe()).collect()
}
