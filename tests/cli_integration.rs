//! CLI integration tests for rbuild.
//!
//! These tests drive the binary against small package trees in temporary
//! directories.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the rbuild binary command, isolated from the caller's environment.
fn rbuild(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rbuild").unwrap();
    cmd.env_remove("ASKAP_ROOT")
        .env_remove("RBUILD_REMOTE_ARCHIVE")
        .env("HOME", root)
        .arg("--root")
        .arg(root)
        .current_dir(root);
    cmd
}

fn write_package(root: &Path, rel: &str, manifest: &str) {
    let dir = root.join(rel);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("package.toml"), manifest).unwrap();
}

/// A data package that installs `share/*` and one that depends on it.
fn data_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_package(
        root,
        "3rdParty/measures",
        r#"
[package]
name = "measures"

[build]
system = "data"
files = ["share/*"]
"#,
    );
    fs::create_dir_all(root.join("3rdParty/measures/share")).unwrap();
    fs::write(root.join("3rdParty/measures/share/leap.dat"), "37\n").unwrap();

    write_package(
        root,
        "Code/tables",
        r#"
[package]
name = "tables"
dependencies = ["measures"]

[build]
system = "data"
files = ["table.txt"]
"#,
    );
    fs::write(root.join("Code/tables/table.txt"), "rows\n").unwrap();

    tmp
}

// ============================================================================
// rbuild path / tree
// ============================================================================

#[test]
fn test_path_prints_install_prefix() {
    let tmp = data_tree();

    rbuild(tmp.path())
        .args(["path", "measures"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3rdParty/measures/install"));
}

#[test]
fn test_path_unknown_package_fails() {
    let tmp = data_tree();

    rbuild(tmp.path())
        .args(["path", "measure"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("error:"))
        .stderr(predicate::str::contains("package not found: `measure`"));
}

#[test]
fn test_tree_shows_dependencies() {
    let tmp = data_tree();

    rbuild(tmp.path())
        .args(["tree", "tables"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tables\n└── measures\n"));
}

// ============================================================================
// rbuild build
// ============================================================================

#[test]
fn test_build_installs_and_second_build_is_fresh() {
    let tmp = data_tree();
    let root = tmp.path();

    rbuild(root)
        .args(["build", "tables"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Compiling measures"))
        .stderr(predicate::str::contains("Compiling tables"))
        .stderr(predicate::str::contains("Finished"));

    assert_eq!(
        fs::read_to_string(root.join("3rdParty/measures/install/share/leap.dat")).unwrap(),
        "37\n"
    );
    assert!(root.join("Code/tables/install/table.txt").is_file());
    assert!(root.join("Code/tables/.packagesig").is_file());

    rbuild(root)
        .args(["build", "tables"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Fresh tables"))
        .stderr(predicate::str::contains("Compiling").not());
}

#[test]
fn test_install_alias_and_json_events() {
    let tmp = data_tree();

    rbuild(tmp.path())
        .args(["install", "measures", "--message-format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""reason":"build-started""#))
        .stdout(predicate::str::contains(r#""reason":"package-finished""#))
        .stdout(predicate::str::contains(r#""reason":"build-finished","success":true"#));
}

#[test]
fn test_build_from_package_directory() {
    let tmp = data_tree();
    let root = tmp.path();

    rbuild(root)
        .current_dir(root.join("3rdParty/measures"))
        .arg("build")
        .assert()
        .success();

    assert!(root.join("3rdParty/measures/install").is_dir());
    assert!(!root.join("Code/tables/install").exists());
}

#[test]
fn test_missing_dependency_fails_before_building() {
    let tmp = data_tree();
    let root = tmp.path();

    rbuild(root)
        .args(["build", "tables", "--no-deps"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error: failed to build `tables`"))
        .stderr(predicate::str::contains("not installed"));

    assert!(!root.join("Code/tables/install").exists());
}

#[test]
fn test_unknown_dependency_fails() {
    let tmp = data_tree();
    write_package(
        tmp.path(),
        "Code/orphan",
        "[package]\nname = \"orphan\"\ndependencies = [\"ghost\"]\n\n[build]\nsystem = \"data\"\nfiles = [\"*\"]\n",
    );

    rbuild(tmp.path())
        .args(["build", "orphan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown package `ghost`"));
}

#[cfg(unix)]
#[test]
fn test_scripted_steps_and_clean() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_package(
        root,
        "3rdParty/hello",
        r#"
[package]
name = "hello"

[build]
system = "autotools"
configure = []
build = ["sh", "-c", "echo hello > built.txt"]
install = ["sh", "-c", "mkdir -p \"$1/share\" && cp built.txt \"$1/share/\"", "sh", "${prefix}"]
"#,
    );

    rbuild(root).args(["build", "hello"]).assert().success();
    let installed = root.join("3rdParty/hello/install/share/built.txt");
    assert_eq!(fs::read_to_string(&installed).unwrap(), "hello\n");

    rbuild(root).args(["clean", "hello"]).assert().success();
    assert!(!root.join("3rdParty/hello/install").exists());
    assert!(!root.join("3rdParty/hello/.packagesig").exists());
}

#[cfg(unix)]
#[test]
fn test_failing_step_exits_with_error() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_package(
        root,
        "3rdParty/broken",
        r#"
[package]
name = "broken"

[build]
system = "autotools"
configure = []
build = ["sh", "-c", "echo 'no rule to make target' >&2; exit 2"]
install = ["sh", "-c", "touch never-installed"]
"#,
    );

    rbuild(root)
        .args(["build", "broken"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no rule to make target"));

    assert!(!root.join("3rdParty/broken/never-installed").exists());
    assert!(!root.join("3rdParty/broken/.packagesig").exists());
}

// ============================================================================
// rbuild completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();

    rbuild(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rbuild"));
}
