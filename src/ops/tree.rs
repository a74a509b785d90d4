//! `rbuild tree` and `rbuild path`.

use std::collections::HashSet;
use std::fmt::Write;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::Workspace;
use crate::resolver::{dependency_tree, DependencyResolver, TreeNode, TreeResolver};

/// Render the dependency trees of `roots` (empty = every package).
///
/// A package seen earlier in the same tree is marked `(*)` and not expanded
/// again; packages that are installed are marked `[installed]`.
pub fn render_trees(ws: &Workspace, roots: &[String], max_depth: Option<usize>) -> Result<String> {
    let names: Vec<String> = if roots.is_empty() {
        ws.names().into_iter().map(str::to_string).collect()
    } else {
        roots.to_vec()
    };

    let mut out = String::new();
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let node = dependency_tree(ws, name, max_depth)?;
        let mut seen = HashSet::new();
        render_node(&node, "", true, true, &mut seen, &mut out);
    }
    Ok(out)
}

fn render_node(
    node: &TreeNode,
    indent: &str,
    is_root: bool,
    is_last: bool,
    seen: &mut HashSet<String>,
    out: &mut String,
) {
    let duplicate = !seen.insert(node.name.clone());
    let branch = match (is_root, is_last) {
        (true, _) => "",
        (false, true) => "└── ",
        (false, false) => "├── ",
    };
    let status = if node.installed { " [installed]" } else { "" };
    let marker = if duplicate && !node.children.is_empty() {
        " (*)"
    } else {
        ""
    };
    let _ = writeln!(out, "{}{}{}{}{}", indent, branch, node.name, status, marker);

    if duplicate {
        return;
    }

    let child_indent = match (is_root, is_last) {
        (true, _) => String::new(),
        (false, true) => format!("{}    ", indent),
        (false, false) => format!("{}│   ", indent),
    };
    for (i, child) in node.children.iter().enumerate() {
        let last = i + 1 == node.children.len();
        render_node(child, &child_indent, false, last, seen, out);
    }
}

/// Install prefix of `name`, whether or not it is built.
pub fn install_path(ws: &Workspace, name: &str) -> Result<PathBuf> {
    Ok(TreeResolver::new(ws).get_install_path(name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::{manifest, write_package};
    use tempfile::TempDir;

    fn diamond(tmp: &TempDir) -> Workspace {
        let root = tmp.path();
        write_package(root, "3rdParty/zlib", &manifest("zlib", "autotools", &[], ""));
        write_package(root, "3rdParty/cfitsio", &manifest("cfitsio", "autotools", &["zlib"], ""));
        write_package(root, "3rdParty/hdf5", &manifest("hdf5", "cmake", &["zlib"], ""));
        write_package(
            root,
            "Code/askap",
            &manifest("askap", "scons", &["cfitsio", "hdf5"], ""),
        );
        Workspace::discover(root).unwrap()
    }

    #[test]
    fn test_render_tree() {
        let tmp = TempDir::new().unwrap();
        let ws = diamond(&tmp);

        let rendered = render_trees(&ws, &["askap".to_string()], None).unwrap();
        assert_eq!(
            rendered,
            "askap\n\
             ├── cfitsio\n\
             │   └── zlib\n\
             └── hdf5\n\
             \x20   └── zlib\n"
        );
    }

    #[test]
    fn test_render_tree_depth_and_installed() {
        let tmp = TempDir::new().unwrap();
        let ws = diamond(&tmp);
        let cfitsio = ws.get("cfitsio").unwrap();
        std::fs::create_dir_all(cfitsio.install_dir()).unwrap();
        std::fs::write(cfitsio.signature_path(), "abc\n").unwrap();

        let rendered = render_trees(&ws, &["askap".to_string()], Some(1)).unwrap();
        assert_eq!(rendered, "askap\n├── cfitsio [installed]\n└── hdf5\n");
    }

    #[test]
    fn test_install_path() {
        let tmp = TempDir::new().unwrap();
        let ws = diamond(&tmp);

        assert_eq!(
            install_path(&ws, "hdf5").unwrap(),
            tmp.path().join("3rdParty/hdf5/install")
        );
        let err = install_path(&ws, "hdf").unwrap_err();
        assert!(err.to_string().contains("hdf"));
    }
}
