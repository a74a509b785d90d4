//! Build ordering over the package dependency graph.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::{Package, Workspace};
use crate::resolver::errors::{suggest, ResolveError};

/// Packages to build for `roots`, dependencies before dependents.
///
/// With `include_deps` the transitive closure of `roots` is returned;
/// otherwise only the roots themselves, still in dependency order. An empty
/// `roots` selects every package in the workspace.
pub fn build_order<'a>(
    ws: &'a Workspace,
    roots: &[String],
    include_deps: bool,
) -> Result<Vec<&'a Package>, ResolveError> {
    let mut root_names: Vec<&'a str> = Vec::new();
    if roots.is_empty() {
        root_names = ws.names();
    } else {
        for root in roots {
            let package = ws.get(root).ok_or_else(|| ResolveError::PackageNotFound {
                package: root.clone(),
                suggestions: suggest(root, ws.names()),
            })?;
            root_names.push(package.name());
        }
    }

    let selected: BTreeSet<&'a str> = if include_deps {
        closure(ws, &root_names)?
    } else {
        root_names.iter().copied().collect()
    };

    let mut graph: DiGraph<&'a str, ()> = DiGraph::new();
    let mut nodes: HashMap<&'a str, NodeIndex> = HashMap::new();
    for &name in &selected {
        nodes.insert(name, graph.add_node(name));
    }
    for &name in &selected {
        let package = ws.get(name).ok_or_else(|| ResolveError::PackageNotFound {
            package: name.to_string(),
            suggestions: Vec::new(),
        })?;
        for dep in package.dependencies() {
            if let Some(&dep_idx) = nodes.get(dep.as_str()) {
                graph.add_edge(dep_idx, nodes[&name], ());
            }
        }
    }

    let sorted = toposort(&graph, None).map_err(|_| ResolveError::CycleDetected {
        packages: find_cycle(&graph),
    })?;

    Ok(sorted
        .into_iter()
        .filter_map(|idx| ws.get(graph[idx]))
        .collect())
}

fn closure<'a>(ws: &'a Workspace, roots: &[&'a str]) -> Result<BTreeSet<&'a str>, ResolveError> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<&'a str> = roots.to_vec();

    while let Some(name) = stack.pop() {
        if !seen.insert(name) {
            continue;
        }
        let package = ws
            .get(name)
            .ok_or_else(|| ResolveError::PackageNotFound {
                package: name.to_string(),
                suggestions: suggest(name, ws.names()),
            })?;
        for dep in package.dependencies() {
            let dep_pkg = ws.get(dep).ok_or_else(|| ResolveError::UnknownDependency {
                package: name.to_string(),
                dependency: dep.clone(),
            })?;
            stack.push(dep_pkg.name());
        }
    }

    Ok(seen)
}

fn find_cycle(graph: &DiGraph<&str, ()>) -> Vec<String> {
    kosaraju_scc(graph)
        .into_iter()
        .find(|scc| scc.len() > 1)
        .map(|scc| {
            let mut names: Vec<String> = scc.iter().map(|&i| graph[i].to_string()).collect();
            names.sort();
            if let Some(first) = names.first().cloned() {
                names.push(first);
            }
            names
        })
        .unwrap_or_default()
}

/// A node of the rendered dependency tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub installed: bool,
    pub children: Vec<TreeNode>,
}

/// Dependency tree rooted at `name`, down to `max_depth` levels.
pub fn dependency_tree(
    ws: &Workspace,
    name: &str,
    max_depth: Option<usize>,
) -> Result<TreeNode, ResolveError> {
    // Validates the graph, including cycles, before rendering.
    build_order(ws, &[name.to_string()], true)?;
    Ok(tree_node(ws, name, 0, max_depth))
}

fn tree_node(ws: &Workspace, name: &str, depth: usize, max_depth: Option<usize>) -> TreeNode {
    let package = ws.get(name);
    let children = match (package, max_depth) {
        (Some(_), Some(max)) if depth >= max => Vec::new(),
        (Some(package), _) => package
            .dependencies()
            .iter()
            .map(|dep| tree_node(ws, dep, depth + 1, max_depth))
            .collect(),
        (None, _) => Vec::new(),
    };

    TreeNode {
        name: name.to_string(),
        installed: package.is_some_and(Package::is_installed),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::core::Manifest;

    fn package(name: &str, deps: &[&str]) -> Package {
        let deps = deps
            .iter()
            .map(|d| format!("\"{}\"", d))
            .collect::<Vec<_>>()
            .join(", ");
        let contents = format!(
            "[package]\nname = \"{}\"\ndependencies = [{}]\n[build]\nsystem = \"autotools\"\n",
            name, deps
        );
        let path = PathBuf::from(format!("/tree/{}/package.toml", name));
        Package::new(Manifest::parse(&contents, &path).unwrap())
    }

    fn ws(packages: Vec<Package>) -> Workspace {
        Workspace::from_packages(PathBuf::from("/tree"), packages).unwrap()
    }

    fn names(order: &[&Package]) -> Vec<String> {
        order.iter().map(|p| p.name().to_string()).collect()
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_dependencies_come_first() {
        let ws = ws(vec![
            package("casacore", &["fftw", "cfitsio", "wcslib"]),
            package("wcslib", &["cfitsio"]),
            package("cfitsio", &[]),
            package("fftw", &[]),
            package("unrelated", &[]),
        ]);

        let order = names(&build_order(&ws, &["casacore".to_string()], true).unwrap());
        assert_eq!(order.len(), 4);
        assert!(position(&order, "cfitsio") < position(&order, "wcslib"));
        assert!(position(&order, "wcslib") < position(&order, "casacore"));
        assert!(position(&order, "fftw") < position(&order, "casacore"));
        assert!(!order.contains(&"unrelated".to_string()));
    }

    #[test]
    fn test_without_deps_only_roots() {
        let ws = ws(vec![package("a", &["b"]), package("b", &[])]);
        let order = names(&build_order(&ws, &["a".to_string()], false).unwrap());
        assert_eq!(order, vec!["a"]);
    }

    #[test]
    fn test_empty_roots_select_everything() {
        let ws = ws(vec![package("a", &["b"]), package("b", &[]), package("c", &[])]);
        let order = names(&build_order(&ws, &[], true).unwrap());
        assert_eq!(order.len(), 3);
        assert!(position(&order, "b") < position(&order, "a"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let ws = ws(vec![package("a", &["b"]), package("b", &["a"])]);
        match build_order(&ws, &["a".to_string()], true).unwrap_err() {
            ResolveError::CycleDetected { packages } => {
                assert_eq!(packages, vec!["a", "b", "a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_dependency_is_reported() {
        let ws = ws(vec![package("a", &["missing"])]);
        let err = build_order(&ws, &["a".to_string()], true).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownDependency { .. }));
    }

    #[test]
    fn test_dependency_tree_depth() {
        let ws = ws(vec![package("a", &["b"]), package("b", &["c"]), package("c", &[])]);
        let tree = dependency_tree(&ws, "a", Some(1)).unwrap();
        assert_eq!(tree.name, "a");
        assert_eq!(tree.children.len(), 1);
        assert!(tree.children[0].children.is_empty());
        assert!(!tree.installed);

        let full = dependency_tree(&ws, "a", None).unwrap();
        assert_eq!(full.children[0].children[0].name, "c");
    }
}
