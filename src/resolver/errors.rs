//! Resolution error types.

use std::path::PathBuf;

use thiserror::Error;

/// Error while resolving a dependency path or a build order.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("package not found: `{package}`{}", format_suggestions(suggestions))]
    PackageNotFound {
        package: String,
        suggestions: Vec<String>,
    },

    #[error("dependency `{package}` is not installed (expected `{}`); build it first", path.display())]
    NotInstalled { package: String, path: PathBuf },

    #[error("`{package}` depends on unknown package `{dependency}`")]
    UnknownDependency { package: String, dependency: String },

    #[error("cycle detected in dependency graph: {}", packages.join(" -> "))]
    CycleDetected { packages: Vec<String> },
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean {}?)", suggestions.join(", "))
    }
}

/// Names in `candidates` that look like `wanted`.
pub fn suggest<'a>(wanted: &str, candidates: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let wanted = wanted.to_lowercase();
    candidates
        .into_iter()
        .filter(|c| {
            let c = c.to_lowercase();
            c.contains(&wanted) || wanted.contains(&c)
        })
        .take(3)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_lists_suggestions() {
        let err = ResolveError::PackageNotFound {
            package: "fftw".to_string(),
            suggestions: suggest("fftw", ["fftw3", "zlib", "libfftw"]),
        };
        assert_eq!(
            err.to_string(),
            "package not found: `fftw` (did you mean fftw3, libfftw?)"
        );
    }

    #[test]
    fn test_cycle_message() {
        let err = ResolveError::CycleDetected {
            packages: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "cycle detected in dependency graph: a -> b -> a"
        );
    }
}
