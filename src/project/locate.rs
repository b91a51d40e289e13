// src/project/locate.rs
// =============================================================================
// Finds the directory that implements a module inside a source tree.
//
// Two ways in:
// - an explicit subpath (from a /tree/<branch>/<subpath> URL) is used as-is
// - otherwise the whole tree is searched for a directory with that name
//
// Search order: the shallowest match wins; among matches at the same depth,
// the first in file-name order wins. That keeps `root/core` ahead of
// `root/legacy/core`, and makes the result the same on every platform.
// =============================================================================

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{FetchError, FetchResult};

pub fn locate_module(root: &Path, module: &str, subpath: Option<&str>) -> FetchResult<PathBuf> {
    let not_found = || FetchError::ModuleNotFound {
        module: module.to_string(),
        root: root.to_path_buf(),
    };

    if let Some(subpath) = subpath {
        let candidate = root.join(subpath.trim_matches('/'));
        debug!("Using explicit module path {}", candidate.display());
        return if candidate.is_dir() {
            Ok(candidate)
        } else {
            Err(not_found())
        };
    }

    let mut best: Option<(usize, PathBuf)> = None;
    for entry in WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir() && e.file_name() == module)
    {
        let shallower = best.as_ref().map_or(true, |(depth, _)| entry.depth() < *depth);
        if shallower {
            best = Some((entry.depth(), entry.into_path()));
        }
    }

    let (_, path) = best.ok_or_else(not_found)?;
    debug!("Found module '{}' at {}", module, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree(dirs: &[&str]) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        for dir in dirs {
            fs::create_dir_all(root.path().join(dir)).unwrap();
        }
        root
    }

    #[test]
    fn test_finds_nested_module() {
        let root = tree(&["libs/core/src", "apps/web"]);
        let found = locate_module(root.path(), "web", None).unwrap();
        assert_eq!(found, root.path().join("apps/web"));
    }

    #[test]
    fn test_shallowest_match_wins() {
        let root = tree(&["a/deep/core", "core"]);
        let found = locate_module(root.path(), "core", None).unwrap();
        assert_eq!(found, root.path().join("core"));
    }

    #[test]
    fn test_same_depth_ties_go_to_first_name() {
        let root = tree(&["b/core", "a/core"]);
        let found = locate_module(root.path(), "core", None).unwrap();
        assert_eq!(found, root.path().join("a/core"));
    }

    #[test]
    fn test_files_with_module_name_are_ignored() {
        let root = tree(&["docs"]);
        fs::write(root.path().join("docs/core"), "not a dir").unwrap();
        let err = locate_module(root.path(), "core", None).unwrap_err();
        assert!(matches!(err, FetchError::ModuleNotFound { .. }));
    }

    #[test]
    fn test_missing_module() {
        let root = tree(&["libs/core"]);
        let err = locate_module(root.path(), "nomatch", None).unwrap_err();
        assert!(matches!(err, FetchError::ModuleNotFound { .. }));
    }

    #[test]
    fn test_explicit_subpath_skips_search() {
        let root = tree(&["core", "libs/core"]);
        let found = locate_module(root.path(), "core", Some("libs/core")).unwrap();
        assert_eq!(found, root.path().join("libs/core"));
    }

    #[test]
    fn test_explicit_subpath_must_exist() {
        let root = tree(&["core"]);
        let err = locate_module(root.path(), "core", Some("libs/core")).unwrap_err();
        assert!(matches!(err, FetchError::ModuleNotFound { .. }));
    }
}
