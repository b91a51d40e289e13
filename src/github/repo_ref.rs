// src/github/repo_ref.rs
// =============================================================================
// This module turns a repository URL into a RepositoryRef.
//
// Supported formats:
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git
//   - github.com/owner/repo                      (scheme is optional)
//   - https://github.com/owner/repo/tree/<branch>/<sub/path>
//
// The host is not checked, so GitHub Enterprise URLs work the same way.
// Only the path matters: the first two segments are owner and repo, and a
// `tree/<branch>/...` tail gives us a branch and an in-repo subpath.
//
// Rust concepts:
// - Result: Malformed URLs become FetchError::InvalidUrl
// - Slice patterns: Matching on the path segments
// - Option: Branch and subpath are only there for /tree/ URLs
// =============================================================================

use url::Url;

use crate::error::{FetchError, FetchResult};

// A parsed repository reference. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    /// Branch or tag taken from a `/tree/<ref>/` URL.
    pub git_ref: Option<String>,
    /// Path inside the repository after the branch, joined with '/'.
    pub subpath: Option<String>,
}

impl RepositoryRef {
    // Parses a repository URL
    //
    // Returns InvalidUrl when the URL has fewer than two path segments
    // (we need at least owner and repo).
    //
    // Example:
    //   "https://github.com/acme/widgets/tree/main/libs/core"
    //     -> owner "acme", name "widgets", git_ref "main", subpath "libs/core"
    pub fn parse(raw: &str) -> FetchResult<Self> {
        let invalid = |reason: &str| FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let url = Url::parse(&with_scheme).map_err(|e| invalid(&e.to_string()))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        if segments.len() < 2 {
            return Err(invalid("expected at least /owner/repo in the path"));
        }

        let owner = segments[0].to_string();
        let name = segments[1].trim_end_matches(".git").to_string();
        if name.is_empty() {
            return Err(invalid("repository name is empty"));
        }

        // Branch names containing '/' can't be told apart from the subpath
        // here; the first segment after `tree` is always taken as the branch.
        let (git_ref, subpath) = match segments.get(2..) {
            Some(["tree", branch, rest @ ..]) => {
                let subpath = if rest.is_empty() {
                    None
                } else {
                    Some(rest.join("/"))
                };
                (Some(branch.to_string()), subpath)
            }
            _ => (None, None),
        };

        Ok(RepositoryRef {
            owner,
            name,
            git_ref,
            subpath,
        })
    }

    // The last segment of the embedded subpath, used as the module name when
    // the caller didn't name one.
    pub fn default_module(&self) -> Option<&str> {
        self.subpath
            .as_deref()
            .and_then(|p| p.rsplit('/').next())
            .filter(|s| !s.is_empty())
    }
}
