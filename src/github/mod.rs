// src/github/mod.rs
// =============================================================================
// This module handles everything that touches GitHub.
//
// Submodules:
// - repo_ref: Parsing repository URLs into owner/repo/branch/subpath
// - release: Release metadata and picking the right asset for a module
// - client: The HTTP client (release lookup, asset download, source tarball)
// - archive: Unpacking a source tarball into a scratch directory
//
// Rust concepts:
// - Modules: Organizing related functionality
// - Public API: `pub use` re-exports what the rest of the app needs
// - Traits: RepoHost is what the pipeline talks to
// =============================================================================

mod archive;   // src/github/archive.rs
mod client;    // src/github/client.rs
mod release;   // src/github/release.rs
mod repo_ref;  // src/github/repo_ref.rs

use std::path::{Path, PathBuf};

use crate::error::FetchResult;

// Re-export the pieces callers use so they can write `github::GitHubClient`
pub use archive::SourceTree;
pub use client::{ClientConfig, GitHubClient, DEFAULT_API_URL};
pub use release::{Release, ReleaseAsset};
pub use repo_ref::RepositoryRef;

// Where artifacts come from. GitHubClient is the real one; the pipeline
// tests drive a fake.
#[allow(async_fn_in_trait)]
pub trait RepoHost {
    // Latest release when `tag` is None. Ok(None) when the host has no such
    // release.
    async fn find_release(
        &self,
        repo: &RepositoryRef,
        tag: Option<&str>,
    ) -> FetchResult<Option<Release>>;

    // Downloads an asset into `output_dir`, returning the written file's path
    async fn download_asset(&self, asset: &ReleaseAsset, output_dir: &Path)
        -> FetchResult<PathBuf>;

    // Downloads and unpacks a source snapshot; `git_ref` None means HEAD
    async fn fetch_source(
        &self,
        repo: &RepositoryRef,
        git_ref: Option<&str>,
    ) -> FetchResult<SourceTree>;
}
