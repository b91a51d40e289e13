// src/error.rs
// =============================================================================
// Error kinds for every stage of fetching a module.
//
// Each variant maps to one way a module can fail:
// - InvalidUrl: the repository URL could not be understood (aborts the run)
// - Download: talking to GitHub failed (release metadata, asset, or source)
// - Archive: the source snapshot could not be unpacked
// - ModuleNotFound: no directory in the source tree matches the module
// - Build: mvn/npm exited non-zero
// - ArtifactNotFound: the build "succeeded" but left no jar/tgz behind
// - Io: local filesystem trouble (scratch dirs, copying into the output dir)
//
// Everything except InvalidUrl only fails the current module; the main loop
// reports it and moves on.
// =============================================================================

use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("download failed for {url}: {message}")]
    Download { url: String, message: String },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("module '{module}' not found under {}", root.display())]
    ModuleNotFound { module: String, root: PathBuf },

    #[error("{tool} failed in {}: {message}", dir.display())]
    Build {
        tool: String,
        dir: PathBuf,
        message: String,
    },

    /// The tool exited 0 but the output directory has no file with the
    /// expected extension. Usually a tool/version convention mismatch.
    #[error("no *.{extension} artifact found in {}", dir.display())]
    ArtifactNotFound { extension: String, dir: PathBuf },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

// Short machine-readable name for each error kind, used in the JSON summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    Download,
    Archive,
    ModuleNotFound,
    Build,
    ArtifactNotFound,
    Io,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            FetchError::Download { .. } => ErrorKind::Download,
            FetchError::Archive(_) => ErrorKind::Archive,
            FetchError::ModuleNotFound { .. } => ErrorKind::ModuleNotFound,
            FetchError::Build { .. } => ErrorKind::Build,
            FetchError::ArtifactNotFound { .. } => ErrorKind::ArtifactNotFound,
            FetchError::Io { .. } => ErrorKind::Io,
        }
    }

    // Helper for the very common "wrap an io::Error with what we were doing"
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        FetchError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn download(url: impl Into<String>, message: impl ToString) -> Self {
        FetchError::Download {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let err = FetchError::Archive("archive is empty".to_string());
        assert_eq!(err.kind(), ErrorKind::Archive);

        let err = FetchError::ArtifactNotFound {
            extension: "jar".to_string(),
            dir: PathBuf::from("core/target"),
        };
        assert_eq!(err.kind(), ErrorKind::ArtifactNotFound);
    }

    #[test]
    fn test_build_and_artifact_errors_read_differently() {
        let build = FetchError::Build {
            tool: "mvn".to_string(),
            dir: PathBuf::from("/src"),
            message: "exit status: 1".to_string(),
        };
        let missing = FetchError::ArtifactNotFound {
            extension: "jar".to_string(),
            dir: PathBuf::from("/src/core/target"),
        };
        assert_eq!(build.to_string(), "mvn failed in /src: exit status: 1");
        assert_eq!(missing.to_string(), "no *.jar artifact found in /src/core/target");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ModuleNotFound).unwrap();
        assert_eq!(json, "\"module_not_found\"");
    }
}
