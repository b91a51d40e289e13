// src/pipeline.rs
// =============================================================================
// Resolves one requested module into an artifact on disk.
//
// Fast path:  look up the release, pick a matching asset, download it.
// Slow path:  download the source tarball, find the module directory,
//             detect mvn vs npm, read the version, build, copy the output.
//
// Any error ends the current module only. It is turned into a
// ModuleOutcome::Failed so main can report it and carry on with the next
// module in the list.
//
// Rust concepts:
// - Generics with trait bounds: Pipeline<H: RepoHost, T: Toolchain>
// - Lifetimes: the pipeline borrows everything it needs from main
// - #[serde(tag = "outcome")]: each enum variant becomes a tagged JSON object
// =============================================================================

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::build::{build_module, BuildOutcome, Toolchain};
use crate::error::{ErrorKind, FetchResult};
use crate::github::{RepoHost, RepositoryRef};
use crate::project::{locate_module, resolve_version, ProjectType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ModuleOutcome {
    /// Pre-built release asset downloaded
    Downloaded { path: PathBuf },
    /// Built from source and copied into the output directory
    Built {
        path: PathBuf,
        version: String,
        project_type: ProjectType,
    },
    /// Nothing to build (project type could not be determined)
    Skipped { reason: String },
    Failed { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    pub module: String,
    #[serde(flatten)]
    pub outcome: ModuleOutcome,
}

impl ModuleReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ModuleOutcome::Failed { .. })
    }
}

// What every module in a run shares
pub struct Pipeline<'a, H, T> {
    pub host: &'a H,
    pub toolchain: &'a T,
    pub repo: &'a RepositoryRef,
    /// Explicit version / tag from the command line
    pub version: Option<&'a str>,
    pub output_dir: &'a Path,
}

impl<'a, H: RepoHost, T: Toolchain> Pipeline<'a, H, T> {
    pub async fn fetch(&self, module: &str) -> ModuleReport {
        let outcome = match self.try_fetch(module).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("Module '{}' failed: {}", module, err);
                ModuleOutcome::Failed {
                    kind: err.kind(),
                    message: err.to_string(),
                }
            }
        };

        ModuleReport {
            module: module.to_string(),
            outcome,
        }
    }

    async fn try_fetch(&self, module: &str) -> FetchResult<ModuleOutcome> {
        // 1. Fast path: a release asset
        if let Some(release) = self.host.find_release(self.repo, self.version).await? {
            if let Some(asset) = release.select_asset(Some(module)) {
                println!("   Found {} in release {}", asset.file_name, release.tag_name);
                let path = self.host.download_asset(asset, self.output_dir).await?;
                println!("   ✅ Downloaded: {}", path.display());
                return Ok(ModuleOutcome::Downloaded { path });
            }
            debug!("Release {} has no asset for '{}'", release.tag_name, module);
        }

        // 2. Slow path: build from source
        println!("   No release artifact, building from source");
        let source_ref = self.version.or(self.repo.git_ref.as_deref());
        let tree = self.host.fetch_source(self.repo, source_ref).await?;

        // The URL's subpath only applies to the module it names
        let subpath = self
            .repo
            .subpath
            .as_deref()
            .filter(|_| self.repo.default_module() == Some(module));
        let module_dir = locate_module(tree.root(), module, subpath)?;

        let project_type = ProjectType::detect(&module_dir);
        let version = resolve_version(&module_dir, project_type, self.version);
        println!("   Detected {} project, version {}", project_type, version);

        let outcome =
            build_module(self.toolchain, tree.root(), &module_dir, project_type, self.output_dir)
                .await?;

        Ok(match outcome {
            BuildOutcome::Packaged(path) => {
                println!("   ✅ Packaged: {}", path.display());
                ModuleOutcome::Built {
                    path,
                    version,
                    project_type,
                }
            }
            BuildOutcome::Skipped => {
                println!("   ⚠️  Unknown project type for {}", module_dir.display());
                ModuleOutcome::Skipped {
                    reason: format!(
                        "no pom.xml or package.json in {}",
                        module_dir
                            .strip_prefix(tree.root())
                            .unwrap_or(&module_dir)
                            .display()
                    ),
                }
            }
        })
    }
}
