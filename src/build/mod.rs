// src/build/mod.rs
// =============================================================================
// Builds a module from source and copies the result into the output dir.
//
// One handler per project type:
// - Maven: `mvn -pl <module> -am package -DskipTests` from the source root,
//          then take the jar from <module>/target
// - Npm:   `npm install` then `npm pack` in the module dir, take the .tgz
//          that pack wrote (not one that was already there)
// - Unknown: nothing to build, the caller reports it and moves on
//
// The artifact is copied (not moved) into the output directory under the
// file name the tool gave it.
// =============================================================================

mod toolchain;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::project::ProjectType;

pub use toolchain::{Invocation, SystemToolchain, Tool, Toolchain};

// Jars Maven plugins commonly attach next to the main one
const SECONDARY_JAR_SUFFIXES: [&str; 3] = ["-sources.jar", "-javadoc.jar", "-tests.jar"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    // Path of the copy in the output directory
    Packaged(PathBuf),
    // No build tool for this project type
    Skipped,
}

pub async fn build_module<T: Toolchain>(
    toolchain: &T,
    source_root: &Path,
    module_dir: &Path,
    project_type: ProjectType,
    output_dir: &Path,
) -> FetchResult<BuildOutcome> {
    let artifact = match project_type {
        ProjectType::Maven => build_maven(toolchain, source_root, module_dir).await?,
        ProjectType::Npm => build_npm(toolchain, module_dir).await?,
        ProjectType::Unknown => {
            warn!("Unknown project type for {}", module_dir.display());
            return Ok(BuildOutcome::Skipped);
        }
    };

    let copied = copy_into(&artifact, output_dir).await?;
    Ok(BuildOutcome::Packaged(copied))
}

async fn build_maven<T: Toolchain>(
    toolchain: &T,
    source_root: &Path,
    module_dir: &Path,
) -> FetchResult<PathBuf> {
    let relative = module_dir.strip_prefix(source_root).unwrap_or(module_dir);
    let relative = relative.to_string_lossy().replace('\\', "/");

    // A module outside any reactor (no root pom, or the module is the root)
    // is built on its own.
    let in_reactor = !relative.is_empty() && source_root.join("pom.xml").is_file();
    let invocation = if in_reactor {
        Invocation::new(
            Tool::Maven,
            &["-pl", relative.as_str(), "-am", "package", "-DskipTests"],
            source_root,
        )
    } else {
        Invocation::new(Tool::Maven, &["package", "-DskipTests"], module_dir)
    };
    toolchain.run(&invocation).await?;

    let target = module_dir.join("target");
    let jars = list_with_extension(&target, "jar");
    pick_main_jar(jars).ok_or(FetchError::ArtifactNotFound {
        extension: "jar".to_string(),
        dir: target,
    })
}

async fn build_npm<T: Toolchain>(toolchain: &T, module_dir: &Path) -> FetchResult<PathBuf> {
    toolchain
        .run(&Invocation::new(Tool::Npm, &["install"], module_dir))
        .await?;

    // A committed fixture or a leftover from an earlier pack may already sit
    // in the module dir; only what `npm pack` writes counts
    let before: HashMap<PathBuf, Option<SystemTime>> =
        modified_times(list_with_extension(module_dir, "tgz"))
            .into_iter()
            .collect();
    toolchain
        .run(&Invocation::new(Tool::Npm, &["pack"], module_dir))
        .await?;

    let packed = modified_times(list_with_extension(module_dir, "tgz"))
        .into_iter()
        .find(|(path, modified)| before.get(path) != Some(modified))
        .map(|(path, _)| path);

    packed.ok_or(FetchError::ArtifactNotFound {
        extension: "tgz".to_string(),
        dir: module_dir.to_path_buf(),
    })
}

// Pairs each file with its last-modified time (None when unreadable),
// keeping the input order
fn modified_times(files: Vec<PathBuf>) -> Vec<(PathBuf, Option<SystemTime>)> {
    files
        .into_iter()
        .map(|path| {
            let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
            (path, modified)
        })
        .collect()
}

// Files in `dir` (not recursive) ending in `.{extension}`, sorted by name.
// A missing directory simply has no files.
fn list_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        debug!("{} does not exist", dir.display());
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().map_or(false, |ext| ext == extension))
        .collect();
    files.sort();
    files
}

// The first jar that isn't a sources/javadoc/tests attachment, falling back
// to the first jar at all.
fn pick_main_jar(jars: Vec<PathBuf>) -> Option<PathBuf> {
    let is_secondary = |path: &PathBuf| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        SECONDARY_JAR_SUFFIXES.iter().any(|s| name.ends_with(s))
    };

    jars.iter()
        .find(|jar| !is_secondary(jar))
        .or_else(|| jars.first())
        .cloned()
}

async fn copy_into(artifact: &Path, output_dir: &Path) -> FetchResult<PathBuf> {
    let file_name = artifact.file_name().ok_or_else(|| {
        FetchError::io(
            format!("artifact path {} has no file name", artifact.display()),
            std::io::Error::from(std::io::ErrorKind::InvalidInput),
        )
    })?;
    let destination = output_dir.join(file_name);

    tokio::fs::copy(artifact, &destination).await.map_err(|e| {
        FetchError::io(
            format!(
                "failed to copy {} to {}",
                artifact.display(),
                destination.display()
            ),
            e,
        )
    })?;
    Ok(destination)
}
