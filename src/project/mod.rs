// src/project/mod.rs
// =============================================================================
// This module works on an extracted source tree:
// - locate: Finding the directory that implements a module
// - descriptor: Reading the declared version out of pom.xml / package.json
// - this file: Deciding what kind of project a module directory is
//
// Detection only checks which build descriptor exists; it never parses it.
// =============================================================================

mod descriptor;
mod locate;

use std::fmt;
use std::path::Path;

use serde::Serialize;

pub use descriptor::resolve_version;
pub use locate::locate_module;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Maven,
    Npm,
    Unknown,
}

impl ProjectType {
    // Maven wins when a directory has both descriptors
    pub fn detect(module_dir: &Path) -> Self {
        if module_dir.join("pom.xml").is_file() {
            ProjectType::Maven
        } else if module_dir.join("package.json").is_file() {
            ProjectType::Npm
        } else {
            ProjectType::Unknown
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProjectType::Maven => "maven",
            ProjectType::Npm => "npm",
            ProjectType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_detect_maven() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        assert_eq!(ProjectType::detect(dir.path()), ProjectType::Maven);
    }

    #[test]
    fn test_detect_npm() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert_eq!(ProjectType::detect(dir.path()), ProjectType::Npm);
    }

    #[test]
    fn test_detect_unknown() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("build.gradle"), "").unwrap();
        assert_eq!(ProjectType::detect(dir.path()), ProjectType::Unknown);
    }

    #[test]
    fn test_maven_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert_eq!(ProjectType::detect(dir.path()), ProjectType::Maven);
    }

    #[test]
    fn test_descriptor_in_subdirectory_does_not_count() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/pom.xml"), "<project/>").unwrap();
        assert_eq!(ProjectType::detect(dir.path()), ProjectType::Unknown);
    }
}
