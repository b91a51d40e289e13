// src/project/descriptor.rs
// =============================================================================
// Reads the declared version from a module's build descriptor.
//
// Each ecosystem gets a small DescriptorReader: which file to open and how
// to pull a version string out of it. Adding an ecosystem means adding a
// reader, not touching the build dispatch.
//
// Version resolution never fails. Missing file, unreadable file, malformed
// content, or no version field all come out as "unknown".
// =============================================================================

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::ProjectType;

pub const UNKNOWN_VERSION: &str = "unknown";

pub trait DescriptorReader {
    fn file_name(&self) -> &'static str;

    fn read_version(&self, contents: &str) -> Option<String>;
}

// pom.xml: the <version> that is a direct child of the root <project>.
// <parent><version> and dependency versions are deeper and never match.
pub struct PomReader;

impl DescriptorReader for PomReader {
    fn file_name(&self) -> &'static str {
        "pom.xml"
    }

    fn read_version(&self, contents: &str) -> Option<String> {
        let mut reader = Reader::from_str(contents);
        reader.config_mut().trim_text(true);

        let mut depth = 0usize;
        let mut in_version = false;
        loop {
            match reader.read_event() {
                Ok(Event::Start(tag)) => {
                    depth += 1;
                    in_version = depth == 2 && tag.local_name().as_ref() == b"version";
                }
                Ok(Event::End(_)) => {
                    depth = depth.saturating_sub(1);
                    in_version = false;
                }
                Ok(Event::Text(text)) if in_version => {
                    let version = text.unescape().ok()?.trim().to_string();
                    return Some(version).filter(|v| !v.is_empty());
                }
                Ok(Event::Eof) => return None,
                Err(e) => {
                    debug!("Malformed pom.xml: {}", e);
                    return None;
                }
                Ok(_) => {}
            }
        }
    }
}

// package.json: the top-level "version" string
pub struct PackageJsonReader;

impl DescriptorReader for PackageJsonReader {
    fn file_name(&self) -> &'static str {
        "package.json"
    }

    fn read_version(&self, contents: &str) -> Option<String> {
        let manifest: serde_json::Value = serde_json::from_str(contents)
            .map_err(|e| debug!("Malformed package.json: {}", e))
            .ok()?;
        manifest
            .get("version")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

fn reader_for(project_type: ProjectType) -> Option<&'static dyn DescriptorReader> {
    match project_type {
        ProjectType::Maven => Some(&PomReader),
        ProjectType::Npm => Some(&PackageJsonReader),
        ProjectType::Unknown => None,
    }
}

// An explicit version is returned untouched without reading any file
pub fn resolve_version(module_dir: &Path, project_type: ProjectType, explicit: Option<&str>) -> String {
    if let Some(version) = explicit {
        return version.to_string();
    }

    let Some(reader) = reader_for(project_type) else {
        return UNKNOWN_VERSION.to_string();
    };

    let path = module_dir.join(reader.file_name());
    match std::fs::read_to_string(&path) {
        Ok(contents) => reader
            .read_version(&contents)
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        Err(e) => {
            debug!("Could not read {}: {}", path.display(), e);
            UNKNOWN_VERSION.to_string()
        }
    }
}
