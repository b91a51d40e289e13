// src/github/release.rs
// =============================================================================
// Release metadata from the GitHub API and the asset-matching rule.
//
// The API returns a release object with an "assets" array. Each asset has a
// "name" (the file name) and a "browser_download_url". We only deserialize
// the fields we actually use; serde ignores everything else.
//
// Matching rule (first match wins, in the order the API returned them):
//   1. lowercased file name contains the lowercased module name
//   2. file name ends with one of the accepted extensions
//
// Rust concepts:
// - serde derive: Deserialize straight into our own structs
// - #[serde(rename)]: Our field names don't have to match the JSON keys
// - Option: "no matching asset" is None, not an error
// =============================================================================

use serde::Deserialize;

// File extensions we accept as a pre-built module artifact
pub const ACCEPTED_EXTENSIONS: [&str; 4] = [".jar", ".tgz", ".zip", ".tar.gz"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    #[serde(rename = "name")]
    pub file_name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

impl Release {
    // Picks the asset for a module, or None if nothing qualifies.
    //
    // An empty module name matches any asset with an accepted extension.
    pub fn select_asset(&self, module: Option<&str>) -> Option<&ReleaseAsset> {
        let module = module.map(str::to_lowercase).filter(|m| !m.is_empty());

        self.assets.iter().find(|asset| {
            let name = asset.file_name.to_lowercase();
            let name_matches = module.as_deref().map_or(true, |m| name.contains(m));
            name_matches && has_accepted_extension(&name)
        })
    }
}

fn has_accepted_extension(lowercase_name: &str) -> bool {
    ACCEPTED_EXTENSIONS
        .iter()
        .any(|ext| lowercase_name.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release_from_json(json: &str) -> Release {
        serde_json::from_str(json).unwrap()
    }

    fn sample_release() -> Release {
        release_from_json(
            r#"{
                "tag_name": "v1.2.0",
                "draft": false,
                "assets": [
                    {"name": "widgets-api-1.2.0.jar", "browser_download_url": "https://dl/api.jar", "size": 10},
                    {"name": "widgets-core-1.2.0.exe", "browser_download_url": "https://dl/core.exe"},
                    {"name": "widgets-core-1.2.0.jar", "browser_download_url": "https://dl/core.jar"},
                    {"name": "widgets-core-1.2.0.tar.gz", "browser_download_url": "https://dl/core.tar.gz"}
                ]
            }"#,
        )
    }

    #[test]
    fn test_selects_first_matching_asset() {
        let release = sample_release();
        let asset = release.select_asset(Some("core")).unwrap();
        assert_eq!(asset.file_name, "widgets-core-1.2.0.jar");
        assert_eq!(asset.download_url, "https://dl/core.jar");
    }

    #[test]
    fn test_selection_is_stable_for_same_payload() {
        let release = sample_release();
        let first = release.select_asset(Some("core")).cloned();
        let second = release.select_asset(Some("core")).cloned();
        assert_eq!(first, second);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let release = release_from_json(
            r#"{"assets": [{"name": "Module-1.0.TGZ", "browser_download_url": "https://dl/m.tgz"}]}"#,
        );
        assert!(release.select_asset(Some("MODULE")).is_some());
    }

    #[test]
    fn test_rejects_disallowed_extension() {
        let release = release_from_json(
            r#"{"assets": [{"name": "foo-module.exe", "browser_download_url": "https://dl/x"}]}"#,
        );
        assert!(release.select_asset(Some("module")).is_none());
    }

    #[test]
    fn test_accepts_tgz_for_module() {
        let release = release_from_json(
            r#"{"assets": [{"name": "module-1.0.tgz", "browser_download_url": "https://dl/m.tgz"}]}"#,
        );
        let asset = release.select_asset(Some("module")).unwrap();
        assert_eq!(asset.file_name, "module-1.0.tgz");
    }

    #[test]
    fn test_no_name_match_yields_none() {
        let release = sample_release();
        assert!(release.select_asset(Some("nomatch")).is_none());
    }

    #[test]
    fn test_without_module_name_any_accepted_asset_matches() {
        let release = sample_release();
        let asset = release.select_asset(None).unwrap();
        assert_eq!(asset.file_name, "widgets-api-1.2.0.jar");
    }

    #[test]
    fn test_release_without_assets() {
        let release = release_from_json(r#"{"tag_name": "v0.1.0"}"#);
        assert!(release.assets.is_empty());
        assert!(release.select_asset(Some("core")).is_none());
    }
}
