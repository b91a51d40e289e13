// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Usage:
//   module-fetch <repo-url> <module>[,<module>...] [version-or-tag] [flags]
//
// Everything that isn't a positional argument is optional and has a default.
// A few flags can also come from the environment (GITHUB_TOKEN etc.), which
// is what the `env = "..."` attributes do.
// =============================================================================

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::github::{RepositoryRef, DEFAULT_API_URL};

#[derive(Parser, Debug)]
#[command(
    name = "module-fetch",
    version,
    about = "Fetch a module artifact from a GitHub multi-module repository",
    long_about = "module-fetch looks for a pre-built artifact (jar/tgz/zip) for each requested module \
                  in the repository's GitHub releases. When there isn't one, it downloads the source, \
                  finds the module directory, builds it with mvn or npm, and copies the result into \
                  the output directory."
)]
pub struct Cli {
    /// GitHub repository URL (e.g., https://github.com/owner/repo)
    ///
    /// A /tree/<branch>/<path> URL also selects the branch and, when no module
    /// is named, the module at <path>.
    pub repo_url: String,

    /// Module name(s), comma-separated (e.g., core,web)
    pub modules: Option<String>,

    /// Release tag to look up, also used as the source ref (default: latest release)
    #[arg(value_name = "VERSION")]
    pub tag: Option<String>,

    /// Where artifacts are written (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// GitHub API base URL, for GitHub Enterprise
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// API token sent as a bearer token (optional, raises rate limits)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 120)]
    pub timeout: u64,

    /// Output the summary in JSON format instead of a table
    #[arg(long)]
    pub json: bool,

    /// More log output (-v info, -vv debug); RUST_LOG overrides this
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Maven executable
    #[arg(long, env = "MODULE_FETCH_MVN", default_value = "mvn")]
    pub mvn: String,

    /// npm executable
    #[arg(long, env = "MODULE_FETCH_NPM", default_value = "npm")]
    pub npm: String,
}

impl Cli {
    // The modules to process, in the order given
    //
    // Empty names (e.g. "core,,web" or a trailing comma) are dropped. When no
    // modules were given at all, the last segment of a /tree/<branch>/<path>
    // URL is used; with neither, the list is empty.
    pub fn module_names(&self, repo: &RepositoryRef) -> Vec<String> {
        match self.modules.as_deref() {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            None => repo.default_module().map(str::to_string).into_iter().collect(),
        }
    }
}


// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is `modules` an Option if it's "required"?
//    - A /tree/<branch>/<path> URL already names a module, so the list can be
//      left out in that one case
//    - main.rs prints the usage and exits with code 1 when the list ends up
//      empty
//
// 2. What does ArgAction::Count do?
//    - Each -v adds one, so -vv gives verbose = 2
//
// 3. Why is the version positional called `tag`?
//    - clap already owns the `version` id for --version
//
// 4. Why hide_env_values for the token?
//    - --help would otherwise print the token's value from the environment
// -----------------------------------------------------------------------------
