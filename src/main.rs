// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Parse the repository URL (a bad URL stops everything right away)
// 3. Fetch each requested module in turn, one after the other
// 4. Print a summary and exit with a proper code:
//      0 = every module resolved (skipped unknown types included)
//      1 = usage error, or at least one module failed
//      2 = fatal error before any module ran
//
// Rust concepts used:
// - async/await: Network requests and child processes are awaited in turn
// - Result<T, E> and `?`: Fatal errors bubble up to main as anyhow::Error
// - Generics: Pipeline works with any RepoHost/Toolchain, main plugs in
//   the real ones
// =============================================================================

// Module declarations - tells Rust about our other source files
mod build;     // src/build/ - running mvn/npm and collecting the artifact
mod cli;       // src/cli.rs - command-line parsing
mod error;     // src/error.rs - typed errors for each stage
mod github;    // src/github/ - releases, downloads, source tarballs
mod pipeline;  // src/pipeline.rs - release first, then build from source
mod project;   // src/project/ - locating modules, type and version

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};  // Context adds a message to an error on the way up
use clap::error::ErrorKind as ClapErrorKind;
use clap::{CommandFactory, Parser};  // Parser gives us try_parse(), CommandFactory the usage line
use tracing::debug;
use tracing_subscriber::EnvFilter;

use build::SystemToolchain;
use cli::Cli;
use github::{ClientConfig, GitHubClient, RepositoryRef};
use pipeline::{ModuleOutcome, ModuleReport, Pipeline};

// #[tokio::main] sets up the async runtime for us
#[tokio::main]
async fn main() {
    // try_parse instead of parse: clap's own exit code for bad arguments is
    // 2, and we report usage errors with 1
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version are not errors, let clap print and exit 0
        Err(e) if matches!(e.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    init_logging(cli.verbose);

    // Anything that escapes run() is fatal for the whole invocation
    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    // Exit with our computed exit code
    std::process::exit(exit_code);
}

// RUST_LOG wins; otherwise -v/-vv pick the level for our own crate
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "warn,module_fetch=info",
        _ => "info,module_fetch=debug",
    };
    // Logs go to stderr so stdout stays clean for --json
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

// Does the actual work; returns the exit code for main
async fn run(cli: Cli) -> Result<i32> {
    // A bad URL stops here, before any network traffic
    let repo = RepositoryRef::parse(&cli.repo_url)?;
    debug!("Parsed repository: {:?}", repo);

    // Module list from the positional, or from a /tree/... URL
    let modules = cli.module_names(&repo);
    if modules.is_empty() {
        eprintln!("{}", Cli::command().render_usage());
        eprintln!("At least one module name is required");
        return Ok(1);
    }

    // Artifacts land in --output-dir, or the current directory
    let output_dir = match &cli.output_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("cannot create output directory {}", output_dir.display()))?;

    // One HTTP client and one toolchain, shared by every module
    let host = GitHubClient::new(ClientConfig {
        api_url: cli.api_url.clone(),
        token: cli.token.clone(),
        timeout: Duration::from_secs(cli.timeout),
    })?;
    let toolchain = SystemToolchain {
        mvn: cli.mvn.clone(),
        npm: cli.npm.clone(),
    };

    println!("🔍 Repository: {}/{}", repo.owner, repo.name);

    let pipeline = Pipeline {
        host: &host,
        toolchain: &toolchain,
        repo: &repo,
        version: cli.tag.as_deref(),
        output_dir: &output_dir,
    };

    // Modules run one after another; a failure is recorded in the report
    // and the loop moves on to the next module
    let mut reports = Vec::with_capacity(modules.len());
    for module in &modules {
        println!("\n📦 Processing module: {}", module);
        let report = pipeline.fetch(module).await;
        // Show the reason right away, the table only has room for a summary
        if let ModuleOutcome::Failed { message, .. } = &report.outcome {
            eprintln!("   ❌ {}", message);
        }
        reports.push(report);
    }

    print_results(&reports, cli.json)?;

    if reports.iter().any(ModuleReport::is_failure) {
        Ok(1)  // Exit code 1 = at least one module failed
    } else {
        Ok(0)  // Exit code 0 = every module resolved
    }
}

// Prints the results either as a table or JSON
fn print_results(reports: &[ModuleReport], json: bool) -> Result<()> {
    if json {
        // Pretty-print as JSON (serde does the work)
        let json_output = serde_json::to_string_pretty(reports)?;
        println!("{}", json_output);
    } else {
        print_table(reports);
    }
    Ok(())
}

// Prints results in a human-readable table
fn print_table(reports: &[ModuleReport]) {
    println!();
    println!("{:<25} {:<14} {:<60}", "MODULE", "RESULT", "DETAIL");
    println!("{}", "=".repeat(99));

    for report in reports {
        let (status, detail) = describe(&report.outcome);
        println!("{:<25} {:<14} {:<60}", report.module, status, detail);
    }

    println!();

    // Count each kind of outcome for the summary
    let failed = reports.iter().filter(|r| r.is_failure()).count();
    let skipped = reports
        .iter()
        .filter(|r| matches!(r.outcome, ModuleOutcome::Skipped { .. }))
        .count();

    println!("📊 Summary:");
    println!("   ✅ Resolved: {}", reports.len() - failed - skipped);
    println!("   ⚠️  Skipped: {}", skipped);
    println!("   ❌ Failed: {}", failed);
}

// Status label and detail column for one outcome
fn describe(outcome: &ModuleOutcome) -> (&'static str, String) {
    let display = |path: &PathBuf| path.display().to_string();
    match outcome {
        ModuleOutcome::Downloaded { path } => ("📥 RELEASE", display(path)),
        ModuleOutcome::Built {
            path,
            version,
            project_type,
        } => ("🔨 BUILT", format!("{} ({} {})", display(path), project_type, version)),
        ModuleOutcome::Skipped { reason } => ("⚠️  SKIPPED", reason.clone()),
        ModuleOutcome::Failed { message, .. } => ("❌ FAILED", message.clone()),
    }
}
