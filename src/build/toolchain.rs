// src/build/toolchain.rs
// =============================================================================
// Runs the external build tools (mvn, npm) as child processes.
//
// The Toolchain trait is the seam: the real SystemToolchain spawns
// processes, tests plug in a fake that just records what was asked and
// drops pretend artifacts on disk.
//
// The tool's stdout/stderr are inherited so the build log shows up live in
// the terminal. A missing executable and a failing build look the same to
// the caller: both are Build errors.
// =============================================================================

use std::path::PathBuf;

use tokio::process::Command;
use tracing::debug;

use crate::error::{FetchError, FetchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Maven,
    Npm,
}

// One command to run: which tool, with which arguments, from which directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool: Tool,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(tool: Tool, args: &[&str], cwd: impl Into<PathBuf>) -> Self {
        Invocation {
            tool,
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: cwd.into(),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Toolchain {
    // Ok(()) only when the tool ran and exited with status 0
    async fn run(&self, invocation: &Invocation) -> FetchResult<()>;
}

// Spawns the real executables, looked up on PATH unless given as paths
#[derive(Debug, Clone)]
pub struct SystemToolchain {
    pub mvn: String,
    pub npm: String,
}

impl SystemToolchain {
    fn executable(&self, tool: Tool) -> &str {
        match tool {
            Tool::Maven => &self.mvn,
            Tool::Npm => &self.npm,
        }
    }
}

impl Toolchain for SystemToolchain {
    async fn run(&self, invocation: &Invocation) -> FetchResult<()> {
        let program = self.executable(invocation.tool);
        debug!(
            "Running {} {} in {}",
            program,
            invocation.args.join(" "),
            invocation.cwd.display()
        );

        let build_error = |message: String| FetchError::Build {
            tool: program.to_string(),
            dir: invocation.cwd.clone(),
            message,
        };

        let status = Command::new(program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .status()
            .await
            .map_err(|e| build_error(format!("could not start {}: {}", program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(build_error(format!(
                "`{} {}` exited with {}",
                program,
                invocation.args.join(" "),
                status
            )))
        }
    }
}
