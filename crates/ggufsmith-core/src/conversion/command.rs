//! Running the external conversion and quantization tools.
//!
//! Child processes inherit the terminal so the tools' own progress output is
//! shown live. Nothing is captured; the only signal returned is whether the
//! process exited with status zero.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::OutputConfig;

/// One external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    produces: PathBuf,
}

impl ToolCommand {
    /// `produces` is the file the tool is expected to write on success.
    pub fn new(program: impl Into<PathBuf>, produces: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            produces: produces.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn produces(&self) -> &Path {
        &self.produces
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

fn quote(part: &str) -> String {
    if part.is_empty() || part.contains(char::is_whitespace) {
        format!("'{part}'")
    } else {
        part.to_string()
    }
}

/// Executes tool commands one at a time.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion.
    ///
    /// Returns `true` iff the process exited with status zero. Failures are
    /// reported here and never raised; the caller decides what they mean.
    async fn run(&self, command: &ToolCommand, description: &str) -> bool;
}

/// Runs commands as real child processes attached to the terminal.
///
/// Relative paths in a command resolve against the current directory of this
/// process, the same directory the pipeline checks them in.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &ToolCommand, description: &str) -> bool {
        println!("\n{description}");
        println!("Running: {command}");
        println!("{}", "-".repeat(OutputConfig::RULE_WIDTH));
        debug!("Spawning {} with {} args", command.program().display(), command.args().len());

        let status = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {
                println!("{description} completed successfully");
                true
            }
            Ok(status) => {
                println!("Error during {description}");
                println!(
                    "Command failed with return code: {}",
                    status.code().unwrap_or(-1)
                );
                false
            }
            Err(e) => {
                warn!("Failed to spawn {}: {}", command.program().display(), e);
                println!("Error during {description}");
                println!("Could not start {}: {e}", command.program().display());
                false
            }
        }
    }
}
