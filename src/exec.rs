//! Shared process execution and argument-list utilities.
//!
//! Both the native-library builder and the application packager spawn
//! exactly one external tool per invocation, and depend on nothing but
//! [`ProcessRunner`] for execution.

use std::path::Path;
use std::process::Command;

/// Captured result of a single external tool run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Error type for builder and packager operations
#[derive(Debug)]
pub enum ToolError {
    /// Missing or contradictory configuration, detected before any
    /// external process is spawned
    Configuration(String),
    /// The external tool exited non-zero; carries the captured output
    Invocation {
        tool: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    /// IO error while staging directories or spawning the tool
    Io(std::io::Error),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ToolError::Invocation {
                tool,
                exit_code,
                stderr,
                ..
            } => {
                write!(f, "{} exited with status {}", tool, exit_code)?;
                if !stderr.trim().is_empty() {
                    write!(f, ":\n{}", stderr.trim())?;
                }
                Ok(())
            }
            ToolError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::Io(e)
    }
}

/// Executes a command line and reports exit status and captured output.
///
/// The builder and packager are written against this trait so tests can
/// record invocations without touching a real compiler or JDK.
pub trait ProcessRunner {
    fn run(&self, executable: &Path, args: &[String]) -> Result<ProcessOutput, ToolError>;
}

/// Runs tools as real child processes, blocking until they exit.
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, executable: &Path, args: &[String]) -> Result<ProcessOutput, ToolError> {
        let output = Command::new(executable).args(args).output()?;
        Ok(ProcessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Runs `executable` exactly once and maps a non-zero exit to
/// [`ToolError::Invocation`]. There is no retry; the external
/// orchestrator decides what to do with a failed invocation.
pub fn run_tool(
    runner: &dyn ProcessRunner,
    tool: &str,
    executable: &Path,
    args: &[String],
) -> Result<ProcessOutput, ToolError> {
    let output = runner.run(executable, args)?;
    if output.exit_code != 0 {
        return Err(ToolError::Invocation {
            tool: tool.to_string(),
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        });
    }
    Ok(output)
}

/// Append-only ordered token list.
///
/// The emitted command lines are contractual: the external tools are
/// order- and flag-name-sensitive. Routing every token through one
/// builder keeps the ordering assertable token by token.
#[derive(Debug, Default, Clone)]
pub struct ArgList {
    tokens: Vec<String>,
}

impl ArgList {
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Appends a single token.
    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    /// Appends a sequence of tokens in iteration order.
    pub fn push_all<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for token in tokens {
            self.tokens.push(token.into());
        }
    }

    /// Appends a `name value` flag pair as two tokens.
    pub fn flag(&mut self, name: &str, value: impl Into<String>) {
        self.tokens.push(name.to_string());
        self.tokens.push(value.into());
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn into_vec(self) -> Vec<String> {
        self.tokens
    }
}
