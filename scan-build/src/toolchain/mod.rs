// SPDX-License-Identifier: GPL-3.0-or-later

//! The boundary to the external compiler and analyzer processes.
//!
//! Everything the pipeline needs from the outside world is behind the
//! [`Toolchain`] trait: running the original build step, asking the
//! compiler driver for the front-end invocation (`-###`), running the
//! analyzer with captured output, and collecting details for failure
//! reports.

mod supervise;

pub use supervise::supervise;

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};
use thiserror::Error;

/// How an external process finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    Signaled(i32),
}

impl Termination {
    pub fn is_success(&self) -> bool {
        matches!(self, Termination::Exited(0))
    }
}

impl From<ExitStatus> for Termination {
    #[cfg(unix)]
    fn from(status: ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        match (status.code(), status.signal()) {
            (Some(code), _) => Termination::Exited(code),
            (None, Some(signal)) => Termination::Signaled(signal),
            (None, None) => Termination::Exited(1),
        }
    }

    #[cfg(not(unix))]
    fn from(status: ExitStatus) -> Self {
        Termination::Exited(status.code().unwrap_or(1))
    }
}

/// The captured result of an external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub termination: Termination,
    /// Standard output lines followed by the standard error lines.
    pub lines: Vec<String>,
}

/// Responsible for running the external processes.
#[cfg_attr(test, mockall::automock)]
pub trait Toolchain {
    /// Runs the original build step with the standard streams inherited.
    fn execute(&self, command: &[String]) -> Result<Termination, ToolError>;

    /// Turns a compiler driver call into the front-end call the driver would make.
    fn expand(&self, directory: &Path, command: &[String]) -> Result<Vec<String>, ToolError>;

    /// Runs the command in the directory and captures its output.
    fn run(&self, directory: &Path, command: &[String]) -> Result<ToolOutput, ToolError>;

    /// The version banner of the compiler, all the lines of it.
    fn version(&self, compiler: &str) -> Result<String, ToolError>;

    /// Identification of the host machine.
    fn host(&self) -> String;
}

/// Runs the processes on the current machine.
#[derive(Debug, Default)]
pub struct SystemToolchain;

impl Toolchain for SystemToolchain {
    fn execute(&self, command: &[String]) -> Result<Termination, ToolError> {
        let (program, arguments) = command.split_first().ok_or(ToolError::EmptyCommand)?;
        log::debug!("Executing: {command:?}");
        supervise(Command::new(program).args(arguments))
    }

    fn expand(&self, directory: &Path, command: &[String]) -> Result<Vec<String>, ToolError> {
        let (program, arguments) = command.split_first().ok_or(ToolError::EmptyCommand)?;
        let dump = std::iter::once(program.clone())
            .chain(std::iter::once("-###".to_string()))
            .chain(arguments.iter().cloned())
            .collect::<Vec<_>>();

        let output = self.run(directory, &dump)?;
        parse_expansion(&output)
    }

    fn run(&self, directory: &Path, command: &[String]) -> Result<ToolOutput, ToolError> {
        let (program, arguments) = command.split_first().ok_or(ToolError::EmptyCommand)?;
        log::debug!("Running in {}: {command:?}", directory.display());
        let output = Command::new(program)
            .args(arguments)
            .current_dir(directory)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ToolError::Spawn { executable: PathBuf::from(program), source })?;

        Ok(ToolOutput { termination: Termination::from(output.status), lines: captured_lines(&output) })
    }

    fn version(&self, compiler: &str) -> Result<String, ToolError> {
        let output = Command::new(compiler)
            .arg("-v")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ToolError::Spawn { executable: PathBuf::from(compiler), source })?;

        Ok(captured_lines(&output).join("\n"))
    }

    fn host(&self) -> String {
        Command::new("uname")
            .arg("-a")
            .output()
            .ok()
            .filter(|output| output.status.success())
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
            .filter(|line| !line.is_empty())
            .unwrap_or_else(|| format!("{} {}", std::env::consts::OS, std::env::consts::ARCH))
    }
}

/// Standard output lines followed by the standard error lines.
fn captured_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .chain(String::from_utf8_lossy(&output.stderr).lines())
        .map(str::to_string)
        .collect()
}

/// Takes the front-end call from the output of the `-###` run.
///
/// The driver prints the call it would make as the last line of its output.
fn parse_expansion(output: &ToolOutput) -> Result<Vec<String>, ToolError> {
    let last = output.lines.last().map(String::as_str).unwrap_or_default();
    if !output.termination.is_success() || last.starts_with("clang: error:") {
        return Err(ToolError::Expansion { line: last.to_string() });
    }
    let arguments = shell_words::split(last).map_err(|_| ToolError::Expansion { line: last.to_string() })?;
    if arguments.is_empty() {
        return Err(ToolError::Expansion { line: last.to_string() });
    }
    Ok(arguments)
}

/// Errors that can occur while running external processes.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Empty command")]
    EmptyCommand,
    #[error("Failed to register signal handler for '{executable}': {source}", executable = executable.display())]
    Signal {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to execute '{executable}': {source}", executable = executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to kill process '{executable}': {source}", executable = executable.display())]
    Kill {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to wait for process '{executable}': {source}", executable = executable.display())]
    Wait {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unexpected output from the compiler driver: '{line}'")]
    Expansion { line: String },
}
