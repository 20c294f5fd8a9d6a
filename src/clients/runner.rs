use std::fmt::Display;
use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::process::Command;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

// -----------------------------------------------------------------------------
// Types

/// A single external command: program, literal argument vector and working
/// directory. Arguments never pass through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

/// A command that ran and exited with a non-zero status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}: `{invocation}`{}", stderr_suffix(.stderr))]
pub struct CommandFailure {
    pub invocation: CommandInvocation,
    /// Captured stderr, trailing whitespace trimmed.
    pub stderr: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to execute `{invocation}`: {source}")]
    Spawn {
        invocation: CommandInvocation,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Failed(#[from] CommandFailure),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

// -----------------------------------------------------------------------------
// CommandInvocation impl

impl CommandInvocation {
    pub fn new<I, S>(program: impl Into<String>, args: I, cwd: impl AsRef<Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.as_ref().to_path_buf(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}

impl Display for CommandInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

impl CommandError {
    pub fn invocation(&self) -> &CommandInvocation {
        match self {
            Self::Spawn { invocation, .. } => invocation,
            Self::Failed(failure) => &failure.invocation,
        }
    }
}

// -----------------------------------------------------------------------------
// CommandRunner trait

/// Runs external commands.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion. Returns stdout with trailing whitespace
    /// trimmed when the exit status is zero.
    async fn run(&self, invocation: CommandInvocation) -> Result<String, CommandError>;
}

// -----------------------------------------------------------------------------
// ProcessRunner

/// Runner backed by `tokio::process`.
///
/// There is no timeout: a child that never exits suspends the caller forever.
/// stdin is closed so commands that would prompt (credentials, editors) fail
/// instead of waiting for input.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    #[instrument(skip_all, fields(command = %invocation))]
    async fn run(&self, invocation: CommandInvocation) -> Result<String, CommandError> {
        debug!(cwd = %invocation.cwd.display(), "Running command");

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .output()
            .await;
        let output = match output {
            Ok(output) => output,
            Err(source) => {
                warn!(error = %source, "Failed to spawn command");
                return Err(CommandError::Spawn { invocation, source });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        if !stdout.is_empty() {
            debug!(%stdout, "Command stdout");
        }
        if !stderr.is_empty() {
            debug!(%stderr, "Command stderr");
        }

        if !output.status.success() {
            warn!(status = %output.status, %stderr, "Command failed");
            return Err(CommandFailure {
                message: format!("command exited with {}", output.status),
                invocation,
                stderr,
            }
            .into());
        }

        debug!("Command succeeded");
        Ok(stdout)
    }
}
