use std::path::Path;
use std::path::PathBuf;

use tracing::instrument;

use super::runner::CommandError;
use super::runner::CommandFailure;
use super::runner::CommandInvocation;
use super::runner::CommandRunner;
use super::runner::ProcessRunner;

/// Substring git prints when the remote refuses a pushed ref, e.g.
/// `! [remote rejected] main -> main (pre-receive hook declined)`.
const REMOTE_REJECTED_MARKER: &str = "remote rejected";

// -----------------------------------------------------------------------------
// Types

/// Where and how to run git.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitConfig {
    pub repo_path: PathBuf,
    pub git_bin: String,
}

/// Git client. Every method is exactly one git invocation.
pub struct GitClient<R = ProcessRunner> {
    config: GitConfig,
    runner: R,
}

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("remote rejected push: {0}")]
    RemoteRejected(CommandFailure),
}

// -----------------------------------------------------------------------------
// GitConfig impl

impl GitConfig {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            git_bin: "git".to_string(),
        }
    }

    pub fn with_git_bin(mut self, git_bin: impl Into<String>) -> Self {
        self.git_bin = git_bin.into();
        self
    }
}

// -----------------------------------------------------------------------------
// GitError impl

impl GitError {
    /// Classify a failed push.
    ///
    /// This is a heuristic on git's human-readable stderr, not a structured
    /// signal, so it can misclassify if git changes the wording.
    fn from_push(err: CommandError) -> Self {
        match err {
            CommandError::Failed(failure) if failure.stderr.contains(REMOTE_REJECTED_MARKER) => {
                Self::RemoteRejected(failure)
            }
            other => Self::Command(other),
        }
    }

    pub fn is_remote_rejected(&self) -> bool {
        matches!(self, Self::RemoteRejected(_))
    }
}

// -----------------------------------------------------------------------------
// GitClient impl

impl GitClient<ProcessRunner> {
    pub fn new(config: GitConfig) -> Self {
        Self::with_runner(config, ProcessRunner)
    }
}

impl<R: CommandRunner> GitClient<R> {
    pub fn with_runner(config: GitConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn repo_path(&self) -> &Path {
        &self.config.repo_path
    }

    async fn git<const N: usize>(&self, args: [&str; N]) -> Result<String, CommandError> {
        let invocation =
            CommandInvocation::new(&self.config.git_bin, args, &self.config.repo_path);
        self.runner.run(invocation).await
    }

    #[instrument(skip(self))]
    pub async fn pull(&self, remote: &str, branch: Option<&str>) -> Result<(), GitError> {
        match branch {
            Some(branch) => self.git(["pull", remote, branch]).await?,
            None => self.git(["pull", remote]).await?,
        };
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.git(["checkout", branch]).await?;
        Ok(())
    }

    /// Create a branch from HEAD and switch to it.
    #[instrument(skip(self))]
    pub async fn create_branch(&self, branch: &str) -> Result<(), GitError> {
        self.git(["checkout", "-b", branch]).await?;
        Ok(())
    }

    /// Stage a path relative to the repository root.
    #[instrument(skip(self))]
    pub async fn add(&self, path: &str) -> Result<(), GitError> {
        self.git(["add", path]).await?;
        Ok(())
    }

    /// Fails when nothing is staged.
    #[instrument(skip_all)]
    pub async fn commit(&self, message: &str) -> Result<(), GitError> {
        self.git(["commit", "-m", message]).await?;
        Ok(())
    }

    /// Push and set upstream tracking.
    #[instrument(skip(self))]
    pub async fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.git(["push", "-u", remote, branch])
            .await
            .map_err(GitError::from_push)?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn current_branch(&self) -> Result<String, GitError> {
        Ok(self.git(["rev-parse", "--abbrev-ref", "HEAD"]).await?)
    }

    #[instrument(skip(self))]
    pub async fn current_commit_sha(&self) -> Result<String, GitError> {
        Ok(self.git(["rev-parse", "HEAD"]).await?)
    }

    /// Raw `git status` output.
    #[instrument(skip(self))]
    pub async fn status(&self) -> Result<String, GitError> {
        Ok(self.git(["status"]).await?)
    }

    /// Read a config value, `None` when the key is unset.
    #[instrument(skip(self))]
    pub async fn config_value(&self, key: &str) -> Result<Option<String>, GitError> {
        match self.git(["config", "--get", key]).await {
            Ok(value) => Ok(Some(value)),
            // Exit code 1 means the key is not set
            Err(CommandError::Failed(failure)) if failure.stderr.is_empty() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
