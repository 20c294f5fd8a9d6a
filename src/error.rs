use std::path::PathBuf;

use crate::clients::git::GitError;
use crate::clients::github::GithubError;

/// Any failure inside a tool call. Always folded into a
/// [`ToolResponse::Failure`](crate::types::ToolResponse) before it reaches a
/// transport.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    Github(#[from] GithubError),
    #[error("invalid file path `{0}`: must be relative and stay inside the repository")]
    InvalidPath(String),
    #[error("invalid branch or remote name `{0}`: must be non-empty and must not start with `-`")]
    InvalidRefName(String),
    #[error("filesystem error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn is_remote_rejected(&self) -> bool {
        matches!(self, Self::Git(err) if err.is_remote_rejected())
    }
}
