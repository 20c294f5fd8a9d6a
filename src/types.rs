//! Request parameters and the response envelope shared by the HTTP and CLI
//! surfaces.

use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;

use crate::clients::github::WorkflowRun;

pub const DEFAULT_BASE_BRANCH: &str = "main";

fn default_base_branch() -> String {
    DEFAULT_BASE_BRANCH.to_string()
}

fn default_push() -> bool {
    true
}

// -----------------------------------------------------------------------------
// Requests

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// Path relative to the repository root.
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBranchRequest {
    pub branch_name: String,
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFilesRequest {
    pub branch_name: String,
    pub files: Vec<FileContent>,
    pub commit_message: String,
    #[serde(default = "default_push")]
    pub push: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushBranchRequest {
    pub branch_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePrRequest {
    pub title: String,
    pub description: String,
    pub branch_name: String,
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStatusRequest {
    pub pr_number: u64,
}

// -----------------------------------------------------------------------------
// Response data

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchData {
    pub branch_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitData {
    pub branch_name: String,
    pub commit_sha: String,
    pub pushed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestData {
    pub pr_number: u64,
    pub pr_url: String,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowStatusData {
    pub pr_number: u64,
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoStatusData {
    pub branch: String,
    pub commit_sha: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelloWorldData {
    pub branch_name: String,
    pub commit_sha: String,
    pub original_branch: String,
    pub pr_url: Option<String>,
}

// -----------------------------------------------------------------------------
// ToolResponse

/// Outcome of a tool call.
///
/// Serializes to `{success, message, error, data}`, with `error` null on
/// success and `data` null on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResponse<T> {
    Success { message: String, data: T },
    Failure { message: String, error: String },
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    success: bool,
    message: &'a str,
    error: Option<&'a str>,
    data: Option<&'a T>,
}

impl<T> ToolResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self::Success {
            message: message.into(),
            data,
        }
    }

    pub fn failure(message: impl Into<String>, error: impl Display) -> Self {
        Self::Failure {
            message: message.into(),
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Failure { message, .. } => message,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

impl<T: Serialize> Serialize for ToolResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Envelope {
            success: self.is_success(),
            message: self.message(),
            error: self.error(),
            data: self.data(),
        }
        .serialize(serializer)
    }
}
