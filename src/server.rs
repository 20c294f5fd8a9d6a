//! HTTP surface: one JSON endpoint per tool.
//!
//! Every tool endpoint answers 200 with the [`ToolResponse`] envelope; callers
//! read `success` to learn the outcome. Bodies that do not deserialize are
//! rejected by axum before any git command runs.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing::warn;

use crate::App;
use crate::clients::github::GithubOps;
use crate::clients::runner::CommandRunner;
use crate::types::BranchData;
use crate::types::CommitData;
use crate::types::CommitFilesRequest;
use crate::types::CreateBranchRequest;
use crate::types::CreatePrRequest;
use crate::types::PullRequestData;
use crate::types::PushBranchRequest;
use crate::types::RepoStatusData;
use crate::types::ToolResponse;
use crate::types::WorkflowStatusData;
use crate::types::WorkflowStatusRequest;

type Shared<R, H> = State<Arc<App<R, H>>>;

pub fn router<R, H>(app: Arc<App<R, H>>) -> Router
where
    R: CommandRunner + 'static,
    H: GithubOps + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(catalog))
        .route("/tools/git/create-branch", post(create_branch::<R, H>))
        .route("/tools/git/commit-files", post(commit_files::<R, H>))
        .route("/tools/git/push-branch", post(push_branch::<R, H>))
        .route("/tools/git/create-pr", post(create_pr::<R, H>))
        .route("/tools/git/workflow-status", post(workflow_status::<R, H>))
        .route("/tools/git/status", get(repo_status::<R, H>))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// Bind `addr` and serve until Ctrl-C or SIGTERM.
pub async fn serve<R, H>(app: Arc<App<R, H>>, addr: SocketAddr) -> Result<()>
where
    R: CommandRunner + 'static,
    H: GithubOps + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::SignalKind;
        match tokio::signal::unix::signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutting down");
}

// -----------------------------------------------------------------------------
// Handlers

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn create_branch<R: CommandRunner, H: GithubOps>(
    State(app): Shared<R, H>,
    Json(request): Json<CreateBranchRequest>,
) -> Json<ToolResponse<BranchData>> {
    Json(app.create_branch(&request).await)
}

async fn commit_files<R: CommandRunner, H: GithubOps>(
    State(app): Shared<R, H>,
    Json(request): Json<CommitFilesRequest>,
) -> Json<ToolResponse<CommitData>> {
    Json(app.commit_files(&request).await)
}

async fn push_branch<R: CommandRunner, H: GithubOps>(
    State(app): Shared<R, H>,
    Json(request): Json<PushBranchRequest>,
) -> Json<ToolResponse<BranchData>> {
    Json(app.push_branch(&request).await)
}

async fn create_pr<R: CommandRunner, H: GithubOps>(
    State(app): Shared<R, H>,
    Json(request): Json<CreatePrRequest>,
) -> Json<ToolResponse<PullRequestData>> {
    Json(app.create_pull_request(&request).await)
}

async fn workflow_status<R: CommandRunner, H: GithubOps>(
    State(app): Shared<R, H>,
    Json(request): Json<WorkflowStatusRequest>,
) -> Json<ToolResponse<WorkflowStatusData>> {
    Json(app.get_workflow_status(&request).await)
}

async fn repo_status<R: CommandRunner, H: GithubOps>(
    State(app): Shared<R, H>,
) -> Json<ToolResponse<RepoStatusData>> {
    Json(app.repo_status().await)
}

// -----------------------------------------------------------------------------
// Tool catalog

async fn catalog() -> Json<Value> {
    Json(tool_catalog())
}

/// Names, descriptions and input schemas of the tools, for agents that
/// register them as callable functions.
pub fn tool_catalog() -> Value {
    json!({
        "tools": [
            {
                "name": "create_branch",
                "description": "Create a new branch from a base branch and check it out",
                "method": "POST",
                "path": "/tools/git/create-branch",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "branch_name": {"type": "string", "description": "Name of the branch to create"},
                        "base_branch": {"type": "string", "description": "Branch to start from", "default": "main"}
                    },
                    "required": ["branch_name"]
                }
            },
            {
                "name": "commit_files",
                "description": "Write files, commit them on a branch and optionally push",
                "method": "POST",
                "path": "/tools/git/commit-files",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "branch_name": {"type": "string", "description": "Branch to commit on"},
                        "files": {
                            "type": "array",
                            "description": "Files to write, with paths relative to the repository root",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "path": {"type": "string"},
                                    "content": {"type": "string"}
                                },
                                "required": ["path", "content"]
                            }
                        },
                        "commit_message": {"type": "string", "description": "Commit message"},
                        "push": {"type": "boolean", "description": "Push after committing", "default": true}
                    },
                    "required": ["branch_name", "files", "commit_message"]
                }
            },
            {
                "name": "push_branch",
                "description": "Push a branch to the remote and set its upstream",
                "method": "POST",
                "path": "/tools/git/push-branch",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "branch_name": {"type": "string", "description": "Branch to push"}
                    },
                    "required": ["branch_name"]
                }
            },
            {
                "name": "create_pr",
                "description": "Open a GitHub pull request",
                "method": "POST",
                "path": "/tools/git/create-pr",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string", "description": "Pull request title"},
                        "description": {"type": "string", "description": "Pull request body"},
                        "branch_name": {"type": "string", "description": "Head branch"},
                        "base_branch": {"type": "string", "description": "Branch to merge into", "default": "main"}
                    },
                    "required": ["title", "description", "branch_name"]
                }
            },
            {
                "name": "workflow_status",
                "description": "List the CI workflow runs for a pull request's head commit",
                "method": "POST",
                "path": "/tools/git/workflow-status",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "pr_number": {"type": "integer", "minimum": 1, "description": "Pull request number"}
                    },
                    "required": ["pr_number"]
                }
            },
            {
                "name": "repo_status",
                "description": "Current branch, HEAD commit and working tree status",
                "method": "GET",
                "path": "/tools/git/status",
                "input_schema": {"type": "object", "properties": {}}
            }
        ]
    })
}
