use tracing::instrument;
use tracing::warn;

use crate::App;
use crate::clients::github::GithubOps;
use crate::clients::runner::CommandRunner;
use crate::error::ToolError;
use crate::types::RepoStatusData;
use crate::types::ToolResponse;

impl<R: CommandRunner, H: GithubOps> App<R, H> {
    /// Read-only snapshot of the working copy: branch, HEAD and `git status`.
    #[instrument(skip_all)]
    pub async fn repo_status(&self) -> ToolResponse<RepoStatusData> {
        match self.read_repo_status().await {
            Ok(data) => ToolResponse::success(
                format!("Repository status for branch: {}", data.branch),
                data,
            ),
            Err(err) => {
                warn!(error = %err, "Failed to read repository status");
                ToolResponse::failure("Failed to read repository status", err)
            }
        }
    }

    async fn read_repo_status(&self) -> Result<RepoStatusData, ToolError> {
        Ok(RepoStatusData {
            branch: self.git.current_branch().await?,
            commit_sha: self.git.current_commit_sha().await?,
            status: self.git.status().await?,
        })
    }
}
