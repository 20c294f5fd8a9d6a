use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::App;
use crate::app::checked_ref_names;
use crate::clients::github::GithubOps;
use crate::clients::runner::CommandRunner;
use crate::error::ToolError;
use crate::types::BranchData;
use crate::types::PushBranchRequest;
use crate::types::ToolResponse;

impl<R: CommandRunner, H: GithubOps> App<R, H> {
    /// Push a branch to the remote and set its upstream.
    #[instrument(skip_all, fields(branch = %request.branch_name))]
    pub async fn push_branch(&self, request: &PushBranchRequest) -> ToolResponse<BranchData> {
        let result = self.push_branch_steps(&request.branch_name).await;

        match result {
            Ok(()) => {
                info!("Pushed branch");
                ToolResponse::success(
                    format!("Pushed branch: {}", request.branch_name),
                    BranchData {
                        branch_name: request.branch_name.clone(),
                    },
                )
            }
            Err(err) => {
                warn!(error = %err, remote_rejected = err.is_remote_rejected(), "Failed to push branch");
                ToolResponse::failure("Failed to push branch", err)
            }
        }
    }

    async fn push_branch_steps(&self, branch_name: &str) -> Result<(), ToolError> {
        checked_ref_names([self.remote(), branch_name])?;

        let _guard = self.lock_repo().await;
        self.git.push(self.remote(), branch_name).await?;
        Ok(())
    }
}
