use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::App;
use crate::app::checked_ref_names;
use crate::clients::github::GithubOps;
use crate::clients::runner::CommandRunner;
use crate::error::ToolError;
use crate::types::BranchData;
use crate::types::CreateBranchRequest;
use crate::types::ToolResponse;

impl<R: CommandRunner, H: GithubOps> App<R, H> {
    /// Create a branch from an up-to-date base branch and check it out.
    ///
    /// 1. Check out the base branch.
    /// 2. Pull the base branch from the remote.
    /// 3. Create the new branch from it.
    /// 4. Check out the new branch.
    #[instrument(skip_all, fields(branch = %request.branch_name, base = %request.base_branch))]
    pub async fn create_branch(&self, request: &CreateBranchRequest) -> ToolResponse<BranchData> {
        let result = {
            let _guard = self.lock_repo().await;
            self.create_branch_steps(request).await
        };

        match result {
            Ok(()) => {
                info!("Created branch");
                ToolResponse::success(
                    format!("Created and checked out branch: {}", request.branch_name),
                    BranchData {
                        branch_name: request.branch_name.clone(),
                    },
                )
            }
            Err(err) => {
                warn!(error = %err, "Failed to create branch");
                ToolResponse::failure("Failed to create branch", err)
            }
        }
    }

    /// Callers must hold the repository lock.
    pub(crate) async fn create_branch_steps(
        &self,
        request: &CreateBranchRequest,
    ) -> Result<(), ToolError> {
        checked_ref_names([
            self.remote(),
            request.base_branch.as_str(),
            request.branch_name.as_str(),
        ])?;

        self.git.checkout(&request.base_branch).await?;
        self.git
            .pull(self.remote(), Some(&request.base_branch))
            .await?;
        self.git.create_branch(&request.branch_name).await?;
        self.git.checkout(&request.branch_name).await?;
        Ok(())
    }
}
