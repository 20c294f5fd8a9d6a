use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::App;
use crate::clients::github::GithubOps;
use crate::clients::runner::CommandRunner;
use crate::types::ToolResponse;
use crate::types::WorkflowStatusData;
use crate::types::WorkflowStatusRequest;

impl<R: CommandRunner, H: GithubOps> App<R, H> {
    /// Report the CI workflow runs for a pull request's head commit.
    #[instrument(skip_all, fields(pr_number = request.pr_number))]
    pub async fn get_workflow_status(
        &self,
        request: &WorkflowStatusRequest,
    ) -> ToolResponse<WorkflowStatusData> {
        match self.gh.workflow_runs_for_pr(request.pr_number).await {
            Ok(workflow_runs) => {
                info!(runs = workflow_runs.len(), "Retrieved workflow status");
                ToolResponse::success(
                    format!("Retrieved workflow status for PR #{}", request.pr_number),
                    WorkflowStatusData {
                        pr_number: request.pr_number,
                        workflow_runs,
                    },
                )
            }
            Err(err) => {
                warn!(error = %err, "Failed to get workflow status");
                ToolResponse::failure("Failed to get workflow status", err)
            }
        }
    }
}
