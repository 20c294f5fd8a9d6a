use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::App;
use crate::app::checked_ref_names;
use crate::app::checked_relative_path;
use crate::clients::github::GithubOps;
use crate::clients::runner::CommandRunner;
use crate::error::ToolError;
use crate::types::CommitData;
use crate::types::CommitFilesRequest;
use crate::types::ToolResponse;

impl<R: CommandRunner, H: GithubOps> App<R, H> {
    /// Write files onto a branch and commit them, optionally pushing.
    ///
    /// 1. Check out the branch.
    /// 2. For each file: write it under the repository root, then stage it.
    /// 3. Commit and read the new commit SHA.
    /// 4. Push the branch if requested.
    #[instrument(skip_all, fields(branch = %request.branch_name, files = request.files.len(), push = request.push))]
    pub async fn commit_files(&self, request: &CommitFilesRequest) -> ToolResponse<CommitData> {
        let result = {
            let _guard = self.lock_repo().await;
            self.commit_files_steps(request).await
        };

        match result {
            Ok(commit_sha) => {
                info!(%commit_sha, "Committed files");
                ToolResponse::success(
                    format!("Committed files to branch: {}", request.branch_name),
                    CommitData {
                        branch_name: request.branch_name.clone(),
                        commit_sha,
                        pushed: request.push,
                    },
                )
            }
            Err(err) => {
                warn!(error = %err, "Failed to commit files");
                ToolResponse::failure("Failed to commit files", err)
            }
        }
    }

    /// Callers must hold the repository lock. Returns the new commit SHA.
    pub(crate) async fn commit_files_steps(
        &self,
        request: &CommitFilesRequest,
    ) -> Result<String, ToolError> {
        checked_ref_names([self.remote(), request.branch_name.as_str()])?;
        for file in &request.files {
            checked_relative_path(&file.path)?;
        }

        self.git.checkout(&request.branch_name).await?;

        for file in &request.files {
            self.write_file(file).await?;
            self.git.add(&file.path).await?;
        }

        self.git.commit(&request.commit_message).await?;
        let commit_sha = self.git.current_commit_sha().await?;

        if request.push {
            self.git.push(self.remote(), &request.branch_name).await?;
        }

        Ok(commit_sha)
    }
}
