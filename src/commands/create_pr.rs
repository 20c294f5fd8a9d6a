use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::App;
use crate::clients::github::GithubOps;
use crate::clients::runner::CommandRunner;
use crate::types::CreatePrRequest;
use crate::types::PullRequestData;
use crate::types::ToolResponse;

impl<R: CommandRunner, H: GithubOps> App<R, H> {
    /// Open a pull request from `branch_name` into `base_branch`.
    #[instrument(skip_all, fields(branch = %request.branch_name, base = %request.base_branch))]
    pub async fn create_pull_request(&self, request: &CreatePrRequest) -> ToolResponse<PullRequestData> {
        let result = self
            .gh
            .create_pull_request(
                &request.title,
                &request.description,
                &request.branch_name,
                &request.base_branch,
            )
            .await;

        match result {
            Ok(pr) => {
                info!(pr_number = pr.number, pr_url = %pr.html_url, "Created pull request");
                ToolResponse::success(
                    format!("Created pull request: {}", pr.title),
                    PullRequestData {
                        pr_number: pr.number,
                        pr_url: pr.html_url,
                        branch: request.branch_name.clone(),
                    },
                )
            }
            Err(err) => {
                warn!(error = %err, "Failed to create pull request");
                ToolResponse::failure("Failed to create pull request", err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use crate::clients::github::GithubError;
    use crate::clients::github::MockGithubOps;
    use crate::clients::github::PullRequest;
    use crate::clients::runner::MockCommandRunner;
    use crate::commands::testing;
    use crate::types::CreatePrRequest;

    fn request() -> CreatePrRequest {
        CreatePrRequest {
            title: "Add widget".to_string(),
            description: "Adds a widget".to_string(),
            branch_name: "feature/widget".to_string(),
            base_branch: "main".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_pull_request_success() {
        let mut gh = MockGithubOps::new();
        gh.expect_create_pull_request()
            .with(
                eq("Add widget"),
                eq("Adds a widget"),
                eq("feature/widget"),
                eq("main"),
            )
            .times(1)
            .returning(|title, _, _, _| {
                Ok(PullRequest {
                    number: 42,
                    html_url: "https://github.com/octo/widgets/pull/42".to_string(),
                    title: title.to_string(),
                })
            });

        // No git commands are involved.
        let app = testing::app(std::path::Path::new("/repo"), MockCommandRunner::new(), gh);
        let response = app.create_pull_request(&request()).await;

        assert!(response.is_success());
        assert_eq!(response.message(), "Created pull request: Add widget");
        let data = response.data().unwrap();
        assert_eq!(data.pr_number, 42);
        assert_eq!(data.pr_url, "https://github.com/octo/widgets/pull/42");
        assert_eq!(data.branch, "feature/widget");
    }

    #[tokio::test]
    async fn test_create_pull_request_failure() {
        let mut gh = MockGithubOps::new();
        gh.expect_create_pull_request()
            .returning(|_, _, _, _| Err(GithubError::NotFound("Not Found".to_string())));

        let app = testing::app(std::path::Path::new("/repo"), MockCommandRunner::new(), gh);
        let response = app.create_pull_request(&request()).await;

        assert!(!response.is_success());
        assert_eq!(response.message(), "Failed to create pull request");
        assert_eq!(response.error(), Some("not found: Not Found"));
    }
}
