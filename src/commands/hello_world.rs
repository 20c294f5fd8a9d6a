use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::App;
use crate::clients::github::GithubOps;
use crate::clients::runner::CommandRunner;
use crate::error::ToolError;
use crate::types::CommitFilesRequest;
use crate::types::CreateBranchRequest;
use crate::types::FileContent;
use crate::types::HelloWorldData;
use crate::types::ToolResponse;

pub const HELLO_WORLD_BRANCH: &str = "feature/hello-world";

const HELLO_MODULE: &str = r#""""Hello world module."""


def hello_world() -> str:
    """Return a friendly greeting."""
    return "Hello from forgebot!"
"#;

const HELLO_TEST: &str = r#""""Test hello world module."""
from hello import hello_world


def test_hello_world():
    """Test hello_world function."""
    assert hello_world() == "Hello from forgebot!"
"#;

const PR_TITLE: &str = "Add hello world function";

const PR_BODY: &str = "This PR adds a basic hello world function with tests.

Changes:
- Add hello_world() function in src/hello.py
- Add corresponding test in tests/test_hello.py";

#[derive(Debug, Clone)]
pub struct HelloWorldRequest {
    pub base_branch: String,
    /// Stay on the feature branch instead of returning to the original one.
    pub stay_on_branch: bool,
    pub open_pr: bool,
}

impl<R: CommandRunner, H: GithubOps> App<R, H> {
    /// End-to-end demo of the workflow.
    ///
    /// Creates `feature/hello-world` from the base branch, commits and pushes a
    /// small Python module with its test, returns to the branch that was
    /// checked out before (unless asked to stay) and opens a pull request when
    /// requested.
    #[instrument(skip_all, fields(base = %request.base_branch))]
    pub async fn hello_world(&self, request: &HelloWorldRequest) -> ToolResponse<HelloWorldData> {
        match self.run_hello_world(request).await {
            Ok(data) => {
                info!(commit_sha = %data.commit_sha, "Created hello world example");
                ToolResponse::success(
                    format!("Created hello world example on branch: {}", data.branch_name),
                    data,
                )
            }
            Err(err) => {
                warn!(error = %err, "Failed to create hello world example");
                ToolResponse::failure("Failed to create hello world example", err)
            }
        }
    }

    async fn run_hello_world(&self, request: &HelloWorldRequest) -> Result<HelloWorldData, ToolError> {
        let (original_branch, commit_sha) = {
            let _guard = self.lock_repo().await;
            let original_branch = self.git.current_branch().await?;

            self.create_branch_steps(&CreateBranchRequest {
                branch_name: HELLO_WORLD_BRANCH.to_string(),
                base_branch: request.base_branch.clone(),
            })
            .await?;
            let commit_sha = self
                .commit_files_steps(&CommitFilesRequest {
                    branch_name: HELLO_WORLD_BRANCH.to_string(),
                    files: vec![
                        FileContent {
                            path: "src/hello.py".to_string(),
                            content: HELLO_MODULE.to_string(),
                        },
                        FileContent {
                            path: "tests/test_hello.py".to_string(),
                            content: HELLO_TEST.to_string(),
                        },
                    ],
                    commit_message: "Add hello world function with tests".to_string(),
                    push: true,
                })
                .await?;

            if !request.stay_on_branch {
                self.git.checkout(&original_branch).await?;
            }
            (original_branch, commit_sha)
        };

        let pr_url = if request.open_pr {
            let pr = self
                .gh
                .create_pull_request(PR_TITLE, PR_BODY, HELLO_WORLD_BRANCH, &request.base_branch)
                .await?;
            Some(pr.html_url)
        } else {
            None
        };

        Ok(HelloWorldData {
            branch_name: HELLO_WORLD_BRANCH.to_string(),
            commit_sha,
            original_branch,
            pr_url,
        })
    }
}
