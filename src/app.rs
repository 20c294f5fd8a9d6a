use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tokio::sync::MutexGuard;

use crate::clients::git::GitClient;
use crate::clients::github::GithubClient;
use crate::clients::github::GithubOps;
use crate::clients::runner::CommandRunner;
use crate::clients::runner::ProcessRunner;
use crate::config::Config;
use crate::config::DEFAULT_REMOTE;
use crate::error::ToolError;
use crate::types::FileContent;

/// Tool entry points for one repository.
///
/// Write operations hold `repo_lock` for their whole step sequence so that
/// concurrent requests never interleave git commands on the same working
/// directory.
pub struct App<R = ProcessRunner, H = GithubClient> {
    pub git: GitClient<R>,
    pub gh: H,
    remote: String,
    repo_lock: Mutex<()>,
}

impl App {
    pub fn from_config(config: &Config) -> Self {
        let gh = GithubClient::new(config.github_token.clone(), config.github_repo.clone())
            .with_api_url(&config.github_api_url);
        Self::new(GitClient::new(config.git_config()), gh).with_remote(&config.remote)
    }
}

impl<R: CommandRunner, H: GithubOps> App<R, H> {
    pub fn new(git: GitClient<R>, gh: H) -> Self {
        Self {
            git,
            gh,
            remote: DEFAULT_REMOTE.to_string(),
            repo_lock: Mutex::new(()),
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }
}

/// Shared helper methods for App
impl<R: CommandRunner, H: GithubOps> App<R, H> {
    pub(crate) async fn lock_repo(&self) -> MutexGuard<'_, ()> {
        self.repo_lock.lock().await
    }

    /// Write `file` under the repository root, creating parent directories.
    pub(crate) async fn write_file(&self, file: &FileContent) -> Result<(), ToolError> {
        let relative = checked_relative_path(&file.path)?;
        let full_path = self.git.repo_path().join(relative);
        self.ensure_inside_repo(&file.path, &full_path).await?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ToolError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&full_path, file.content.as_bytes())
            .await
            .map_err(|source| ToolError::Io {
                path: full_path.clone(),
                source,
            })?;
        Ok(())
    }

    /// Resolve symlinks on the part of `full_path` that already exists and
    /// require the result to stay under the repository root.
    async fn ensure_inside_repo(&self, path: &str, full_path: &Path) -> Result<(), ToolError> {
        let repo = canonicalize(self.git.repo_path()).await?;

        let mut existing = full_path;
        while tokio::fs::symlink_metadata(existing).await.is_err() {
            match existing.parent() {
                Some(parent) => existing = parent,
                None => break,
            }
        }

        if !canonicalize(existing).await?.starts_with(&repo) {
            return Err(ToolError::InvalidPath(path.to_string()));
        }
        Ok(())
    }
}

async fn canonicalize(path: &Path) -> Result<PathBuf, ToolError> {
    tokio::fs::canonicalize(path)
        .await
        .map_err(|source| ToolError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Accept only relative paths that cannot climb out of the repository or be
/// read by git as an option.
pub(crate) fn checked_relative_path(path: &str) -> Result<&Path, ToolError> {
    let candidate = Path::new(path);
    let rejected = candidate.components().any(|c| match c {
        Component::Normal(part) => part.to_string_lossy().starts_with('-'),
        Component::CurDir => false,
        _ => true,
    });
    if path.is_empty() || rejected {
        return Err(ToolError::InvalidPath(path.to_string()));
    }
    Ok(candidate)
}

/// Branch and remote names go into git's argument list as-is, so a leading
/// `-` would be parsed as an option.
pub(crate) fn checked_ref_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ToolError> {
    for name in names {
        if name.is_empty() || name.starts_with('-') {
            return Err(ToolError::InvalidRefName(name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use super::*;
    use crate::clients::git::GitConfig;
    use crate::clients::github::MockGithubOps;
    use crate::clients::runner::CommandError;
    use crate::clients::runner::CommandInvocation;
    use crate::clients::runner::MockCommandRunner;
    use crate::commands::testing;
    use crate::types::CreateBranchRequest;

    #[test]
    fn test_checked_relative_path() {
        assert!(checked_relative_path("a.txt").is_ok());
        assert!(checked_relative_path("src/nested/mod.rs").is_ok());
        assert!(checked_relative_path("./docs/readme.md").is_ok());
        assert!(checked_relative_path("docs/a-b.md").is_ok());

        assert!(checked_relative_path("").is_err());
        assert!(checked_relative_path("/etc/passwd").is_err());
        assert!(checked_relative_path("../outside.txt").is_err());
        assert!(checked_relative_path("src/../../outside.txt").is_err());
        assert!(checked_relative_path("--dry-run").is_err());
        assert!(checked_relative_path("-p").is_err());
        assert!(checked_relative_path("docs/--force").is_err());
    }

    #[test]
    fn test_checked_ref_names() {
        assert!(checked_ref_names(["main", "origin", "feature/x-y"]).is_ok());

        for name in ["", "-f", "--force", "--upload-pack=touch /tmp/x"] {
            match checked_ref_names(["origin", name]) {
                Err(ToolError::InvalidRefName(rejected)) => assert_eq!(rejected, name),
                other => panic!("{:?} accepted: {:?}", name, other),
            }
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_file_refuses_to_follow_symlinks_out_of_repo() {
        let repo = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), repo.path().join("link")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("target.txt"),
            repo.path().join("file-link.txt"),
        )
        .unwrap();
        std::fs::write(outside.path().join("target.txt"), "original").unwrap();

        let app = testing::app(repo.path(), MockCommandRunner::new(), MockGithubOps::new());

        for path in ["link/x.txt", "link/new/dir/y.txt", "file-link.txt"] {
            let file = FileContent {
                path: path.to_string(),
                content: "escaped".to_string(),
            };
            match app.write_file(&file).await {
                Err(ToolError::InvalidPath(rejected)) => assert_eq!(rejected, path),
                other => panic!("{} was written: {:?}", path, other),
            }
        }

        assert!(!outside.path().join("x.txt").exists());
        assert!(!outside.path().join("new").exists());
        assert_eq!(
            std::fs::read_to_string(outside.path().join("target.txt")).unwrap(),
            "original"
        );
    }

    #[tokio::test]
    async fn test_write_file_creates_parent_directories() {
        let repo = tempfile::tempdir().unwrap();
        let app = testing::app(repo.path(), MockCommandRunner::new(), MockGithubOps::new());

        let file = FileContent {
            path: "a/b/c.txt".to_string(),
            content: "nested".to_string(),
        };
        app.write_file(&file).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(repo.path().join("a/b/c.txt")).unwrap(),
            "nested"
        );
    }

    /// Records each git call and yields to the scheduler mid-command, so
    /// unserialized callers would interleave.
    struct YieldingRunner {
        calls: Arc<StdMutex<Vec<String>>>,
    }

    #[async_trait]
    impl CommandRunner for YieldingRunner {
        async fn run(&self, invocation: CommandInvocation) -> Result<String, CommandError> {
            self.calls.lock().unwrap().push(invocation.args().join(" "));
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_concurrent_writes_do_not_interleave() {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let runner = YieldingRunner {
            calls: calls.clone(),
        };
        let app = Arc::new(App::new(
            GitClient::with_runner(GitConfig::new("/repo"), runner),
            MockGithubOps::new(),
        ));

        let request = |branch: &str, base: &str| CreateBranchRequest {
            branch_name: branch.to_string(),
            base_branch: base.to_string(),
        };
        let first = tokio::spawn({
            let app = app.clone();
            async move { app.create_branch(&request("feature/a", "main")).await }
        });
        let second = tokio::spawn({
            let app = app.clone();
            async move { app.create_branch(&request("feature/b", "develop")).await }
        });
        assert!(first.await.unwrap().is_success());
        assert!(second.await.unwrap().is_success());

        let steps_a = [
            "checkout main",
            "pull origin main",
            "checkout -b feature/a",
            "checkout feature/a",
        ];
        let steps_b = [
            "checkout develop",
            "pull origin develop",
            "checkout -b feature/b",
            "checkout feature/b",
        ];
        let a_then_b: Vec<&str> = steps_a.iter().chain(steps_b.iter()).copied().collect();
        let b_then_a: Vec<&str> = steps_b.iter().chain(steps_a.iter()).copied().collect();

        let calls = calls.lock().unwrap().clone();
        assert!(calls == a_then_b || calls == b_then_a, "{:#?}", calls);
    }
}
