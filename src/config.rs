use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Result;
use anyhow::bail;
use regex::Regex;
use tracing::debug;
use tracing::info;

use crate::clients::git::GitClient;
use crate::clients::git::GitConfig;
use crate::clients::github::DEFAULT_API_URL;

pub const DEFAULT_REMOTE: &str = "origin";

static GITHUB_REMOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:git@github\.com:|ssh://git@github\.com/|https?://(?:[^@/]+@)?github\.com/)([^/]+)/([^/]+?)(?:\.git)?/?$",
    )
    .expect("valid regex")
});

/// Runtime configuration, from flags or the environment.
#[derive(Clone, clap::Args)]
pub struct Config {
    /// Path to the git repository to operate on
    #[arg(long, env = "FORGEBOT_REPO_PATH", default_value = ".", global = true)]
    pub repo_path: PathBuf,

    /// Git executable to invoke
    #[arg(long, env = "FORGEBOT_GIT_BIN", default_value = "git", global = true)]
    pub git_bin: String,

    /// Remote to pull from and push to
    #[arg(long, env = "FORGEBOT_REMOTE", default_value = DEFAULT_REMOTE, global = true)]
    pub remote: String,

    /// GitHub token used for pull requests and workflow runs
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub github_token: Option<String>,

    /// GitHub repository as owner/name (defaults to the remote's URL)
    #[arg(long, env = "GITHUB_REPO", global = true)]
    pub github_repo: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub github_api_url: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("repo_path", &self.repo_path)
            .field("git_bin", &self.git_bin)
            .field("remote", &self.remote)
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .field("github_repo", &self.github_repo)
            .field("github_api_url", &self.github_api_url)
            .finish()
    }
}

impl Config {
    /// Create a config with explicit values (useful for tests)
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            git_bin: "git".to_string(),
            remote: DEFAULT_REMOTE.to_string(),
            github_token: None,
            github_repo: None,
            github_api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn git_config(&self) -> GitConfig {
        GitConfig::new(&self.repo_path).with_git_bin(&self.git_bin)
    }

    /// Check the repository path and fill in `github_repo` from the remote URL
    /// when it was not given. A repository that cannot be determined is left
    /// unset; GitHub calls report it when they are made.
    pub async fn resolve(mut self) -> Result<Self> {
        if !self.repo_path.is_dir() {
            bail!(
                "Repository path does not exist or is not a directory: {}",
                self.repo_path.display()
            );
        }

        if self.github_repo.is_none() {
            let git = GitClient::new(self.git_config());
            let key = format!("remote.{}.url", self.remote);
            match git.config_value(&key).await {
                Ok(Some(url)) => {
                    self.github_repo = parse_github_remote(&url);
                    if let Some(repo) = &self.github_repo {
                        info!(%repo, "Detected GitHub repository from remote");
                    } else {
                        debug!(%url, "Remote URL is not a GitHub URL");
                    }
                }
                Ok(None) => debug!(remote = %self.remote, "Remote has no URL"),
                Err(err) => debug!(error = %err, "Could not read remote URL"),
            }
        }

        Ok(self)
    }
}

/// Parse `owner/name` out of a GitHub remote URL.
///
/// Accepts `git@github.com:owner/repo.git`, `ssh://git@github.com/owner/repo`
/// and `https://github.com/owner/repo.git`.
pub fn parse_github_remote(url: &str) -> Option<String> {
    let captures = GITHUB_REMOTE.captures(url.trim())?;
    Some(format!("{}/{}", &captures[1], &captures[2]))
}
