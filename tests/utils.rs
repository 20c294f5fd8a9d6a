#![allow(dead_code)]

use std::path::Path;

use tokio::process::Command;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer as _;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Run git in `dir` and return its trimmed stdout.
pub async fn git(dir: &Path, args: &[&str]) -> anyhow::Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await?;
    anyhow::ensure!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(String::from_utf8(output.stdout)?.trim_end().to_string())
}

/// Creates a git repository with one commit on `main`.
///
/// The directory should already exist.
pub async fn create_git_repo(dir: &Path) -> anyhow::Result<()> {
    git(dir, &["init", "-b", "main"]).await?;
    configure_identity(dir).await?;

    tokio::fs::write(dir.join("README.md"), "# widgets\n").await?;
    git(dir, &["add", "README.md"]).await?;
    git(dir, &["commit", "-m", "Initial commit"]).await?;

    Ok(())
}

async fn configure_identity(dir: &Path) -> anyhow::Result<()> {
    git(dir, &["config", "user.name", "Test User"]).await?;
    git(dir, &["config", "user.email", "test@example.com"]).await?;
    git(dir, &["config", "pull.rebase", "false"]).await?;
    Ok(())
}

/// Creates a bare repository to act as the remote.
pub async fn create_bare_remote(dir: &Path) -> anyhow::Result<()> {
    git(dir, &["init", "--bare", "-b", "main"]).await?;
    Ok(())
}

/// Adds `remote_url` as origin and publishes `main` to it.
pub async fn setup_git_remote(dir: &Path, remote_url: &str) -> anyhow::Result<()> {
    git(dir, &["remote", "add", "origin", remote_url]).await?;
    git(dir, &["push", "-u", "origin", "main"]).await?;
    Ok(())
}

/// Pushes a commit adding `filename` to the remote's `main` from a separate
/// clone, so the working repository falls behind.
pub async fn advance_remote(
    remote: &Path,
    scratch: &Path,
    filename: &str,
    contents: &str,
) -> anyhow::Result<()> {
    let remote_url = remote.to_string_lossy();
    let scratch_path = scratch.to_string_lossy();
    let parent = scratch.parent().unwrap_or(scratch);
    git(parent, &["clone", "-b", "main", &remote_url, &scratch_path]).await?;
    configure_identity(scratch).await?;

    tokio::fs::write(scratch.join(filename), contents).await?;
    git(scratch, &["add", filename]).await?;
    git(scratch, &["commit", "-m", &format!("Add {}", filename)]).await?;
    git(scratch, &["push", "origin", "main"]).await?;
    Ok(())
}

/// Installs a pre-receive hook in a bare remote that declines every push.
#[cfg(unix)]
pub async fn install_rejecting_hook(remote: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt as _;

    let hook = remote.join("hooks").join("pre-receive");
    tokio::fs::create_dir_all(remote.join("hooks")).await?;
    tokio::fs::write(&hook, "#!/bin/sh\necho 'pushes are frozen' >&2\nexit 1\n").await?;
    tokio::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755)).await?;
    Ok(())
}

pub fn setup_logging() -> anyhow::Result<()> {
    let timer = tracing_subscriber::fmt::time::ChronoLocal::new("%H:%M:%S%.3f".into());
    let format = tracing_subscriber::fmt::format().with_timer(timer);
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env()?;
    let subscriber = tracing_subscriber::fmt::layer()
        .event_format(format)
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(filter);
    tracing_subscriber::registry().with(subscriber).try_init()?;
    Ok(())
}

pub enum TestDir {
    Temp(tempfile::TempDir),
    Kept(std::path::PathBuf),
}

impl TestDir {
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;

        if std::env::var("DEBUG_TESTS").is_ok() {
            let path = temp_dir.keep();
            eprintln!("Test directory kept at: {}", path.display());
            Ok(TestDir::Kept(path))
        } else {
            Ok(TestDir::Temp(temp_dir))
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            TestDir::Temp(t) => t.path(),
            TestDir::Kept(p) => p.as_path(),
        }
    }
}
