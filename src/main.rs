use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use clap::Parser;
use clap::Subcommand;
use forgebot::App;
use forgebot::Config;
use forgebot::commands::HelloWorldRequest;
use forgebot::logging::LogOptions;
use forgebot::logging::setup_logging;
use forgebot::output::write_response;
use forgebot::types::CommitFilesRequest;
use forgebot::types::CreateBranchRequest;
use forgebot::types::CreatePrRequest;
use forgebot::types::DEFAULT_BASE_BRANCH;
use forgebot::types::FileContent;
use forgebot::types::PushBranchRequest;
use forgebot::types::ToolResponse;
use forgebot::types::WorkflowStatusRequest;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "forgebot", version)]
#[command(about = "Git and GitHub workflow tools for AI agents", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(flatten)]
    pub log: LogOptions,

    /// Print the raw JSON response envelope
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the tools over HTTP
    Serve {
        #[arg(long, env = "FORGEBOT_ADDR", default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
    /// Create a branch from a base branch and check it out
    CreateBranch {
        branch: String,
        #[arg(long, default_value = DEFAULT_BASE_BRANCH)]
        base: String,
    },
    /// Write files, commit them on a branch and push
    CommitFiles {
        branch: String,
        /// Commit message
        #[arg(short, long)]
        message: String,
        /// File to commit, as DEST=SOURCE (DEST is relative to the repository)
        #[arg(long = "file", value_name = "DEST=SOURCE", required = true, value_parser = parse_file_arg)]
        files: Vec<(String, PathBuf)>,
        /// Commit without pushing
        #[arg(long)]
        no_push: bool,
    },
    /// Push a branch and set its upstream
    PushBranch { branch: String },
    /// Open a pull request for a branch
    CreatePr {
        branch: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = DEFAULT_BASE_BRANCH)]
        base: String,
    },
    /// Show CI workflow runs for a pull request
    WorkflowStatus { pr_number: u64 },
    /// Show the current branch, commit and working tree status
    Status,
    /// Run the whole workflow on a hello world example
    HelloWorld {
        /// Stay on the new branch instead of returning to the current one
        #[arg(long)]
        stay_on_branch: bool,
        #[arg(long, default_value = DEFAULT_BASE_BRANCH)]
        base: String,
    },
}

fn parse_file_arg(value: &str) -> Result<(String, PathBuf)> {
    let (dest, source) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("expected DEST=SOURCE, got `{}`", value))?;
    if dest.is_empty() || source.is_empty() {
        return Err(anyhow!("expected DEST=SOURCE, got `{}`", value));
    }
    Ok((dest.to_string(), PathBuf::from(source)))
}

async fn read_files(files: Vec<(String, PathBuf)>) -> Result<Vec<FileContent>> {
    let mut contents = Vec::with_capacity(files.len());
    for (path, source) in files {
        let content = tokio::fs::read_to_string(&source)
            .await
            .with_context(|| format!("Failed to read {}", source.display()))?;
        contents.push(FileContent { path, content });
    }
    Ok(contents)
}

fn report<T: Serialize>(response: ToolResponse<T>, json: bool) -> Result<ExitCode> {
    write_response(&response, json, &mut std::io::stdout())?;
    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(&cli.log)?;

    let config = cli.config.resolve().await?;
    let open_pr = config.github_token.is_some();
    let app = App::from_config(&config);
    let json = cli.json;

    match cli.command {
        Commands::Serve { addr } => {
            forgebot::server::serve(Arc::new(app), addr).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::CreateBranch { branch, base } => {
            let request = CreateBranchRequest {
                branch_name: branch,
                base_branch: base,
            };
            report(app.create_branch(&request).await, json)
        }
        Commands::CommitFiles {
            branch,
            message,
            files,
            no_push,
        } => {
            let request = CommitFilesRequest {
                branch_name: branch,
                files: read_files(files).await?,
                commit_message: message,
                push: !no_push,
            };
            report(app.commit_files(&request).await, json)
        }
        Commands::PushBranch { branch } => {
            let request = PushBranchRequest {
                branch_name: branch,
            };
            report(app.push_branch(&request).await, json)
        }
        Commands::CreatePr {
            branch,
            title,
            description,
            base,
        } => {
            let request = CreatePrRequest {
                title,
                description,
                branch_name: branch,
                base_branch: base,
            };
            report(app.create_pull_request(&request).await, json)
        }
        Commands::WorkflowStatus { pr_number } => {
            let request = WorkflowStatusRequest { pr_number };
            report(app.get_workflow_status(&request).await, json)
        }
        Commands::Status => report(app.repo_status().await, json),
        Commands::HelloWorld {
            stay_on_branch,
            base,
        } => {
            let request = HelloWorldRequest {
                base_branch: base,
                stay_on_branch,
                open_pr,
            };
            report(app.hello_world(&request).await, json)
        }
    }
}
