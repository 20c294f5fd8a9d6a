//! Tool operations exposed over HTTP and the CLI.
//!
//! Each tool is an explicit sequence of git facade or GitHub client calls that
//! stops at the first failing step and reports it in a
//! [`ToolResponse`](crate::types::ToolResponse). Side effects of the steps that
//! already ran (branches, written files, commits) are left in place.

mod commit_files;
mod create_branch;
mod create_pr;
mod hello_world;
mod push_branch;
mod repo_status;
mod workflow_status;

pub use hello_world::HELLO_WORLD_BRANCH;
pub use hello_world::HelloWorldRequest;
