//! Client modules for the external systems that `forgebot` drives.
//!
//! - [`runner`]: Process runner that executes external commands and normalizes their outcome
//! - [`git`]: Git command facade, one method per git subcommand
//! - [`github`]: GitHub REST API client for pull requests and workflow runs
//!
//! The runner and the GitHub client sit behind traits so the layers above them
//! can be tested without spawning processes or reaching the network.

pub mod git;
pub mod github;
pub mod runner;
