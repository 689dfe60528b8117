//! CLI module
//!
//! Command-line interface for calling the WeCom API.
//!
//! # Commands
//!
//! - `token` - Exchange the credentials for an access token
//! - `get-member` / `delete-member` - Single member operations
//! - `invite` - Invite members to join
//! - `departments` - List the department tree
//! - `call` - Call any endpoint with the managed access token

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
