//! CLI module
//!
//! Command-line interface for skill scripts.
//!
//! # Commands
//!
//! - `query` - Execute one query or mutation
//! - `paginate` - Fetch every page of a connection
//! - `accounts` - List configured accounts
//! - `environments` - List configured environments
//!
//! JSON results go to stdout; diagnostics go to stderr through tracing.

mod commands;
mod runner;

pub use commands::{Cli, Commands, QueryArgs};
pub use runner::Runner;
