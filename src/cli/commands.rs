//! CLI commands and argument parsing

use crate::types::AuthScheme;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Rate-limit-aware GraphQL client for agent skills
#[derive(Parser, Debug)]
#[command(name = "skillkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Environment name from the config's `environments`
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Endpoint URL (overrides environment and account)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Account name from the config's `accounts`
    #[arg(short, long, global = true)]
    pub account: Option<String>,

    /// Account name inferred by the caller (used only if it exists)
    #[arg(long, global = true)]
    pub infer_account: Option<String>,

    /// Credential (overrides accounts)
    #[arg(long, global = true)]
    pub credential: Option<String>,

    /// How `--credential` is sent
    #[arg(long, global = true, value_enum, default_value = "bearer")]
    pub auth_scheme: AuthScheme,

    /// Retries after the first attempt
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Give up after this many seconds (checked between attempts)
    #[arg(long, global = true)]
    pub deadline: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one query or mutation and print the response body
    Query {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Fetch every page of a cursor-paginated connection
    Paginate {
        #[command(flatten)]
        query: QueryArgs,

        /// Dot path to the connection inside `data` (e.g. business.clients)
        #[arg(long)]
        collection_path: String,

        /// Items per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Safety valve on page count
        #[arg(long)]
        max_pages: Option<u32>,

        /// Fail instead of printing a truncated result
        #[arg(long)]
        strict: bool,
    },

    /// List configured accounts
    Accounts,

    /// List configured environments
    Environments,
}

/// Query text and variables
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Inline query or mutation
    #[arg(short, long, conflicts_with = "query_file", required_unless_present = "query_file")]
    pub query: Option<String>,

    /// File containing the query or mutation
    #[arg(long)]
    pub query_file: Option<PathBuf>,

    /// Variables as a JSON object
    #[arg(long)]
    pub variables: Option<String>,
}
