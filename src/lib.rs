//! # skillkit
//!
//! Shared request plumbing for agent skill scripts that call vendor
//! GraphQL/REST APIs and print normalized JSON.
//!
//! ## Features
//!
//! - **Request Engine**: One logical request with a shared retry budget for
//!   HTTP 429/5xx, network failures, unparseable bodies, and in-body
//!   rate-limit errors
//! - **Server Guidance**: `Retry-After` headers and `wait Nms` hints override
//!   computed backoff
//! - **Pagination Walker**: Relay cursor pagination with a page-count safety valve
//! - **Accounts**: Pure resolution of multi-account credential maps
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use skillkit::auth::AuthConfig;
//! use skillkit::http::{EngineConfig, RequestEngine};
//! use skillkit::pagination::{PaginationOptions, PaginationWalker};
//! use skillkit::{JsonObject, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let auth = AuthConfig::Bearer { token: "...".into() };
//!     let engine = RequestEngine::new(EngineConfig::default(), auth)?;
//!
//!     let clients = PaginationWalker::new(engine)
//!         .fetch_all_pages(
//!             "https://api.example.com/graphql",
//!             "query($first: Int!, $after: String) { clients(first: $first, after: $after) { edges { node { id } } pageInfo { hasNextPage endCursor } } }",
//!             "clients",
//!             &JsonObject::new(),
//!             &PaginationOptions::default(),
//!         )
//!         .await?;
//!
//!     println!("{}", serde_json::to_string(&clients)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  CLI (query / paginate)                   │
//! └──────────────────────────────────────────────────────────┘
//!              │                              │
//! ┌────────────┴────────────┐   ┌─────────────┴─────────────┐
//! │   Pagination Walker     │──▶│      Request Engine        │
//! │ cursor, accumulation,   │   │ retry, backoff, rate-limit │
//! │ safety valve            │   │ signals, throttle, auth    │
//! └─────────────────────────┘   └────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Credentials and account resolution
pub mod auth;

/// Request engine with retry and rate-limit handling
pub mod http;

/// Cursor pagination
pub mod pagination;

/// Skill configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::SkillConfig;
pub use http::{GraphqlRequest, GraphqlResponse, RequestEngine, RequestOptions};
pub use pagination::{PageCollection, PaginationOptions, PaginationWalker};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
