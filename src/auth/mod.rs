//! Authentication module
//!
//! Supports: Basic, Bearer, Custom Header
//!
//! The `Authenticator` applies a resolved credential to outgoing requests.
//! `AccountRegistry` maps account names to credentials and picks one from an
//! explicit or inferred selector without touching process state.

mod accounts;
mod authenticator;
mod types;

pub use accounts::{AccountEntry, AccountRegistry};
pub use authenticator::Authenticator;
pub use types::AuthConfig;
