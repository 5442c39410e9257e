//! Auth configuration types
//!
//! These types represent the runtime auth configuration after the
//! credential has been resolved from an account entry or a CLI flag.

use crate::types::AuthScheme;
use base64::Engine as _;

/// Authentication configuration (after credential resolution)
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// HTTP Basic authentication with a pre-encoded credential
    Basic {
        /// Value placed after `Basic `
        credential: String,
    },

    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },

    /// Credential sent verbatim in a named header
    Header {
        /// Header name
        name: String,
        /// Header value
        value: String,
    },
}

impl AuthConfig {
    /// Build an auth config from a scheme and an opaque credential
    pub fn from_scheme(
        scheme: AuthScheme,
        credential: impl Into<String>,
        header_name: Option<&str>,
    ) -> Self {
        let credential = credential.into();
        match scheme {
            AuthScheme::Basic => Self::Basic { credential },
            AuthScheme::Bearer => Self::Bearer { token: credential },
            AuthScheme::Header => Self::Header {
                name: header_name.unwrap_or("Authorization").to_string(),
                value: credential,
            },
        }
    }

    /// Build a Basic credential by encoding `username:password`
    pub fn basic_from_parts(username: &str, password: &str) -> Self {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
        Self::Basic {
            credential: encoded,
        }
    }

    /// Check if any credential is configured
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { .. } => f.write_str("Basic { credential: \"***\" }"),
            Self::Bearer { .. } => f.write_str("Bearer { token: \"***\" }"),
            Self::Header { name, .. } => f
                .debug_struct("Header")
                .field("name", name)
                .field("value", &"***")
                .finish(),
        }
    }
}
