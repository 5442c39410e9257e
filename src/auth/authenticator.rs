//! Authenticator implementation
//!
//! Applies a resolved credential to outgoing requests.

use super::types::AuthConfig;
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;

/// Authenticator handles applying authentication to HTTP requests
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Get the auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Apply authentication to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config {
            AuthConfig::None => req,
            AuthConfig::Basic { credential } => {
                req.header(AUTHORIZATION, format!("Basic {credential}"))
            }
            AuthConfig::Bearer { token } => req.bearer_auth(token),
            AuthConfig::Header { name, value } => req.header(name.as_str(), value.as_str()),
        }
    }
}
