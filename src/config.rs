//! Configuration for skills
//!
//! A skill's settings are one explicit value, loaded from YAML (or JSON,
//! which YAML accepts) and handed to the engine at construction. Nothing
//! here reads process state.

use crate::auth::AccountRegistry;
use crate::error::{Error, Result};
use crate::http::{
    validate_endpoint, EngineConfig, RateLimitFallback, RateLimiterConfig, RetryPolicy,
    DEFAULT_RATE_LIMIT_SIGNATURE,
};
use crate::pagination::{PaginationOptions, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use crate::types::{BackoffType, StringMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete skill configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillConfig {
    /// Endpoint URL per environment name (e.g. sandbox, production)
    #[serde(default)]
    pub environments: BTreeMap<String, String>,

    /// Environment used when none is selected
    #[serde(default)]
    pub default_environment: Option<String>,

    /// Named credentials
    #[serde(default)]
    pub accounts: AccountRegistry,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl SkillConfig {
    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse and validate config text (YAML or JSON)
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and endpoint URLs
    pub fn validate(&self) -> Result<()> {
        for (name, url) in &self.environments {
            validate_endpoint(url).map_err(|e| {
                Error::invalid_value(format!("environments.{name}"), e.to_string())
            })?;
        }
        if let Some(default) = &self.default_environment {
            if self.environment_url(default).is_none() {
                return Err(Error::invalid_value(
                    "default_environment",
                    format!("'{default}' is not a configured environment"),
                ));
            }
        }
        for (name, entry) in &self.accounts.entries {
            if let Some(url) = &entry.endpoint {
                validate_endpoint(url).map_err(|e| {
                    Error::invalid_value(format!("accounts.{name}.endpoint"), e.to_string())
                })?;
            }
        }
        if self.http.timeout_seconds == 0 {
            return Err(Error::invalid_value("http.timeout_seconds", "must be at least 1"));
        }
        if self.pagination.page_size == 0 {
            return Err(Error::invalid_value("pagination.page_size", "must be at least 1"));
        }
        if self.pagination.max_pages == 0 {
            return Err(Error::invalid_value("pagination.max_pages", "must be at least 1"));
        }
        if self.retry.backoff.initial_ms > self.retry.backoff.max_ms {
            return Err(Error::invalid_value(
                "retry.backoff",
                "initial_ms must not exceed max_ms",
            ));
        }
        Ok(())
    }

    /// Endpoint for an environment.
    ///
    /// Falls back to `default_environment`, then to the only configured
    /// environment.
    pub fn endpoint(&self, environment: Option<&str>) -> Result<String> {
        let available = || self.environments.keys().cloned().collect::<Vec<_>>();

        let name = match environment.or(self.default_environment.as_deref()) {
            Some(name) => name,
            None => {
                let mut iter = self.environments.values();
                return match (iter.next(), iter.next()) {
                    (Some(url), None) => Ok(url.clone()),
                    (None, _) => Err(Error::missing_field("environments")),
                    _ => Err(Error::missing_field("default_environment")),
                };
            }
        };

        self.environment_url(name)
            .map(str::to_string)
            .ok_or_else(|| Error::UnknownEnvironment {
                name: name.to_string(),
                available: available(),
            })
    }

    /// Look up an environment, ignoring ASCII case
    fn environment_url(&self, name: &str) -> Option<&str> {
        self.environments
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, url)| url.as_str())
    }

    /// Retry policy from the `retry` section
    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = &self.retry;
        RetryPolicy {
            max_retries: retry.max_retries,
            backoff_type: retry.backoff.backoff_type,
            initial_backoff: Duration::from_millis(retry.backoff.initial_ms),
            max_backoff: Duration::from_millis(retry.backoff.max_ms),
            rate_limit_fallback: match retry.rate_limit_fallback {
                FallbackMode::Fixed => {
                    RateLimitFallback::Fixed(Duration::from_millis(retry.rate_limit_fallback_ms))
                }
                FallbackMode::Backoff => RateLimitFallback::Backoff,
            },
            rate_limit_signatures: retry.rate_limit_signatures.clone(),
        }
    }

    /// Engine config from the `http` and `retry` sections
    pub fn engine_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            timeout: Duration::from_secs(self.http.timeout_seconds),
            user_agent: self.http.user_agent.clone().unwrap_or(defaults.user_agent),
            default_headers: self.http.headers.clone(),
            cost_header: self.http.cost_header.clone(),
            retry: self.retry_policy(),
            rate_limit: self.http.rate_limit,
        }
    }

    /// Pagination options from the `pagination` section
    pub fn pagination_options(&self) -> PaginationOptions {
        PaginationOptions::new()
            .page_size(self.pagination.page_size)
            .max_pages(self.pagination.max_pages)
    }
}

impl std::str::FromStr for SkillConfig {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Response header carrying the query cost
    #[serde(default)]
    pub cost_header: Option<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: StringMap,

    /// Client-side throttle
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: None,
            cost_header: None,
            headers: StringMap::new(),
            rate_limit: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

// ============================================================================
// Retry Config
// ============================================================================

/// How to wait on a rate-limit message without a `wait Nms` hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Wait `rate_limit_fallback_ms`
    #[default]
    Fixed,
    /// Use the backoff schedule
    Backoff,
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff schedule
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Fallback for rate-limit messages without a wait hint
    #[serde(default)]
    pub rate_limit_fallback: FallbackMode,

    /// Fixed fallback delay in milliseconds
    #[serde(default = "default_fallback_ms")]
    pub rate_limit_fallback_ms: u64,

    /// Substrings marking a rate-limit error message
    #[serde(default = "default_signatures")]
    pub rate_limit_signatures: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff: BackoffConfig::default(),
            rate_limit_fallback: FallbackMode::default(),
            rate_limit_fallback_ms: default_fallback_ms(),
            rate_limit_signatures: default_signatures(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_fallback_ms() -> u64 {
    500
}

fn default_signatures() -> Vec<String> {
    vec![DEFAULT_RATE_LIMIT_SIGNATURE.to_string()]
}

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    1000
}

fn default_max_ms() -> u64 {
    10_000
}

// ============================================================================
// Pagination Config
// ============================================================================

/// Pagination configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Items per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Safety valve on page count
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}
