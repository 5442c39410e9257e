//! HTTP request engine
//!
//! Executes one logical GraphQL (or JSON REST) request with retry, backoff,
//! and rate-limit handling.
//!
//! # Features
//!
//! - **Shared Retry Budget**: HTTP 429/5xx, network errors, unparseable bodies,
//!   and in-body rate-limit messages all draw on one `max_retries` counter
//! - **Server Guidance**: `Retry-After` headers and `wait Nms` hints win over
//!   computed backoff
//! - **Throttling**: Optional token bucket using governor
//! - **Authentication**: Integration with the auth module

mod client;
mod rate_limit;
mod response;
mod retry;

pub use client::{EngineConfig, EngineConfigBuilder, RequestEngine, RequestOptions};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use response::{extract_errors, validate_endpoint, ApiError, GraphqlRequest, GraphqlResponse};
pub use retry::{
    parse_retry_after, parse_wait_hint, RateLimitFallback, RetryDecision, RetryPolicy,
    RetryReason, DEFAULT_RATE_LIMIT_SIGNATURE,
};
