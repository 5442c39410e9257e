//! Request engine with retry and rate-limit handling
//!
//! Issues one logical request and owns every retry decision for it:
//! - HTTP 429 and 5xx, honoring `Retry-After`
//! - network failures and unparseable bodies
//! - in-body rate-limit errors whose message embeds a `wait Nms` hint
//!
//! All failure classes draw on the same retry budget. Application errors
//! that are not rate-limit signals are returned to the caller untouched.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::response::{extract_errors, GraphqlRequest, GraphqlResponse};
use super::retry::{parse_retry_after, RetryPolicy, RetryReason};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{snippet, Error, Result};
use crate::types::{JsonValue, StringMap};
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Configuration for the request engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Headers sent with every request
    pub default_headers: StringMap,
    /// Response header carrying the vendor's query cost
    pub cost_header: Option<String>,
    /// Retry budget and backoff schedule
    pub retry: RetryPolicy,
    /// Client-side throttle
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("skillkit/{}", env!("CARGO_PKG_VERSION")),
            default_headers: StringMap::new(),
            cost_header: None,
            retry: RetryPolicy::default(),
            rate_limit: None,
        }
    }
}

impl EngineConfig {
    /// Create a new config builder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for engine config
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    /// Set backoff bounds, keeping the strategy
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.config.retry.initial_backoff = initial;
        self.config.retry.max_backoff = max;
        self
    }

    /// Replace the whole retry policy
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set the query-cost header to capture
    pub fn cost_header(mut self, name: impl Into<String>) -> Self {
        self.config.cost_header = Some(name.into());
        self
    }

    /// Enable the client-side throttle
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

/// Per-call options
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    /// Override the policy's retry budget
    pub max_retries: Option<u32>,
    /// Log per-attempt progress at info level
    pub verbose: bool,
    /// Give up between attempts once this instant has passed
    pub deadline: Option<Instant>,
}

impl RequestOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max retries
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Enable verbose progress logging
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set a deadline
    #[must_use]
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now
    #[must_use]
    pub fn timeout(self, within: Duration) -> Self {
        self.deadline(Instant::now() + within)
    }
}

/// What a single physical attempt produced
enum Attempt {
    Transport(reqwest::Error),
    Status {
        status: u16,
        retry_after: Option<Duration>,
        body: String,
    },
    Unparseable {
        message: String,
    },
    Parsed {
        status: u16,
        body: JsonValue,
        cost: Option<String>,
    },
}

/// Request engine.
///
/// Cheap to clone; clones share the connection pool and the throttle.
#[derive(Clone)]
pub struct RequestEngine {
    client: Client,
    config: Arc<EngineConfig>,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
}

impl RequestEngine {
    /// Create an engine with the given config and credential
    pub fn new(config: EngineConfig, auth: AuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config: Arc::new(config),
            authenticator: Authenticator::new(auth),
            rate_limiter,
        })
    }

    /// Get the engine config
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check if the client-side throttle is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Execute one GraphQL query or mutation.
    ///
    /// Returns normally whenever a parseable body arrives, even if it carries
    /// application errors; inspect [`GraphqlResponse::errors`].
    pub async fn execute(
        &self,
        request: &GraphqlRequest,
        options: &RequestOptions,
    ) -> Result<GraphqlResponse> {
        request.validate()?;
        self.send_json(&request.endpoint, &request.to_body(), options)
            .await
    }

    /// POST an arbitrary JSON body with the same retry handling
    pub async fn send_json(
        &self,
        endpoint: &str,
        body: &JsonValue,
        options: &RequestOptions,
    ) -> Result<GraphqlResponse> {
        let policy = &self.config.retry;
        let budget = options.max_retries.unwrap_or(policy.max_retries);
        let total = budget.saturating_add(1);
        let mut attempt: u32 = 0;
        let mut last_error: Option<Error> = None;

        loop {
            if deadline_passed(options) {
                return Err(Error::deadline(attempt, last_error));
            }

            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            progress(
                options.verbose,
                format_args!("POST {endpoint} (attempt {}/{})", attempt + 1, total),
            );

            let (decision, terminal) = match self.attempt(endpoint, body).await {
                Attempt::Transport(e) => {
                    if e.is_builder() {
                        return Err(Error::Http(e));
                    }
                    let decision = policy.decide_transport(RetryReason::Network, attempt, budget);
                    (decision, Error::Http(e))
                }
                Attempt::Status {
                    status,
                    retry_after,
                    body,
                } => {
                    let decision = policy.decide_status(status, retry_after, attempt, budget);
                    (decision, Error::http_status(status, body))
                }
                Attempt::Unparseable { message } => {
                    let decision =
                        policy.decide_transport(RetryReason::UnparseableBody, attempt, budget);
                    (decision, Error::decode(message))
                }
                Attempt::Parsed { status, body, cost } => {
                    let signal = extract_errors(&body)
                        .into_iter()
                        .find(|e| policy.is_rate_limit_message(&e.message));

                    match signal {
                        Some(error) => {
                            // The rate-limit class always gets at least one retry
                            let decision =
                                policy.decide_rate_limit(&error.message, attempt, budget.max(1));
                            (
                                decision,
                                Error::RateLimited {
                                    message: error.message,
                                    attempts: attempt + 1,
                                },
                            )
                        }
                        None => {
                            if let Some(ref cost) = cost {
                                debug!("Query cost for {}: {}", endpoint, cost);
                            }
                            progress(
                                options.verbose,
                                format_args!("Request succeeded after {} attempt(s)", attempt + 1),
                            );
                            return Ok(GraphqlResponse {
                                body,
                                status,
                                cost,
                                attempts: attempt + 1,
                            });
                        }
                    }
                }
            };

            if !decision.should_retry {
                return Err(terminal);
            }

            if !sleep_fits(options, decision.delay) {
                return Err(Error::deadline(attempt + 1, Some(terminal)));
            }

            warn!(
                "{:?} on attempt {}/{}: {}; retrying in {:?}",
                decision.reason,
                attempt + 1,
                total,
                terminal,
                decision.delay
            );

            tokio::time::sleep(decision.delay).await;
            last_error = Some(terminal);
            attempt += 1;
        }
    }

    /// Perform one physical HTTP call and classify what came back
    async fn attempt(&self, endpoint: &str, body: &JsonValue) -> Attempt {
        let mut req = self.client.post(endpoint).json(body);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        req = self.authenticator.apply(req);

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Transport(e),
        };

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let cost = self
            .config
            .cost_header
            .as_deref()
            .and_then(|name| response.headers().get(name))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return Attempt::Transport(e),
        };

        if !(200..300).contains(&status) {
            return Attempt::Status {
                status,
                retry_after,
                body: text,
            };
        }

        match serde_json::from_str::<JsonValue>(&text) {
            Ok(body) => Attempt::Parsed { status, body, cost },
            Err(e) => Attempt::Unparseable {
                message: format!("{e} (body: {})", snippet(&text)),
            },
        }
    }
}

impl std::fmt::Debug for RequestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEngine")
            .field("config", &self.config)
            .field("auth", self.authenticator.config())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

fn progress(verbose: bool, message: std::fmt::Arguments<'_>) {
    if verbose {
        info!("{}", message);
    } else {
        debug!("{}", message);
    }
}

fn deadline_passed(options: &RequestOptions) -> bool {
    options
        .deadline
        .is_some_and(|deadline| Instant::now() >= deadline)
}

/// Whether a sleep of `delay` ends before the deadline.
///
/// A delay too large to add to the current instant never fits.
fn sleep_fits(options: &RequestOptions, delay: Duration) -> bool {
    match options.deadline {
        Some(deadline) => Instant::now()
            .checked_add(delay)
            .is_some_and(|wake| wake < deadline),
        None => true,
    }
}
