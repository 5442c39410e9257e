//! Retry policy and retry decisions
//!
//! Every attempt of the request engine ends in a [`RetryDecision`]. The
//! deciders here are pure so the backoff schedule can be checked without a
//! server or a clock.

use crate::error::is_retryable_status;
use crate::types::BackoffType;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static WAIT_HINT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bwait\s+(\d+)\s*ms").unwrap());

/// Default substring identifying an in-body rate-limit error
pub const DEFAULT_RATE_LIMIT_SIGNATURE: &str = "API limit exceeded";

/// Delay used when a rate-limit message carries no `wait Nms` hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitFallback {
    /// Always wait this long
    Fixed(Duration),
    /// Use the policy's backoff schedule for the current attempt
    Backoff,
}

impl Default for RateLimitFallback {
    fn default() -> Self {
        Self::Fixed(Duration::from_millis(500))
    }
}

/// Why an attempt ended the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// 2xx with a usable body
    Success,
    /// HTTP 429
    TooManyRequests,
    /// HTTP 5xx
    ServerError,
    /// Connection reset, timeout, or other transport failure
    Network,
    /// 2xx whose body is not valid JSON
    UnparseableBody,
    /// 2xx whose `errors` array carries a rate-limit message
    RateLimitSignal,
    /// Status that retrying will not fix (4xx other than 429)
    NonRetryable,
}

/// Outcome of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    /// Whether another attempt should be made
    pub should_retry: bool,
    /// How long to sleep before that attempt
    pub delay: Duration,
    /// What triggered the decision
    pub reason: RetryReason,
}

impl RetryDecision {
    /// Retry after `delay`
    pub fn retry(reason: RetryReason, delay: Duration) -> Self {
        Self {
            should_retry: true,
            delay,
            reason,
        }
    }

    /// Do not retry
    pub fn stop(reason: RetryReason) -> Self {
        Self {
            should_retry: false,
            delay: Duration::ZERO,
            reason,
        }
    }
}

/// Retry budget and backoff schedule shared by HTTP failures and in-body
/// rate-limit signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`
    pub max_retries: u32,
    /// Backoff strategy
    pub backoff_type: BackoffType,
    /// Delay for attempt 0
    pub initial_backoff: Duration,
    /// Upper bound on computed backoff
    pub max_backoff: Duration,
    /// Delay for rate-limit messages without a wait hint
    pub rate_limit_fallback: RateLimitFallback,
    /// Case-insensitive substrings marking a rate-limit error message
    pub rate_limit_signatures: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_type: BackoffType::Exponential,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(10_000),
            rate_limit_fallback: RateLimitFallback::default(),
            rate_limit_signatures: vec![DEFAULT_RATE_LIMIT_SIGNATURE.to_string()],
        }
    }
}

impl RetryPolicy {
    /// Backoff delay for a given zero-based attempt
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.max_backoff)
    }

    /// Check whether an application error message is a rate-limit signal
    pub fn is_rate_limit_message(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        self.rate_limit_signatures
            .iter()
            .any(|sig| lower.contains(&sig.to_lowercase()))
    }

    /// Delay to honor for a rate-limit message
    pub fn rate_limit_delay(&self, message: &str, attempt: u32) -> Duration {
        parse_wait_hint(message).unwrap_or(match self.rate_limit_fallback {
            RateLimitFallback::Fixed(delay) => delay,
            RateLimitFallback::Backoff => self.backoff_delay(attempt),
        })
    }

    /// Decide on an HTTP status.
    ///
    /// `retry_after` is the parsed `Retry-After` header, preferred over the
    /// computed backoff when present.
    pub fn decide_status(
        &self,
        status: u16,
        retry_after: Option<Duration>,
        attempt: u32,
        budget: u32,
    ) -> RetryDecision {
        if (200..300).contains(&status) {
            return RetryDecision::stop(RetryReason::Success);
        }
        if !is_retryable_status(status) {
            return RetryDecision::stop(RetryReason::NonRetryable);
        }

        let reason = if status == 429 {
            RetryReason::TooManyRequests
        } else {
            RetryReason::ServerError
        };
        if attempt >= budget {
            return RetryDecision::stop(reason);
        }
        let delay = retry_after.unwrap_or_else(|| self.backoff_delay(attempt));
        RetryDecision::retry(reason, delay)
    }

    /// Decide on a transport failure or an unparseable body
    pub fn decide_transport(&self, reason: RetryReason, attempt: u32, budget: u32) -> RetryDecision {
        if attempt >= budget {
            return RetryDecision::stop(reason);
        }
        RetryDecision::retry(reason, self.backoff_delay(attempt))
    }

    /// Decide on an in-body rate-limit message
    pub fn decide_rate_limit(&self, message: &str, attempt: u32, budget: u32) -> RetryDecision {
        if attempt >= budget {
            return RetryDecision::stop(RetryReason::RateLimitSignal);
        }
        RetryDecision::retry(
            RetryReason::RateLimitSignal,
            self.rate_limit_delay(message, attempt),
        )
    }
}

/// Parse a `Retry-After` header given in seconds.
///
/// Values that are negative, non-finite, or too large for a `Duration` are
/// ignored so the computed backoff applies.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Extract the first `wait <N>ms` hint from a rate-limit message
pub fn parse_wait_hint(message: &str) -> Option<Duration> {
    WAIT_HINT_REGEX
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(Duration::from_millis)
}
