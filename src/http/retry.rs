//! Retry decisions and backoff for API requests.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::PolicyError;
use super::response::Response;

/// Server hint overriding the local retry rules. Only `"true"` and `"false"` are honored.
pub const SHOULD_RETRY_HEADER: &str = "Stripe-Should-Retry";

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

pub const REQUEST_ID_HEADER: &str = "Request-Id";

/// Retries are off unless configured.
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Minimum sleep between attempts in milliseconds.
pub const DEFAULT_MIN_DELAY_MS: u64 = 500;

/// Maximum sleep between attempts in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 5000;

const CONFLICT: u16 = 409;

/// Jitter scales the clamped delay by a factor drawn from this range.
const JITTER_MIN: f64 = 0.75;
const JITTER_MAX: f64 = 1.0;

/// How many times to retry and how long to wait in between.
///
/// Every delay from [`RetryPolicy::sleep_time`] lies within `[min_delay, max_delay]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyFile", into = "PolicyFile")]
pub struct RetryPolicy {
    max_retries: u32,
    min_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            min_delay: Duration::from_millis(DEFAULT_MIN_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Fails if `min_delay` exceeds `max_delay`.
    pub fn new(
        max_retries: u32,
        min_delay: Duration,
        max_delay: Duration,
    ) -> Result<Self, PolicyError> {
        if min_delay > max_delay {
            return Err(PolicyError::InvertedBounds {
                min_ms: min_delay.as_millis(),
                max_ms: max_delay.as_millis(),
            });
        }
        Ok(Self {
            max_retries,
            min_delay,
            max_delay,
        })
    }

    /// Returns a copy of this policy allowing `max_retries` retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Retries allowed after the initial attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Floor for every backoff delay.
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Ceiling for every backoff delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Decides whether `response`, received after `retries` retries, warrants another attempt.
    ///
    /// First match wins: exhausted budget, explicit server hint, 409 conflict, 5xx.
    pub fn should_retry(&self, retries: u32, response: &Response) -> bool {
        if retries >= self.max_retries {
            return false;
        }

        // The API may ask us not to retry (a replay would be a no-op) or to retry
        // (lock timeouts); defer to it.
        match response.header_value(SHOULD_RETRY_HEADER) {
            Some("true") => return true,
            Some("false") => return false,
            _ => {}
        }

        if response.status() == CONFLICT {
            return true;
        }

        response.status() >= 500
    }

    /// Delay before retry number `retry` (1-based).
    pub fn sleep_time(&self, retry: u32) -> Duration {
        self.sleep_time_with_jitter(retry, rand::rng().random_range(JITTER_MIN..=JITTER_MAX))
    }

    fn sleep_time_with_jitter(&self, retry: u32, jitter: f64) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let base = self.min_delay.as_secs_f64() * 2f64.powi(exponent);

        // powi saturates to infinity, which min() folds back to max_delay.
        let capped = base.min(self.max_delay.as_secs_f64());

        // Near Duration::MAX the f64 round trip can land just past the representable range.
        Duration::try_from_secs_f64(capped * jitter)
            .unwrap_or(self.max_delay)
            .max(self.min_delay)
            .min(self.max_delay)
    }
}

/// On-disk shape of a policy: millisecond integers, every field optional.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
struct PolicyFile {
    max_retries: u32,
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl Default for PolicyFile {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl TryFrom<PolicyFile> for RetryPolicy {
    type Error = PolicyError;

    fn try_from(file: PolicyFile) -> Result<Self, PolicyError> {
        RetryPolicy::new(
            file.max_retries,
            Duration::from_millis(file.min_delay_ms),
            Duration::from_millis(file.max_delay_ms),
        )
    }
}

impl From<RetryPolicy> for PolicyFile {
    fn from(policy: RetryPolicy) -> Self {
        Self {
            max_retries: policy.max_retries,
            min_delay_ms: u64::try_from(policy.min_delay.as_millis()).unwrap_or(u64::MAX),
            max_delay_ms: u64::try_from(policy.max_delay.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
