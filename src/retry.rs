use std::time::Duration;

use crate::error::{FailureCause, TransportError};

/// Attempts per logical request, the initial one included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_BASE_DELAY_MS: u64 = 2_000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Retryable,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Exponential backoff with a hard cap and a fixed attempt budget
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_DELAY_MS)
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Check if a status code is retryable
    pub fn is_retryable_status(status: u16) -> bool {
        matches!(
            status,
            // Rate limiting
            429 |
            // Server errors
            500 | 502 | 503 | 504
        )
    }

    pub fn classify(&self, cause: &FailureCause) -> Classification {
        match cause {
            FailureCause::Status(code) if Self::is_retryable_status(*code) => {
                Classification::Retryable
            }
            FailureCause::Status(_) => Classification::Fatal,
            FailureCause::InvalidUrl(_) => Classification::Fatal,
            FailureCause::Transport(
                TransportError::Timeout
                | TransportError::Connect(_)
                | TransportError::ConnectionReset(_)
                | TransportError::Dns(_)
                | TransportError::Body(_),
            ) => Classification::Retryable,
            FailureCause::Transport(
                TransportError::InvalidRequest(_)
                | TransportError::Redirect(_)
                | TransportError::Other(_),
            ) => Classification::Fatal,
        }
    }

    /// `min(max_delay, base_delay * 2^attempt)`, saturating on overflow
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.min(63)));
        Duration::from_millis(exponential.min(self.max_delay_ms))
    }

    /// Decide what to do after `attempt` (zero-based) failed with `cause`.
    pub fn decide(&self, url: &str, attempt: u32, cause: &FailureCause) -> RetryDecision {
        let classification = self.classify(cause);
        if classification == Classification::Fatal {
            log::warn!(
                "Attempt {} for {} failed with fatal cause ({}), not retrying",
                attempt + 1,
                url,
                cause
            );
            return RetryDecision::GiveUp;
        }

        if attempt.saturating_add(1) >= self.max_attempts {
            log::warn!(
                "Attempt {} for {} failed with retryable cause ({}), budget of {} attempts exhausted",
                attempt + 1,
                url,
                cause,
                self.max_attempts
            );
            return RetryDecision::GiveUp;
        }

        let delay = self.delay(attempt);
        log::warn!(
            "Attempt {}/{} for {} failed with retryable cause ({}), retrying in {}ms",
            attempt + 1,
            self.max_attempts,
            url,
            cause,
            delay.as_millis()
        );
        RetryDecision::RetryAfter(delay)
    }
}
