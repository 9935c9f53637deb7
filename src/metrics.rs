//! Running totals for a crawl run
//!
//! Tracks request outcomes, retries, challenge hits and per-phase progress.
//! A run is strictly sequential, so the counters are owned by the session
//! and mutated through `&mut`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{FailureCause, TransportError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub retry_count: u64,
    pub rate_limit_hits: u64,
    pub timeout_count: u64,
    pub block_hits: u64,
    pub pages_fetched: u64,
    pub pages_failed: u64,
    pub items_discovered: u64,
    pub items_enriched: u64,
    pub items_failed: u64,
    pub total_response_time_ms: u64,
    pub average_response_time_ms: f64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            (self.successful_requests as f64 / self.total_requests as f64) * 100.0
        }
    }

    pub fn record_success(&mut self, response_time: Duration) {
        self.total_requests += 1;
        self.successful_requests += 1;
        self.last_success = Some(Utc::now());

        self.total_response_time_ms += response_time.as_millis() as u64;
        self.average_response_time_ms =
            self.total_response_time_ms as f64 / self.successful_requests as f64;
    }

    pub fn record_failure(&mut self, cause: &FailureCause) {
        self.total_requests += 1;
        self.failed_requests += 1;
        self.last_failure = Some(Utc::now());
        self.last_error = Some(cause.to_string());

        // Categorize errors
        match cause {
            FailureCause::Status(429) => self.rate_limit_hits += 1,
            FailureCause::Transport(TransportError::Timeout) => self.timeout_count += 1,
            _ => {}
        }
    }

    pub fn record_block(&mut self, signature: &str) {
        self.total_requests += 1;
        self.failed_requests += 1;
        self.block_hits += 1;
        self.last_failure = Some(Utc::now());
        self.last_error = Some(format!("challenge page ({})", signature));
    }

    pub fn record_retry(&mut self) {
        self.retry_count += 1;
    }

    pub fn log_summary(&self) {
        log::info!("=== Crawl Summary ===");
        log::info!("  Requests: {} ({:.2}% successful)", self.total_requests, self.success_rate());
        log::info!("  Failed: {}", self.failed_requests);
        log::info!("  Retries: {}", self.retry_count);
        log::info!("  Rate Limit Hits: {}", self.rate_limit_hits);
        log::info!("  Timeouts: {}", self.timeout_count);
        log::info!("  Challenge Pages: {}", self.block_hits);
        log::info!("  Avg Response Time: {:.2}ms", self.average_response_time_ms);
        log::info!(
            "  List Pages: {} fetched, {} failed",
            self.pages_fetched,
            self.pages_failed
        );
        log::info!(
            "  Items: {} discovered, {} enriched, {} failed",
            self.items_discovered,
            self.items_enriched,
            self.items_failed
        );
        if let Some(last_error) = &self.last_error {
            log::info!("  Last Error: {}", last_error);
        }
    }
}
