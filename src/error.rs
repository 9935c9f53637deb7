//! Error types for the crawler
//!
//! Failures are split by blast radius: `TransportError` and `FailureCause`
//! describe a single attempt, `FetchError` is what a logical fetch reports to
//! the orchestration layer, and `CrawlError` is reserved for conditions that
//! end the process.

use crate::block_detector::BlockSignal;
use crate::crawler::CrawlRun;
use std::fmt;
use thiserror::Error;

/// Network-level failure of a single request attempt
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("connection reset: {0}")]
    ConnectionReset(String),

    #[error("DNS resolution failed: {0}")]
    Dns(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("redirect failed: {0}")]
    Redirect(String),

    #[error("network error: {0}")]
    Other(String),
}

/// Why one attempt at a fetch did not produce a usable document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    Transport(TransportError),
    Status(u16),
    InvalidUrl(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Transport(e) => write!(f, "{}", e),
            FailureCause::Status(code) => write!(f, "HTTP {}", code),
            FailureCause::InvalidUrl(msg) => write!(f, "malformed URL: {}", msg),
        }
    }
}

/// Outcome of a logical fetch that did not succeed
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Challenge page detected; the whole run has to stop.
    #[error("{0}")]
    Blocked(BlockSignal),

    #[error("fatal failure for {url}: {cause}")]
    Fatal { url: String, cause: FailureCause },

    #[error("giving up on {url} after {attempts} attempts: {cause}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        cause: FailureCause,
    },
}

impl FetchError {
    pub fn is_block(&self) -> bool {
        matches!(self, FetchError::Blocked(_))
    }

    pub fn block_signal(&self) -> Option<&BlockSignal> {
        match self {
            FetchError::Blocked(signal) => Some(signal),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write records: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that end the process
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The crawl finished but its records could not be persisted. The run is
    /// carried along so the caller can still report what was collected.
    #[error("record sink failed after collecting {} items: {source}", .run.items.len())]
    Sink {
        #[source]
        source: SinkError,
        run: Box<CrawlRun>,
    },
}
