// Library interface for rust_catalog_scraper
// The binary and the integration tests both drive the crawler through here

pub mod block_detector;
pub mod config;
pub mod cookies;
pub mod crawler;
pub mod error;
pub mod helpers;
pub mod http_client;
pub mod identity;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pacing;
pub mod parser;
pub mod retry;
pub mod robots;
pub mod session;
pub mod sink;

pub use crawler::{CrawlRun, Crawler, StopReason};
pub use error::{CrawlError, FetchError};
pub use models::CrawlItem;
