use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::block_detector::{BlockDetector, DEFAULT_SIGNATURES};
use crate::error::ConfigError;
use crate::http_client::{HttpClientConfig, ReqwestTransport};
use crate::identity::{IdentityRotator, DEFAULT_REFERERS, DEFAULT_USER_AGENTS};
use crate::pacing::{Pacer, DEFAULT_PACE_RANGE_MS};
use crate::retry::{RetryPolicy, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_DELAY_MS, DEFAULT_MAX_ATTEMPTS};
use crate::session::DEFAULT_MAX_REDIRECTS;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Root of the target site
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// First list page; later pages live under `{start_path}/page/{n}/`
    #[serde(default = "default_start_path")]
    pub start_path: String,

    /// Page fetched once before anything else to pick up protection cookies
    #[serde(default = "default_warmup_path")]
    pub warmup_path: String,

    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Attempts per logical request, the initial one included
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Inclusive window for the randomized wait between requests
    #[serde(default = "default_pace_range")]
    pub pace_range_ms: [u64; 2],

    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_backoff_cap")]
    pub backoff_cap_ms: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Redirect hops followed per request
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Fixed seed for identity and pacing randomness (reproducible runs)
    #[serde(default)]
    pub seed: Option<u64>,

    /// End pagination at the first page that lists nothing
    #[serde(default = "default_false")]
    pub stop_on_empty_page: bool,

    #[serde(default = "default_true")]
    pub check_robots: bool,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub block_detection: BlockDetectionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,

    #[serde(default = "default_referers")]
    pub referers: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BlockDetectionConfig {
    /// Case-insensitive markers of a bot-challenge page
    #[serde(default = "default_signatures")]
    pub signatures: Vec<String>,
}

fn default_true() -> bool { true }
fn default_false() -> bool { false }
fn default_base_url() -> String { "https://modyolo.com".to_string() }
fn default_start_path() -> String { "/apps".to_string() }
fn default_warmup_path() -> String { "/".to_string() }
fn default_max_pages() -> u32 { 500 }
fn default_max_retries() -> u32 { DEFAULT_MAX_ATTEMPTS }
fn default_pace_range() -> [u64; 2] { [DEFAULT_PACE_RANGE_MS.0, DEFAULT_PACE_RANGE_MS.1] }
fn default_backoff_base() -> u64 { DEFAULT_BASE_DELAY_MS }
fn default_backoff_cap() -> u64 { DEFAULT_MAX_DELAY_MS }
fn default_timeout() -> u64 { 15 }
fn default_connect_timeout() -> u64 { 10 }
fn default_max_redirects() -> usize { DEFAULT_MAX_REDIRECTS }
fn default_output_path() -> String { "src/data/apps.json".to_string() }

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
fn default_user_agents() -> Vec<String> { to_strings(DEFAULT_USER_AGENTS) }
fn default_referers() -> Vec<String> { to_strings(DEFAULT_REFERERS) }
fn default_signatures() -> Vec<String> { to_strings(DEFAULT_SIGNATURES) }

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_agents: default_user_agents(),
            referers: default_referers(),
        }
    }
}

impl Default for BlockDetectionConfig {
    fn default() -> Self {
        Self {
            signatures: default_signatures(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            start_path: default_start_path(),
            warmup_path: default_warmup_path(),
            max_pages: default_max_pages(),
            max_retries: default_max_retries(),
            pace_range_ms: default_pace_range(),
            backoff_base_ms: default_backoff_base(),
            backoff_cap_ms: default_backoff_cap(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_redirects: default_max_redirects(),
            output_path: default_output_path(),
            seed: None,
            stop_on_empty_page: false,
            check_robots: true,
            identity: IdentityConfig::default(),
            block_detection: BlockDetectionConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate the configuration. A missing file means defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_toml(&content)?
        } else {
            log::warn!("Config file {} not found, using defaults", path.display());
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str::<Config>(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

        self.parsed_base_url()?;
        if self.max_pages == 0 {
            return invalid("max_pages must be at least 1".to_string());
        }
        if self.max_retries == 0 {
            return invalid("max_retries must allow at least one attempt".to_string());
        }
        let [min, max] = self.pace_range_ms;
        if min > max {
            return invalid(format!("pace_range_ms [{}, {}] is not ordered", min, max));
        }
        if self.backoff_base_ms > self.backoff_cap_ms {
            return invalid(format!(
                "backoff_base_ms ({}) exceeds backoff_cap_ms ({})",
                self.backoff_base_ms, self.backoff_cap_ms
            ));
        }
        if self.identity.user_agents.is_empty() {
            return invalid("identity.user_agents must not be empty".to_string());
        }
        if self.identity.referers.is_empty() {
            return invalid("identity.referers must not be empty".to_string());
        }
        if self.block_detection.signatures.iter().all(|s| s.trim().is_empty()) {
            return invalid("block_detection.signatures must not be empty".to_string());
        }
        Ok(())
    }

    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid(format!("base_url {:?}: {}", self.base_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid(format!(
                "base_url must be http or https, got {:?}",
                other
            ))),
        }
    }

    /// Create the reqwest transport from this configuration
    pub fn create_transport(&self) -> Result<ReqwestTransport, reqwest::Error> {
        let config = HttpClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            enable_compression: true,
        };
        ReqwestTransport::with_config(config)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff_base_ms, self.backoff_cap_ms)
    }

    fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }

    pub fn identity_rotator(&self) -> Result<IdentityRotator, ConfigError> {
        IdentityRotator::new(
            self.identity.user_agents.clone(),
            self.identity.referers.clone(),
            self.rng(0),
        )
    }

    pub fn pacer(&self) -> Pacer {
        Pacer::new((self.pace_range_ms[0], self.pace_range_ms[1]), self.rng(1))
    }

    pub fn block_detector(&self) -> BlockDetector {
        BlockDetector::new(self.block_detection.signatures.iter().map(String::as_str))
    }
}
