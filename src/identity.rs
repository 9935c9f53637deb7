use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::ConfigError;

/// User agents to rotate through to avoid bot detection
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

pub const DEFAULT_REFERERS: &[&str] = &[
    "https://www.google.com/",
    "https://www.bing.com/",
    "https://duckduckgo.com/",
];

/// Browser fingerprint attached to one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: String,
    pub referer: String,
}

/// Picks a fresh identity for every request.
///
/// Each field is drawn uniformly and independently on every call, so two
/// consecutive requests may well share a user agent.
pub struct IdentityRotator {
    user_agents: Vec<String>,
    referers: Vec<String>,
    rng: StdRng,
}

impl IdentityRotator {
    pub fn new(
        user_agents: Vec<String>,
        referers: Vec<String>,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        if user_agents.is_empty() {
            return Err(ConfigError::Invalid("user agent pool is empty".to_string()));
        }
        if referers.is_empty() {
            return Err(ConfigError::Invalid("referer pool is empty".to_string()));
        }
        Ok(Self {
            user_agents,
            referers,
            rng,
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            referers: DEFAULT_REFERERS.iter().map(|s| s.to_string()).collect(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn next(&mut self) -> Identity {
        // Both pools are non-empty by construction.
        let user_agent = self
            .user_agents
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default();
        let referer = self
            .referers
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default();
        Identity {
            user_agent,
            referer,
        }
    }
}
