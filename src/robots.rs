//! Advisory robots.txt pre-flight
//!
//! The check never stops a run. A restrictive policy is logged as a warning
//! and the crawl proceeds. Matching follows the Google robots.txt rules via
//! the `robotstxt` crate.

use robotstxt::DefaultMatcher;

use crate::http_client::Transport;
use crate::session::CrawlSession;

pub const ROBOTS_PATH: &str = "/robots.txt";

/// Token that names the wildcard group
pub const WILDCARD_AGENT: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreflightOutcome {
    Allowed,
    Disallowed { agents: Vec<String> },
    Unavailable,
}

/// Product token of a user agent string, as matched against `User-agent`
/// lines ("Mozilla/5.0 (X11; ...)" gives "Mozilla").
pub fn product_token(user_agent: &str) -> &str {
    let end = user_agent
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
        .unwrap_or(user_agent.len());
    &user_agent[..end]
}

pub fn is_allowed(robots_body: &str, user_agent: &str, url: &str) -> bool {
    let agent = if user_agent == WILDCARD_AGENT {
        WILDCARD_AGENT
    } else {
        product_token(user_agent)
    };
    let mut matcher = DefaultMatcher::default();
    matcher.one_agent_allowed_by_robots(robots_body, agent, url)
}

/// The wildcard group plus every configured agent that may not fetch `url`
pub fn disallowed_agents(robots_body: &str, url: &str, user_agents: &[String]) -> Vec<String> {
    std::iter::once(WILDCARD_AGENT.to_string())
        .chain(user_agents.iter().cloned())
        .filter(|agent| !is_allowed(robots_body, agent, url))
        .collect()
}

/// Fetch robots.txt once and warn when the start path is off limits for the
/// wildcard group or any configured user agent.
pub async fn preflight<T: Transport>(
    session: &mut CrawlSession<T>,
    start_path: &str,
    user_agents: &[String],
) -> PreflightOutcome {
    let response = match session.probe(ROBOTS_PATH).await {
        Ok(response) if response.is_success() => response,
        Ok(response) => {
            log::debug!("robots.txt returned HTTP {}, skipping check", response.status);
            return PreflightOutcome::Unavailable;
        }
        Err(e) => {
            log::warn!("Could not fetch robots.txt: {}", e);
            return PreflightOutcome::Unavailable;
        }
    };

    let start_url = match session.resolve(start_path) {
        Ok(url) => url,
        Err(e) => {
            log::warn!("Skipping robots.txt check: {}", e);
            return PreflightOutcome::Unavailable;
        }
    };

    let agents = disallowed_agents(&response.body, start_url.as_str(), user_agents);
    if agents.is_empty() {
        log::info!("robots.txt permits {}", start_url);
        PreflightOutcome::Allowed
    } else {
        log::warn!(
            "robots.txt disallows {} for {} agent(s); continuing anyway",
            start_url,
            agents.len()
        );
        PreflightOutcome::Disallowed { agents }
    }
}
