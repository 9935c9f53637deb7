use async_trait::async_trait;
use reqwest::header::{LOCATION, SET_COOKIE};
use reqwest::{Client, ClientBuilder};
use std::error::Error as _;
use std::time::Duration;
use url::Url;

use crate::error::TransportError;

/// Static headers that mimic a real browser navigation. Identity-specific
/// headers (user agent, referer) and cookies are added per request.
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("DNT", "1"),
    ("Upgrade-Insecure-Requests", "1"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Cache-Control", "max-age=0"),
];

/// A fully prepared GET request
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl OutboundRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What came back from the wire, whatever the status. Redirects are not
/// followed here.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub set_cookies: Vec<String>,
    pub location: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Target of a 3xx response, if it names one
    pub fn redirect_location(&self) -> Option<&str> {
        if (300..400).contains(&self.status) {
            self.location.as_deref()
        } else {
            None
        }
    }
}

/// One-shot request dispatch. Retries, redirects, cookies and identity live
/// above this seam, in the crawl session.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &OutboundRequest) -> Result<RawResponse, TransportError>;
}

/// Configuration for the reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub enable_compression: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
            enable_compression: true,
        }
    }
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .gzip(config.enable_compression)
            .brotli(config.enable_compression)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()?;

        Ok(Self { client })
    }

    /// Map reqwest errors onto the transport failure classes
    pub fn classify_error(error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout;
        }
        if error.is_builder() {
            return TransportError::InvalidRequest(error.to_string());
        }

        // The interesting detail usually sits further down the source chain.
        let mut detail = error.to_string();
        let mut source = error.source();
        while let Some(inner) = source {
            detail.push_str(": ");
            detail.push_str(&inner.to_string());
            source = inner.source();
        }
        let lower = detail.to_lowercase();

        if lower.contains("dns") || lower.contains("name resolution") || lower.contains("failed to lookup") {
            return TransportError::Dns(detail);
        }
        if lower.contains("connection reset") || lower.contains("broken pipe") {
            return TransportError::ConnectionReset(detail);
        }
        if error.is_connect() {
            return TransportError::Connect(detail);
        }
        if error.is_redirect() {
            return TransportError::Redirect(detail);
        }
        if error.is_body() || error.is_decode() {
            return TransportError::Body(detail);
        }
        TransportError::Other(detail)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &OutboundRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self.client.get(request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::classify_error(&e))?;

        let status = response.status().as_u16();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| match Self::classify_error(&e) {
                TransportError::Timeout => TransportError::Timeout,
                other => TransportError::Body(other.to_string()),
            })?;

        Ok(RawResponse {
            status,
            set_cookies,
            location,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let transport = ReqwestTransport::new();
        assert!(transport.is_ok());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = OutboundRequest::new(Url::parse("https://example.com/").unwrap())
            .with_header("User-Agent", "TestAgent/1.0")
            .with_header("Cookie", "a=1");
        assert_eq!(request.header("user-agent"), Some("TestAgent/1.0"));
        assert_eq!(request.header("COOKIE"), Some("a=1"));
        assert_eq!(request.header("Referer"), None);
    }

    #[test]
    fn test_success_range() {
        let ok = RawResponse {
            status: 204,
            set_cookies: Vec::new(),
            location: None,
            body: String::new(),
        };
        let redirect = RawResponse { status: 301, ..ok.clone() };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }

    #[test]
    fn test_redirect_location_needs_a_3xx_status() {
        let moved = RawResponse {
            status: 302,
            set_cookies: Vec::new(),
            location: Some("/apps/".to_string()),
            body: String::new(),
        };
        let not_modified = RawResponse { location: None, status: 304, ..moved.clone() };
        let created = RawResponse { status: 201, ..moved.clone() };
        assert_eq!(moved.redirect_location(), Some("/apps/"));
        assert_eq!(not_modified.redirect_location(), None);
        assert_eq!(created.redirect_location(), None);
    }

    #[test]
    fn test_browser_headers_leave_identity_to_the_session() {
        assert!(BROWSER_HEADERS
            .iter()
            .all(|(name, _)| !name.eq_ignore_ascii_case("user-agent")
                && !name.eq_ignore_ascii_case("referer")
                && !name.eq_ignore_ascii_case("cookie")));
    }
}
