//! The crawl session: a single sequential fetch primitive
//!
//! Every request goes through [`CrawlSession::fetch`], which attaches a fresh
//! identity and the cookie jar, dispatches over the [`Transport`], follows
//! redirects hop by hop so each response feeds the jar and gets screened for
//! challenge pages, then applies the retry policy. Once a challenge page has been seen the session latches and
//! refuses to issue any further request.

use std::time::{Duration, Instant};
use tokio::time::sleep;
use url::Url;

use crate::block_detector::{BlockDetector, BlockSignal, Verdict};
use crate::cookies::CookieStore;
use crate::error::{FailureCause, FetchError, TransportError};
use crate::http_client::{OutboundRequest, RawResponse, Transport, BROWSER_HEADERS};
use crate::identity::{Identity, IdentityRotator};
use crate::metrics::CrawlStats;
use crate::retry::{Classification, RetryDecision, RetryPolicy};

/// One try at fetching a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAttempt {
    pub url: String,
    pub attempt: u32,
    pub delay_before: Duration,
}

pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Result of one attempt after its redirect chain has been walked
enum Exchange {
    Done(RawResponse),
    Failed(FailureCause),
    Blocked(FetchError),
}

pub struct CrawlSession<T: Transport> {
    transport: T,
    base_url: Url,
    identities: IdentityRotator,
    cookies: CookieStore,
    retry: RetryPolicy,
    detector: BlockDetector,
    max_redirects: usize,
    stats: CrawlStats,
    block: Option<BlockSignal>,
}

impl<T: Transport> CrawlSession<T> {
    pub fn new(
        transport: T,
        base_url: Url,
        identities: IdentityRotator,
        retry: RetryPolicy,
        detector: BlockDetector,
    ) -> Self {
        Self {
            transport,
            base_url,
            identities,
            cookies: CookieStore::new(),
            retry,
            detector,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            stats: CrawlStats::new(),
            block: None,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut CrawlStats {
        &mut self.stats
    }

    pub fn is_blocked(&self) -> bool {
        self.block.is_some()
    }

    pub fn block_signal(&self) -> Option<&BlockSignal> {
        self.block.as_ref()
    }

    /// Resolve a site-relative path (or pass through an absolute URL)
    pub fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        let invalid = |msg: String| FetchError::Fatal {
            url: path.to_string(),
            cause: FailureCause::InvalidUrl(msg),
        };

        let url = match Url::parse(path) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base_url
                .join(path)
                .map_err(|e| invalid(e.to_string()))?,
            Err(e) => return Err(invalid(e.to_string())),
        };

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme {:?}", other))),
        }
    }

    fn ensure_not_blocked(&self) -> Result<(), FetchError> {
        match &self.block {
            Some(signal) => Err(FetchError::Blocked(signal.clone())),
            None => Ok(()),
        }
    }

    fn prepare(&mut self, url: &Url) -> (OutboundRequest, Identity) {
        let identity = self.identities.next();
        let request = self.build_request(url, &identity);
        (request, identity)
    }

    fn build_request(&self, url: &Url, identity: &Identity) -> OutboundRequest {
        let mut request = OutboundRequest::new(url.clone())
            .with_header("User-Agent", identity.user_agent.clone())
            .with_header("Referer", identity.referer.clone());
        for (name, value) in BROWSER_HEADERS {
            request = request.with_header(name, *value);
        }
        if let Some(cookie_header) = self.cookies.attach() {
            request = request.with_header("Cookie", cookie_header);
        }
        request
    }

    fn raise_block(&mut self, url: &Url, signature: String) -> FetchError {
        let signal = BlockSignal {
            url: url.to_string(),
            signature,
        };
        self.stats.record_block(&signal.signature);
        log::error!("{}; halting all further requests", signal);
        self.block = Some(signal.clone());
        FetchError::Blocked(signal)
    }

    /// Run one attempt, following redirects under a single identity. Every
    /// hop goes through the cookie jar, and through the block detector when
    /// `screen` is set.
    async fn exchange(&mut self, url: &Url, screen: bool) -> Exchange {
        let (mut request, identity) = self.prepare(url);
        log::debug!("GET {} (ua={:?})", url, identity.user_agent);
        let mut hops = 0;

        loop {
            let response = match self.transport.get(&request).await {
                Ok(response) => response,
                Err(e) => return Exchange::Failed(FailureCause::Transport(e)),
            };
            self.cookies
                .observe(response.set_cookies.iter().map(String::as_str));
            if screen {
                if let Verdict::Blocked { signature } = self.detector.inspect(&response.body) {
                    return Exchange::Blocked(self.raise_block(&request.url, signature));
                }
            }

            let Some(location) = response.redirect_location() else {
                return Exchange::Done(response);
            };
            if hops >= self.max_redirects {
                return Exchange::Failed(FailureCause::Transport(TransportError::Redirect(
                    format!("more than {} redirects from {}", self.max_redirects, url),
                )));
            }
            let next = match request.url.join(location) {
                Ok(next) if matches!(next.scheme(), "http" | "https") => next,
                _ => {
                    return Exchange::Failed(FailureCause::Transport(TransportError::Redirect(
                        format!("unusable Location {:?} from {}", location, request.url),
                    )))
                }
            };
            hops += 1;
            log::debug!("{} redirected to {}", request.url, next);
            request = self.build_request(&next, &identity);
        }
    }

    /// Fetch a document, retrying transient failures with backoff.
    ///
    /// Each retry uses a freshly drawn identity. A challenge page is never
    /// retried: it latches the session and surfaces as
    /// [`FetchError::Blocked`].
    pub async fn fetch(&mut self, path: &str) -> Result<String, FetchError> {
        self.ensure_not_blocked()?;
        let url = self.resolve(path)?;

        let mut attempt = RequestAttempt {
            url: url.to_string(),
            attempt: 0,
            delay_before: Duration::ZERO,
        };

        loop {
            log::debug!(
                "Fetching {} (attempt {}, waited {}ms)",
                attempt.url,
                attempt.attempt + 1,
                attempt.delay_before.as_millis()
            );

            let started = Instant::now();
            let cause = match self.exchange(&url, true).await {
                Exchange::Done(response) if response.is_success() => {
                    self.stats.record_success(started.elapsed());
                    return Ok(response.body);
                }
                Exchange::Done(response) => FailureCause::Status(response.status),
                Exchange::Failed(cause) => cause,
                Exchange::Blocked(err) => return Err(err),
            };
            self.stats.record_failure(&cause);

            match self.retry.decide(&attempt.url, attempt.attempt, &cause) {
                RetryDecision::RetryAfter(delay) => {
                    self.stats.record_retry();
                    sleep(delay).await;
                    attempt = RequestAttempt {
                        url: attempt.url,
                        attempt: attempt.attempt + 1,
                        delay_before: delay,
                    };
                }
                RetryDecision::GiveUp => {
                    let url = attempt.url;
                    return Err(match self.retry.classify(&cause) {
                        Classification::Fatal => FetchError::Fatal { url, cause },
                        Classification::Retryable => FetchError::RetriesExhausted {
                            url,
                            attempts: attempt.attempt + 1,
                            cause,
                        },
                    });
                }
            }
        }
    }

    /// Single advisory request: no retries and no challenge screening. Used
    /// for auxiliary lookups such as robots.txt. Refused once blocked.
    pub async fn probe(&mut self, path: &str) -> Result<RawResponse, FetchError> {
        self.ensure_not_blocked()?;
        let url = self.resolve(path)?;

        let started = Instant::now();
        match self.exchange(&url, false).await {
            Exchange::Done(response) => {
                if response.is_success() {
                    self.stats.record_success(started.elapsed());
                } else {
                    self.stats.record_failure(&FailureCause::Status(response.status));
                }
                Ok(response)
            }
            Exchange::Failed(cause) => {
                self.stats.record_failure(&cause);
                Err(FetchError::Fatal {
                    url: url.to_string(),
                    cause,
                })
            }
            Exchange::Blocked(err) => Err(err),
        }
    }
}
