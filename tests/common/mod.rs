#![allow(dead_code)]

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use url::Url;

use rust_catalog_scraper::block_detector::BlockDetector;
use rust_catalog_scraper::crawler::{CrawlSettings, Crawler};
use rust_catalog_scraper::error::TransportError;
use rust_catalog_scraper::http_client::{OutboundRequest, RawResponse, Transport};
use rust_catalog_scraper::identity::IdentityRotator;
use rust_catalog_scraper::pacing::Pacer;
use rust_catalog_scraper::parser::HtmlCatalogParser;
use rust_catalog_scraper::retry::RetryPolicy;
use rust_catalog_scraper::session::CrawlSession;

pub const BASE: &str = "https://catalog.test";
pub const SEED: u64 = 7;

pub type RequestLog = Arc<Mutex<Vec<OutboundRequest>>>;

#[derive(Debug, Clone)]
pub enum Scripted {
    Reply(RawResponse),
    Fail(TransportError),
}

pub fn ok(body: impl Into<String>) -> Scripted {
    status(200, body)
}

pub fn status(code: u16, body: impl Into<String>) -> Scripted {
    Scripted::Reply(RawResponse {
        status: code,
        set_cookies: Vec::new(),
        location: None,
        body: body.into(),
    })
}

pub fn with_cookies(code: u16, body: impl Into<String>, cookies: &[&str]) -> Scripted {
    Scripted::Reply(RawResponse {
        status: code,
        set_cookies: cookies.iter().map(|c| c.to_string()).collect(),
        location: None,
        body: body.into(),
    })
}

pub fn redirect(code: u16, location: &str, cookies: &[&str]) -> Scripted {
    Scripted::Reply(RawResponse {
        status: code,
        set_cookies: cookies.iter().map(|c| c.to_string()).collect(),
        location: Some(location.to_string()),
        body: String::new(),
    })
}

pub fn fail(error: TransportError) -> Scripted {
    Scripted::Fail(error)
}

pub fn challenge_page() -> String {
    "<html><head><title>Just a moment...</title></head>\
     <body><div id=\"cf-browser-verification\">Checking your browser before accessing.</div></body></html>"
        .to_string()
}

/// Absolute URL for a site path
pub fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

/// Transport fake that replays canned responses per URL.
///
/// Each URL has a queue; the last entry repeats once the queue is drained.
/// Unscripted URLs answer 404. Every request is recorded.
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    log: RequestLog,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn route(self, url: impl Into<String>, replies: Vec<Scripted>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.into(), replies.into_iter().collect());
        self
    }

    pub fn log(&self) -> RequestLog {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: &OutboundRequest) -> Result<RawResponse, TransportError> {
        self.log.lock().unwrap().push(request.clone());

        let mut routes = self.routes.lock().unwrap();
        let next = match routes.get_mut(request.url.as_str()) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match next {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Fail(error)) => Err(error),
            None => Ok(RawResponse {
                status: 404,
                set_cookies: Vec::new(),
                location: None,
                body: "<html><body>Not Found</body></html>".to_string(),
            }),
        }
    }
}

pub fn requested_urls(log: &RequestLog) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .map(|r| r.url.to_string())
        .collect()
}

pub fn count_requests(log: &RequestLog, target: &str) -> usize {
    requested_urls(log).iter().filter(|u| u.as_str() == target).count()
}

pub fn rotator(user_agents: &[&str]) -> IdentityRotator {
    IdentityRotator::new(
        user_agents.iter().map(|s| s.to_string()).collect(),
        vec!["https://www.google.com/".to_string()],
        StdRng::seed_from_u64(SEED),
    )
    .unwrap()
}

pub fn session(transport: ScriptedTransport) -> CrawlSession<ScriptedTransport> {
    session_with(transport, rotator(&["TestAgent/1.0", "TestAgent/2.0", "TestAgent/3.0"]))
}

pub fn session_with(
    transport: ScriptedTransport,
    identities: IdentityRotator,
) -> CrawlSession<ScriptedTransport> {
    CrawlSession::new(
        transport,
        Url::parse(BASE).unwrap(),
        identities,
        RetryPolicy::default(),
        BlockDetector::default(),
    )
}

pub fn settings(max_pages: u32) -> CrawlSettings {
    CrawlSettings {
        start_path: "/apps".to_string(),
        warmup_path: "/".to_string(),
        max_pages,
        stop_on_empty_page: false,
        check_robots: false,
        robots_agents: vec!["TestAgent/1.0".to_string()],
    }
}

pub fn crawler(
    transport: ScriptedTransport,
    settings: CrawlSettings,
) -> Crawler<ScriptedTransport, HtmlCatalogParser> {
    crawler_with(transport, rotator(&["TestAgent/1.0"]), settings)
}

pub fn crawler_with(
    transport: ScriptedTransport,
    identities: IdentityRotator,
    settings: CrawlSettings,
) -> Crawler<ScriptedTransport, HtmlCatalogParser> {
    Crawler::new(
        session_with(transport, identities),
        HtmlCatalogParser::new(),
        Pacer::new((2_000, 5_000), StdRng::seed_from_u64(SEED + 1)),
        settings,
    )
}

/// Crawler whose pacer always waits exactly `pause_ms`
pub fn crawler_paced(
    transport: ScriptedTransport,
    settings: CrawlSettings,
    pause_ms: u64,
) -> Crawler<ScriptedTransport, HtmlCatalogParser> {
    Crawler::new(
        session(transport),
        HtmlCatalogParser::new(),
        Pacer::new((pause_ms, pause_ms), StdRng::seed_from_u64(SEED + 1)),
        settings,
    )
}

pub fn detail_url(slug: &str) -> String {
    url(&format!("/games/{}.html", slug))
}

/// A list page with one `.post` entry per slug, titled after the slug
pub fn list_page(slugs: &[&str]) -> String {
    let posts: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<article class="post">
                     <div class="post-thumbnail"><img src="https://cdn.catalog.test/{slug}.png"></div>
                     <h2 class="entry-title"><a href="{href}">{title}</a></h2>
                   </article>"#,
                slug = slug,
                href = detail_url(slug),
                title = slug.to_uppercase(),
            )
        })
        .collect();
    format!("<html><body><main>{}</main></body></html>", posts)
}

pub fn detail_page(version: &str, size: &str) -> String {
    format!(
        r#"<html><body>
             <h1 class="entry-title">Some Game (Unlimited Gems)</h1>
             <div class="entry-content"><p>A detailed description.</p></div>
             <table class="apk-info">
               <tr><th>Version</th><td>{}</td></tr>
               <tr><th>Size</th><td>{}</td></tr>
             </table>
             <div class="gallery-item"><img src="https://cdn.catalog.test/shot1.jpg"></div>
           </body></html>"#,
        version, size
    )
}
