use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::collections::HashSet;

use crate::block_detector::BlockSignal;
use crate::config::Config;
use crate::error::{ConfigError, CrawlError, FetchError};
use crate::http_client::Transport;
use crate::metrics::CrawlStats;
use crate::models::CrawlItem;
use crate::pacing::Pacer;
use crate::parser::PageParser;
use crate::robots;
use crate::session::CrawlSession;
use crate::sink::RecordSink;

pub const PROGRESS_EVERY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Completed,
    Blocked(BlockSignal),
}

/// Everything one execution produced
#[derive(Debug, Clone)]
pub struct CrawlRun {
    pub items: Vec<CrawlItem>,
    pub stop: StopReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: CrawlStats,
}

impl CrawlRun {
    pub fn was_blocked(&self) -> bool {
        matches!(self.stop, StopReason::Blocked(_))
    }
}

#[derive(Debug, Default)]
pub struct ListingOutcome {
    pub items: Vec<CrawlItem>,
    pub block: Option<BlockSignal>,
    pub pages_fetched: u32,
    pub pages_failed: u32,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct EnrichOutcome {
    pub enriched: usize,
    pub failed: usize,
    pub block: Option<BlockSignal>,
}

/// Knobs for the orchestration layer
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub start_path: String,
    pub warmup_path: String,
    pub max_pages: u32,
    pub stop_on_empty_page: bool,
    pub check_robots: bool,
    /// Agents the robots pre-flight checks besides `*`
    pub robots_agents: Vec<String>,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_path: config.start_path.clone(),
            warmup_path: config.warmup_path.clone(),
            max_pages: config.max_pages,
            stop_on_empty_page: config.stop_on_empty_page,
            check_robots: config.check_robots,
            robots_agents: config.identity.user_agents.clone(),
        }
    }
}

/// Path of list page `page` (1-based)
pub fn list_page_path(start_path: &str, page: u32) -> String {
    if page <= 1 {
        start_path.to_string()
    } else {
        format!("{}/page/{}/", start_path.trim_end_matches('/'), page)
    }
}

pub struct Crawler<T: Transport, P: PageParser> {
    session: CrawlSession<T>,
    parser: P,
    pacer: Pacer,
    settings: CrawlSettings,
}

impl<T: Transport, P: PageParser> Crawler<T, P> {
    pub fn new(session: CrawlSession<T>, parser: P, pacer: Pacer, settings: CrawlSettings) -> Self {
        Self {
            session,
            parser,
            pacer,
            settings,
        }
    }

    /// Wire a crawler from configuration around the given transport
    pub fn from_config(config: &Config, transport: T, parser: P) -> Result<Self, ConfigError> {
        config.validate()?;
        let session = CrawlSession::new(
            transport,
            config.parsed_base_url()?,
            config.identity_rotator()?,
            config.retry_policy(),
            config.block_detector(),
        )
        .with_max_redirects(config.max_redirects);
        Ok(Self::new(
            session,
            parser,
            config.pacer(),
            CrawlSettings::from_config(config),
        ))
    }

    pub fn session(&self) -> &CrawlSession<T> {
        &self.session
    }

    /// Prime the cookie store with one home page fetch. Only a challenge
    /// page is reported back; any other failure is logged and ignored.
    pub async fn warmup(&mut self) -> Result<(), BlockSignal> {
        info!("Warming up session via {}", self.settings.warmup_path);
        match self.session.fetch(&self.settings.warmup_path).await {
            Ok(_) => {
                info!(
                    "Warmup complete, {} cookie(s) stored",
                    self.session.cookies().len()
                );
                Ok(())
            }
            Err(FetchError::Blocked(signal)) => Err(signal),
            Err(e) => {
                warn!("Warmup failed, continuing without primed cookies: {}", e);
                Ok(())
            }
        }
    }

    /// Walk list pages in order, collecting new items until the page ceiling,
    /// an empty page (when configured) or a challenge page.
    pub async fn paginate(&mut self) -> ListingOutcome {
        let mut outcome = ListingOutcome::default();
        let mut seen: HashSet<String> = HashSet::new();

        for page in 1..=self.settings.max_pages {
            if page > 1 {
                self.pacer.pace().await;
            }

            let path = list_page_path(&self.settings.start_path, page);
            info!("Fetching list page {}/{}: {}", page, self.settings.max_pages, path);

            let html = match self.session.fetch(&path).await {
                Ok(html) => html,
                Err(FetchError::Blocked(signal)) => {
                    error!("Pagination stopped at page {}: {}", page, signal);
                    outcome.block = Some(signal);
                    break;
                }
                Err(e) => {
                    warn!("Skipping list page {}: {}", page, e);
                    outcome.pages_failed += 1;
                    self.session.stats_mut().pages_failed += 1;
                    continue;
                }
            };
            outcome.pages_fetched += 1;
            self.session.stats_mut().pages_fetched += 1;

            let stubs = self.parser.parse_list_page(&html);
            let listed = stubs.len();
            let mut added = 0usize;
            let mut dropped = 0usize;
            for stub in stubs {
                let Some(item) = CrawlItem::from_stub(stub) else {
                    dropped += 1;
                    continue;
                };
                if seen.insert(item.slug.clone()) {
                    outcome.items.push(item);
                    added += 1;
                }
            }
            self.session.stats_mut().items_discovered += added as u64;
            if dropped > 0 {
                warn!("Dropped {} incomplete entries on page {}", dropped, page);
            }
            info!(
                "Page {}: {} new items ({} listed, {} total)",
                page,
                added,
                listed,
                outcome.items.len()
            );

            if listed == 0 && self.settings.stop_on_empty_page {
                info!("Page {} listed nothing, ending pagination", page);
                break;
            }
        }

        outcome
    }

    /// Fetch each item's detail page and merge the fields in place.
    pub async fn enrich(&mut self, items: &mut [CrawlItem]) -> EnrichOutcome {
        let mut outcome = EnrichOutcome::default();
        let total = items.len();

        for (index, item) in items.iter_mut().enumerate() {
            self.pacer.pace().await;

            match self.session.fetch(&item.detail_url).await {
                Ok(html) => {
                    item.apply_details(self.parser.parse_detail_page(&html));
                    outcome.enriched += 1;
                    self.session.stats_mut().items_enriched += 1;
                }
                Err(FetchError::Blocked(signal)) => {
                    error!(
                        "Detail fetching stopped at item {}/{} ({}): {}",
                        index + 1,
                        total,
                        item.slug,
                        signal
                    );
                    outcome.block = Some(signal);
                    break;
                }
                Err(e) => {
                    warn!("Failed details for {}: {}", item.title, e);
                    outcome.failed += 1;
                    self.session.stats_mut().items_failed += 1;
                }
            }

            if (index + 1) % PROGRESS_EVERY == 0 {
                info!("Progress: {}/{} items processed", index + 1, total);
            }
        }

        outcome
    }

    /// Run every phase and return what was collected, without persisting.
    pub async fn crawl(&mut self) -> CrawlRun {
        let started_at = Utc::now();
        let mut items = Vec::new();

        let stop = match self.collect(&mut items).await {
            Some(signal) => StopReason::Blocked(signal),
            None => StopReason::Completed,
        };

        let stats = self.session.stats().clone();
        stats.log_summary();
        CrawlRun {
            items,
            stop,
            started_at,
            finished_at: Utc::now(),
            stats,
        }
    }

    async fn collect(&mut self, items: &mut Vec<CrawlItem>) -> Option<BlockSignal> {
        if self.settings.check_robots {
            robots::preflight(
                &mut self.session,
                &self.settings.start_path,
                &self.settings.robots_agents,
            )
            .await;
        }

        if let Err(signal) = self.warmup().await {
            error!("Blocked during warmup, nothing collected");
            return Some(signal);
        }

        let listing = self.paginate().await;
        info!(
            "Pagination finished: {} items from {} pages ({} failed)",
            listing.items.len(),
            listing.pages_fetched,
            listing.pages_failed
        );
        *items = listing.items;
        if listing.block.is_some() {
            warn!("Skipping detail fetch after block; keeping listing data only");
            return listing.block;
        }

        let enrichment = self.enrich(items).await;
        info!(
            "Detail fetch finished: {} enriched, {} failed",
            enrichment.enriched, enrichment.failed
        );
        enrichment.block
    }

    /// Crawl, then hand the collected items to the sink exactly once.
    pub async fn run<S: RecordSink>(&mut self, sink: &mut S) -> Result<CrawlRun, CrawlError> {
        let run = self.crawl().await;
        match sink.write(&run.items) {
            Ok(()) => Ok(run),
            Err(source) => {
                error!("Failed to persist {} items: {}", run.items.len(), source);
                Err(CrawlError::Sink {
                    source,
                    run: Box::new(run),
                })
            }
        }
    }
}
