use log::{error, info};
use std::process::ExitCode;

use rust_catalog_scraper::config::{Config, DEFAULT_CONFIG_PATH};
use rust_catalog_scraper::crawler::{CrawlRun, Crawler, StopReason};
use rust_catalog_scraper::error::CrawlError;
use rust_catalog_scraper::logging;
use rust_catalog_scraper::parser::HtmlCatalogParser;
use rust_catalog_scraper::sink::JsonFileSink;

async fn run(config_path: &str) -> Result<CrawlRun, CrawlError> {
    let cfg = Config::load(config_path)?;

    info!("Catalog crawler initialized:");
    info!("  Target: {}{}", cfg.base_url, cfg.start_path);
    info!("  Max pages: {}", cfg.max_pages);
    info!("  Max attempts per request: {}", cfg.max_retries);
    info!("  Pacing: {}-{}ms", cfg.pace_range_ms[0], cfg.pace_range_ms[1]);
    info!("  Output: {}", cfg.output_path);

    let transport = cfg.create_transport()?;
    let mut crawler = Crawler::from_config(&cfg, transport, HtmlCatalogParser::new())?;
    let mut sink = JsonFileSink::new(&cfg.output_path);
    crawler.run(&mut sink).await
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init(logging::DEFAULT_LOG_CONFIG);

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    match run(&config_path).await {
        Ok(run) => {
            match &run.stop {
                StopReason::Completed => info!("Crawl complete: {} items", run.items.len()),
                StopReason::Blocked(signal) => info!(
                    "Crawl stopped early by {}; saved {} items",
                    signal,
                    run.items.len()
                ),
            }
            ExitCode::SUCCESS
        }
        Err(CrawlError::Sink { source, run }) => {
            error!("Could not save results: {}", source);
            // Last resort so the collected data is not lost
            match serde_json::to_string_pretty(&run.items) {
                Ok(json) => println!("{}", json),
                Err(e) => error!("Could not dump results either: {}", e),
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
