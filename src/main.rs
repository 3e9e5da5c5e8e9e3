mod models;
mod scrapers;

use anyhow::Context;
use futures::TryStreamExt;
use scrapers::{CrawlController, HttpFetcher, ScrapeConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🏠 Realty Scout - lun.ua listing scraper");

    let config = ScrapeConfig::from_env()?;
    let start_url = Url::parse(&config.start_url)
        .with_context(|| format!("Invalid start URL: {}", config.start_url))?;

    let fetcher = HttpFetcher::new(&config)?;
    let crawler = CrawlController::new(fetcher, &config)?;

    info!("Starting crawl from {}", start_url);

    let pages = crawler.pages(start_url);
    tokio::pin!(pages);

    let mut listings = Vec::new();
    let mut page_count = 0usize;

    loop {
        match pages.try_next().await {
            Ok(Some(page)) => {
                page_count += 1;
                info!("Page {} ({}): {} listings", page_count, page.url, page.records.len());
                listings.extend(page.records);
            }
            Ok(None) => break,
            // Nothing was scraped if the first page could not be fetched
            Err(e) if page_count == 0 => return Err(e),
            Err(e) => {
                error!("Crawl stopped early: {:#}", e);
                break;
            }
        }
    }

    info!("✅ Scraped {} listings from {} pages", listings.len(), page_count);

    let json = serde_json::to_string_pretty(&listings)?;
    tokio::fs::write(&config.output_path, json)
        .await
        .with_context(|| format!("Failed to write {}", config.output_path))?;
    info!("💾 Saved listings to {}", config.output_path);

    Ok(())
}
