use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

const START_URL_ENV: &str = "SCOUT_START_URL";
const OUTPUT_ENV: &str = "SCOUT_OUTPUT";
const TIMEOUT_ENV: &str = "SCOUT_TIMEOUT_SECS";
const USER_AGENT_ENV: &str = "SCOUT_USER_AGENT";
const ALLOWED_DOMAINS_ENV: &str = "SCOUT_ALLOWED_DOMAINS";

/// CSS selectors describing the structure of a listing page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// One match per listing preview on a results page
    pub listing: String,
    /// Pagination link, its `href` points at the next page
    pub next_page: String,
    pub address: String,
    pub price: String,
    /// Info spans: rooms first, area second
    pub info: String,
    /// Grid column holding the property items
    pub renovation_column: String,
    pub renovation_item: String,
    pub renovation_label: String,
    pub dates_container: String,
    pub date_label: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing: "div.realty-preview__base".to_string(),
            next_page: "a.paging-nav--right".to_string(),
            address: "h3.realty-preview-title > button".to_string(),
            price: ".realty-preview-price".to_string(),
            info: "span.realty-preview-info".to_string(),
            renovation_column: "div.Grid-module_col__der3x".to_string(),
            renovation_item: "div.realty-preview-properties-item".to_string(),
            renovation_label: "span".to_string(),
            dates_container: ".realty-preview-dates > .Grid-module_container__1mSeI".to_string(),
            date_label: "span".to_string(),
        }
    }
}

/// Settings for one scrape run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// First results page of the crawl
    pub start_url: String,
    /// Where the scraped records are written as JSON
    pub output_path: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Pagination is only followed to these hosts and their subdomains
    pub allowed_domains: Vec<String>,
    pub selectors: SelectorConfig,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            // Sale listings in Ivano-Frankivsk
            start_url: "https://lun.ua/uk/%D0%BF%D1%80%D0%BE%D0%B4%D0%B0%D0%B6-%D0%BA%D0%B2%D0%B0%D1%80%D1%82%D0%B8%D1%80-%D1%96%D0%B2%D0%B0%D0%BD%D0%BE-%D1%84%D1%80%D0%B0%D0%BD%D0%BA%D1%96%D0%B2%D1%81%D1%8C%D0%BA".to_string(),
            output_path: "scraped_listings.json".to_string(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            allowed_domains: vec!["lun.ua".to_string()],
            selectors: SelectorConfig::default(),
        }
    }
}

impl ScrapeConfig {
    /// Defaults overridden by `SCOUT_*` environment variables (a `.env` file is honored)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(start_url) = lookup(START_URL_ENV) {
            config.start_url = start_url;
        }
        if let Some(output_path) = lookup(OUTPUT_ENV) {
            config.output_path = output_path;
        }
        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            config.timeout_secs = parse_var(TIMEOUT_ENV, &timeout)?;
        }
        if let Some(user_agent) = lookup(USER_AGENT_ENV) {
            config.user_agent = user_agent;
        }
        if let Some(domains) = lookup(ALLOWED_DOMAINS_ENV) {
            config.allowed_domains = domains
                .split(',')
                .map(str::trim)
                .filter(|domain| !domain.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
}
