use crate::models::ListingRecord;
use crate::scrapers::dates::local_today;
use crate::scrapers::extractor::ListingExtractor;
use crate::scrapers::types::ScrapeConfig;
use crate::scrapers::PageFetcher;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use futures::stream::{self, Stream, TryStreamExt};
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

/// One visited results page
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub url: Url,
    pub records: Vec<ListingRecord>,
    /// Absolute URL of the following page, if the page links to one
    pub next_url: Option<Url>,
}

/// Walks the paginated listing pages, starting from one URL
pub struct CrawlController<F> {
    fetcher: F,
    extractor: ListingExtractor,
    listing: Selector,
    next_page: Selector,
    /// Hosts pagination may lead to, subdomains included; empty allows any
    allowed_domains: Vec<String>,
    today: fn() -> NaiveDate,
}

struct CrawlState {
    next: Option<Url>,
    visited: HashSet<Url>,
}

impl<F: PageFetcher> CrawlController<F> {
    pub fn new(fetcher: F, config: &ScrapeConfig) -> Result<Self> {
        let selectors = &config.selectors;
        Ok(Self {
            fetcher,
            extractor: ListingExtractor::new(selectors)?,
            listing: Selector::parse(&selectors.listing)
                .map_err(|e| anyhow!("Invalid listing selector: {:?}", e))?,
            next_page: Selector::parse(&selectors.next_page)
                .map_err(|e| anyhow!("Invalid next page selector: {:?}", e))?,
            allowed_domains: config
                .allowed_domains
                .iter()
                .map(|domain| domain.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|domain| !domain.is_empty())
                .collect(),
            today: local_today,
        })
    }

    /// Replace the clock used for publication date fallbacks
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Every listing of every page, in page order.
    ///
    /// A failed fetch is yielded as an error and ends the crawl.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn crawl(&self, start_url: Url) -> impl Stream<Item = Result<ListingRecord>> + '_ {
        self.pages(start_url)
            .map_ok(|page| stream::iter(page.records.into_iter().map(Ok::<_, anyhow::Error>)))
            .try_flatten()
    }

    /// The crawl one page at a time.
    ///
    /// Stops when a page has no next link, the link leaves the allowed domains,
    /// or it leads back to a page already visited.
    pub fn pages(&self, start_url: Url) -> impl Stream<Item = Result<CrawledPage>> + '_ {
        let state = CrawlState {
            visited: HashSet::from([start_url.clone()]),
            next: Some(start_url),
        };

        stream::try_unfold(state, move |state| self.advance(state))
    }

    async fn advance(&self, mut state: CrawlState) -> Result<Option<(CrawledPage, CrawlState)>> {
        let Some(url) = state.next.take() else {
            return Ok(None);
        };

        let page = self.visit(url).await?;

        state.next = match &page.next_url {
            Some(next) if !state.visited.insert(next.clone()) => {
                warn!("Pagination loops back to {}, stopping", next);
                None
            }
            next => next.clone(),
        };

        Ok(Some((page, state)))
    }

    async fn visit(&self, url: Url) -> Result<CrawledPage> {
        info!("Fetching listing page {}", url);

        let html = self
            .fetcher
            .fetch(&url)
            .await
            .with_context(|| format!("Failed to fetch listing page {}", url))?;

        Ok(self.parse_page(url, &html))
    }

    fn parse_page(&self, url: Url, html: &str) -> CrawledPage {
        let document = Html::parse_document(html);
        let today = (self.today)();

        let records: Vec<ListingRecord> = document
            .select(&self.listing)
            .map(|listing| self.extractor.extract(listing, today))
            .collect();

        let next_url = document
            .select(&self.next_page)
            .find_map(|link| link.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .and_then(|href| match url.join(href) {
                Ok(next) => Some(next),
                Err(e) => {
                    warn!("Ignoring next page link {:?}: {}", href, e);
                    None
                }
            })
            .filter(|next| {
                let allowed = self.is_allowed(next);
                if !allowed {
                    warn!("Next page {} is outside the allowed domains, stopping", next);
                }
                allowed
            });

        info!("Found {} listings on {}", records.len(), url);
        debug!("Next page: {:?}", next_url.as_ref().map(Url::as_str));

        CrawledPage {
            url,
            records,
            next_url,
        }
    }

    fn is_allowed(&self, url: &Url) -> bool {
        if self.allowed_domains.is_empty() {
            return true;
        }

        let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
            return false;
        };

        self.allowed_domains.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}
