use anyhow::Result;
use async_trait::async_trait;
use url::Url;

/// Source of raw listing pages
/// Lets the crawl run against the live site or an in-memory fixture
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the HTML body of a page
    async fn fetch(&self, url: &Url) -> Result<String>;
}
