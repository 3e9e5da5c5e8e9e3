pub mod crawler;
pub mod dates;
pub mod extractor;
pub mod http;
pub mod traits;
pub mod types;

pub use crawler::CrawlController;
pub use http::HttpFetcher;
pub use traits::PageFetcher;
pub use types::ScrapeConfig;
