use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One listing preview scraped from a search results page.
///
/// Every field is resolved independently, so a record may be partial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub address: Option<String>,
    /// Square meters
    pub area: Option<f64>,
    /// Asking price in whole currency units
    pub price: Option<u64>,
    pub number_of_rooms: Option<u32>,
    pub renovation: Option<String>,
    pub publication_date: Option<NaiveDate>,
}
