use crate::models::ListingRecord;
use crate::scrapers::dates::normalize_date;
use crate::scrapers::types::SelectorConfig;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use scraper::{ElementRef, Selector};
use tracing::debug;

/// Turns one listing preview into a [`ListingRecord`]
pub struct ListingExtractor {
    address: Selector,
    price: Selector,
    info: Selector,
    renovation_column: Selector,
    renovation_item: Selector,
    renovation_label: Selector,
    dates_container: Selector,
    date_label: Selector,
}

/// Position of the renovation entry among a listing's property items
const RENOVATION_ITEM_INDEX: usize = 3;
const ROOMS_INFO_INDEX: usize = 0;
const AREA_INFO_INDEX: usize = 1;

impl ListingExtractor {
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            address: parse_selector(&selectors.address)?,
            price: parse_selector(&selectors.price)?,
            info: parse_selector(&selectors.info)?,
            renovation_column: parse_selector(&selectors.renovation_column)?,
            renovation_item: parse_selector(&selectors.renovation_item)?,
            renovation_label: parse_selector(&selectors.renovation_label)?,
            dates_container: parse_selector(&selectors.dates_container)?,
            date_label: parse_selector(&selectors.date_label)?,
        })
    }

    /// Extract every field of a listing; a field that can't be read is left empty.
    ///
    /// `today` is the fallback for publication dates that are present but unreadable.
    pub fn extract(&self, listing: ElementRef<'_>, today: NaiveDate) -> ListingRecord {
        ListingRecord {
            address: self.address(listing),
            area: self.area(listing),
            price: self.price(listing),
            number_of_rooms: self.number_of_rooms(listing),
            renovation: self.renovation(listing),
            publication_date: self.publication_date(listing, today),
        }
    }

    fn address(&self, listing: ElementRef<'_>) -> Option<String> {
        text_nodes(listing, &self.address)
            .next()
            .map(str::to_string)
    }

    fn price(&self, listing: ElementRef<'_>) -> Option<u64> {
        let text = text_nodes(listing, &self.price).next()?;
        let price = parse_price(text);
        if price.is_none() {
            debug!("Unreadable price: {:?}", text);
        }
        price
    }

    fn area(&self, listing: ElementRef<'_>) -> Option<f64> {
        let text = text_nodes(listing, &self.info).nth(AREA_INFO_INDEX)?;
        parse_area(text)
    }

    fn number_of_rooms(&self, listing: ElementRef<'_>) -> Option<u32> {
        let text = text_nodes(listing, &self.info).nth(ROOMS_INFO_INDEX)?;
        text.split_whitespace().next()?.parse().ok()
    }

    fn renovation(&self, listing: ElementRef<'_>) -> Option<String> {
        let item = listing
            .select(&self.renovation_column)
            .flat_map(|column| column.select(&self.renovation_item))
            .nth(RENOVATION_ITEM_INDEX)?;

        let label = text_nodes(item, &self.renovation_label).next()?.trim();
        (!label.is_empty()).then(|| label.to_string())
    }

    fn publication_date(&self, listing: ElementRef<'_>, today: NaiveDate) -> Option<NaiveDate> {
        let mut containers = listing.select(&self.dates_container).peekable();
        containers.peek()?;

        let text = containers
            .flat_map(|container| text_nodes(container, &self.date_label))
            .last()?;

        Some(normalize_date(text, today))
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("Invalid selector {:?}: {:?}", selector, e))
}

/// Direct text children of every element matching `selector`, in document order
fn text_nodes<'a>(
    scope: ElementRef<'a>,
    selector: &'a Selector,
) -> impl Iterator<Item = &'a str> + 'a {
    scope.select(selector).flat_map(|element| {
        element
            .children()
            .filter_map(|node| node.value().as_text())
            .map(|text| &**text)
    })
}

/// Concatenate every digit of a price label: `12 345 грн` is 12345
pub fn parse_price(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Square meters from an info label such as `54.5` or `54,5`
pub fn parse_area(text: &str) -> Option<f64> {
    let area: f64 = text.trim().replace(',', ".").parse().ok()?;
    area.is_finite().then_some(area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn extractor() -> ListingExtractor {
        ListingExtractor::new(&SelectorConfig::default()).unwrap()
    }

    /// Parse `body` and extract the first listing preview in it
    fn extract_listing(body: &str) -> ListingRecord {
        let html = Html::parse_document(&format!(
            r#"<html><body><div class="realty-preview__base">{}</div></body></html>"#,
            body
        ));
        let listing_selector = Selector::parse("div.realty-preview__base").unwrap();
        let listing = html.select(&listing_selector).next().unwrap();
        extractor().extract(listing, today())
    }

    const FULL_LISTING: &str = r#"
        <h3 class="realty-preview-title"><button>вул. Галицька, 12</button></h3>
        <div class="realty-preview-price">12 345 грн</div>
        <span class="realty-preview-info">2 кім.</span>
        <span class="realty-preview-info">54.5
</span>
        <div class="Grid-module_col__der3x">
            <div class="realty-preview-properties-item"><span>Цегла</span></div>
            <div class="realty-preview-properties-item"><span>5 поверх</span></div>
            <div class="realty-preview-properties-item"><span>2015 р.</span></div>
            <div class="realty-preview-properties-item"><span>
                З ремонтом
            </span></div>
        </div>
        <div class="realty-preview-dates">
            <div class="Grid-module_container__1mSeI">
                <span>Оновлено</span>
                <span>15 травня 2023</span>
            </div>
        </div>
    "#;

    #[test]
    fn test_extracts_full_listing() {
        let record = extract_listing(FULL_LISTING);

        assert_eq!(record.address.as_deref(), Some("вул. Галицька, 12"));
        assert_eq!(record.price, Some(12345));
        assert_eq!(record.number_of_rooms, Some(2));
        assert_eq!(record.area, Some(54.5));
        assert_eq!(record.renovation.as_deref(), Some("З ремонтом"));
        assert_eq!(record.publication_date, NaiveDate::from_ymd_opt(2023, 5, 15));
    }

    #[test]
    fn test_empty_listing_has_no_fields() {
        let record = extract_listing("<p>nothing here</p>");
        assert_eq!(record, ListingRecord::default());
    }

    #[test]
    fn test_extract_is_repeatable() {
        let html = Html::parse_document(&format!(
            r#"<div class="realty-preview__base">{}</div>"#,
            FULL_LISTING
        ));
        let listing_selector = Selector::parse("div.realty-preview__base").unwrap();
        let listing = html.select(&listing_selector).next().unwrap();
        let extractor = extractor();

        assert_eq!(extractor.extract(listing, today()), extractor.extract(listing, today()));
    }

    #[test]
    fn test_price_without_digits_is_absent() {
        let record = extract_listing(r#"<div class="realty-preview-price">Ціна договірна</div>"#);
        assert_eq!(record.price, None);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("12 345 грн"), Some(12345));
        assert_eq!(parse_price("$ 48 000"), Some(48000));
        assert_eq!(parse_price("грн"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("99999999999999999999999"), None);
    }

    #[test]
    fn test_parse_area() {
        assert_eq!(parse_area("54.5 \n"), Some(54.5));
        assert_eq!(parse_area(" 38,2"), Some(38.2));
        assert_eq!(parse_area("5 поверх"), None);
        assert_eq!(parse_area(""), None);
        assert_eq!(parse_area("NaN"), None);
    }

    #[test]
    fn test_single_info_span_has_rooms_but_no_area() {
        let record = extract_listing(r#"<span class="realty-preview-info">3 кім.</span>"#);
        assert_eq!(record.number_of_rooms, Some(3));
        assert_eq!(record.area, None);
    }

    #[test]
    fn test_unparsable_info_fields_are_absent() {
        let record = extract_listing(
            r#"<span class="realty-preview-info">кімнати</span>
               <span class="realty-preview-info">площа</span>"#,
        );
        assert_eq!(record.number_of_rooms, None);
        assert_eq!(record.area, None);
    }

    #[test]
    fn test_short_property_list_has_no_renovation() {
        let record = extract_listing(
            r#"<div class="Grid-module_col__der3x">
                <div class="realty-preview-properties-item"><span>Цегла</span></div>
                <div class="realty-preview-properties-item"><span>5 поверх</span></div>
                <div class="realty-preview-properties-item"><span>2015 р.</span></div>
            </div>"#,
        );
        assert_eq!(record.renovation, None);
    }

    #[test]
    fn test_renovation_item_without_label_is_absent() {
        let record = extract_listing(
            r#"<div class="Grid-module_col__der3x">
                <div class="realty-preview-properties-item"><span>a</span></div>
                <div class="realty-preview-properties-item"><span>b</span></div>
                <div class="realty-preview-properties-item"><span>c</span></div>
                <div class="realty-preview-properties-item"><b>d</b></div>
            </div>"#,
        );
        assert_eq!(record.renovation, None);
    }

    #[test]
    fn test_unreadable_date_falls_back_to_today() {
        let record = extract_listing(
            r#"<div class="realty-preview-dates">
                <div class="Grid-module_container__1mSeI"><span>нещодавно</span></div>
            </div>"#,
        );
        assert_eq!(record.publication_date, Some(today()));
    }

    #[test]
    fn test_dates_container_without_labels_is_absent() {
        let record = extract_listing(
            r#"<div class="realty-preview-dates">
                <div class="Grid-module_container__1mSeI"></div>
            </div>"#,
        );
        assert_eq!(record.publication_date, None);
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let selectors = SelectorConfig {
            price: "div[".to_string(),
            ..Default::default()
        };
        assert!(ListingExtractor::new(&selectors).is_err());
    }
}
