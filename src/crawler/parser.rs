//! HTML extractor for listing pages
//!
//! A listing page is an HTML fragment where every product is an element
//! carrying the `canvas` class. The element's `href` is the product URL and
//! its `data-history-target` attribute is the stable product identifier.

use crate::storage::ListingRecord;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Structural marker of one listing element
pub const LISTING_SELECTOR: &str = "body .canvas";

/// Attribute holding the product URL
pub const URL_ATTR: &str = "href";

/// Attribute holding the stable product identifier
pub const PRODUCT_ID_ATTR: &str = "data-history-target";

static LISTING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(LISTING_SELECTOR).expect("valid listing selector"));

/// Extracts listing records from a page body, in document order
///
/// Elements missing a URL or an identifier are skipped. An empty result is
/// not an error; the caller treats it as the end of the listing.
///
/// # Example
///
/// ```
/// use listing_harvester::crawler::extract_listings;
///
/// let html = r#"<a class="canvas" href="/p/1" data-history-target="1"></a>"#;
/// let records = extract_listings(html);
/// assert_eq!(records[0].product_id, "1");
/// ```
pub fn extract_listings(html: &str) -> Vec<ListingRecord> {
    let document = Html::parse_document(html);

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for element in document.select(&LISTING) {
        match read_listing(element) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} listing element(s) missing url or id", skipped);
    }

    records
}

fn read_listing(element: ElementRef<'_>) -> Option<ListingRecord> {
    let url = non_empty_attr(element, URL_ATTR)?;
    let product_id = non_empty_attr(element, PRODUCT_ID_ATTR)?;
    Some(ListingRecord::new(product_id, url))
}

fn non_empty_attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
