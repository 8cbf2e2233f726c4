use crate::url::ListingQuery;
use url::Url;

/// Fixed parameters the listing module expects on every page request
const LISTING_PARAMS: &[(&str, &str)] = &[
    ("fc", "module"),
    ("module", "icacanvas"),
    ("controller", "list"),
    ("ajax", "true"),
    ("active_category_query_full", "[]"),
];

/// Offset of the first listing on a page
pub fn page_offset(page_index: u32, page_size: u32) -> u64 {
    u64::from(page_index) * u64::from(page_size)
}

/// Builds the request URL for one listing page
///
/// Any query string already on the endpoint is replaced.
pub fn page_url(endpoint: &Url, query: &ListingQuery, page_index: u32, page_size: u32) -> Url {
    let mut url = endpoint.clone();
    let query = query.to_string();
    let start = page_offset(page_index, page_size).to_string();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(LISTING_PARAMS.iter().copied())
        .append_pair("start", &start)
        .append_pair("query", &query)
        .append_pair("base_query", &query);

    url
}
