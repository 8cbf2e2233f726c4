//! Listing query derivation from the invocation URL
use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

/// Category segment that the listing endpoint knows under another name
const TAG_SEGMENT: &str = "tag";
const SUBJECT_SEGMENT: &str = "subject";

/// Normalized `category/subcategory` pair sent to the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingQuery {
    category: String,
    subcategory: String,
}

impl ListingQuery {
    /// Builds a query from its two segments, normalizing the category
    pub fn new(category: &str, subcategory: &str) -> UrlResult<Self> {
        let category = category.trim();
        let subcategory = subcategory.trim();

        if category.is_empty() || subcategory.is_empty() {
            return Err(UrlError::MissingCategory(format!(
                "{}/{}",
                category, subcategory
            )));
        }

        Ok(Self {
            category: normalize_category(category).to_string(),
            subcategory: subcategory.to_string(),
        })
    }

    /// Derives the query from a listing page URL
    ///
    /// The scheme is optional (`www.icanvas.com/canvas-art-prints/tag/dogs`
    /// is accepted). The last two path segments are the category and the
    /// subcategory; a `tag` category is rewritten to `subject`.
    ///
    /// # Examples
    ///
    /// ```
    /// use listing_harvester::url::ListingQuery;
    ///
    /// let query = ListingQuery::from_listing_url("www.icanvas.com/canvas-art-prints/tag/dogs").unwrap();
    /// assert_eq!(query.to_string(), "subject/dogs");
    /// ```
    pub fn from_listing_url(input: &str) -> UrlResult<Self> {
        let input = input.trim();
        let with_scheme = if input.contains("://") {
            input.to_string()
        } else {
            format!("https://{}", input)
        };

        let url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [.., category, subcategory] => Self::new(category, subcategory),
            _ => Err(UrlError::MissingCategory(input.to_string())),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subcategory(&self) -> &str {
        &self.subcategory
    }
}

impl fmt::Display for ListingQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.subcategory)
    }
}

/// Rewrites the `tag` category to `subject`; anything else passes through
pub fn normalize_category(segment: &str) -> &str {
    if segment == TAG_SEGMENT {
        SUBJECT_SEGMENT
    } else {
        segment
    }
}
