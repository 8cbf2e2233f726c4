//! URL handling module for Listing Harvester
//!
//! This module derives the normalized listing query from the invocation URL
//! and builds the paginated request URLs sent to the listing endpoint.

mod listing;
mod page;

// Re-export main functions
pub use listing::{normalize_category, ListingQuery};
pub use page::{page_offset, page_url};
