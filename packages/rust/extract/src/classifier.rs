//! URL-shape page classifier.

use shopgraph_shared::PageType;

/// Substring marking a category/listing page.
pub const PLP_PATTERN: &str = "/product-category/";

/// Substring marking a single-product page.
pub const PDP_PATTERN: &str = "/product/";

/// Label a page from its URL alone.
///
/// The listing pattern is checked first, so a URL carrying both patterns is
/// a listing page. Never fails: anything unmatched is [`PageType::Other`].
pub fn classify(url: &str) -> PageType {
    if url.contains(PLP_PATTERN) {
        PageType::ProductListing
    } else if url.contains(PDP_PATTERN) {
        PageType::ProductDetail
    } else {
        PageType::Other
    }
}
