//! Field normalization: multi-valued crawler fields → optional scalars.
//!
//! Crawlers hand back most fields as lists of candidate text nodes. Every
//! such field is joined with `", "` and the empty result is then lifted into
//! `None`, so downstream code has exactly one notion of "absent".

use shopgraph_shared::{FieldValue, PageType, RawPageRecord};
use tracing::debug;

/// Separator used when joining multi-valued fields.
const JOIN_SEPARATOR: &str = ", ";

/// Literal heading prefix stripped when deriving a PLP category name.
const CATEGORY_PREFIX: &str = "Category: ";

/// Delimiter whose suffix is taken as the PLP category name.
const CATEGORY_DELIMITER: &str = "@@";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A price as it left normalization: still numeric if the crawler gave a
/// number, otherwise the joined text.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceValue {
    /// Already numeric; passes through price cleaning untouched.
    Number(f64),
    /// Free text such as `"£12.50"` or `"N/A"`.
    Text(String),
}

/// A crawled page with every field collapsed to a single optional value.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPageRecord {
    pub url: String,
    pub page_type: PageType,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub h1: Option<String>,
    pub h2: Option<String>,
    pub product_description: Option<String>,
    pub product_price: Option<PriceValue>,
    pub product_category: Option<String>,
    /// Derived from the first h1 value; only set for listing pages.
    pub category_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Flatten one field to a single string.
///
/// Lists are joined with `", "`, scalars pass through, and an absent field
/// becomes the empty string.
pub fn flatten(field: Option<&FieldValue>) -> String {
    match field {
        Some(FieldValue::List(items)) => items.join(JOIN_SEPARATOR),
        Some(FieldValue::Text(text)) => text.clone(),
        Some(FieldValue::Number(n)) => n.to_string(),
        None => String::new(),
    }
}

/// Normalize a raw record that has already been classified as `page_type`.
pub fn normalize(raw: &RawPageRecord, page_type: PageType) -> NormalizedPageRecord {
    let category_name = match page_type {
        PageType::ProductListing => category_name(raw.h1.as_ref()),
        _ => None,
    };

    let record = NormalizedPageRecord {
        url: raw.url.clone(),
        page_type,
        title: present(raw.title.clone()),
        meta_description: present(raw.meta_description.clone()),
        og_title: present(raw.og_title.clone()),
        og_description: present(raw.og_description.clone()),
        h1: present(Some(flatten(raw.h1.as_ref()))),
        h2: present(Some(flatten(raw.h2.as_ref()))),
        product_description: present(Some(flatten(raw.product_description.as_ref()))),
        product_price: normalize_price(raw.product_price.as_ref()),
        product_category: present(Some(flatten(raw.product_category.as_ref()))),
        category_name,
    };

    debug!(url = %record.url, page_type = %page_type, "record normalized");
    record
}

/// Derive a listing page's category name from its first h1 value.
///
/// Takes the text after a `@@` delimiter when there is one, otherwise strips
/// a literal `"Category: "` prefix. Both heading shapes occur upstream.
pub fn category_name(h1: Option<&FieldValue>) -> Option<String> {
    let first = match h1? {
        FieldValue::List(items) => items.first()?.clone(),
        FieldValue::Text(text) => text.clone(),
        FieldValue::Number(n) => n.to_string(),
    };

    let name = match first.split_once(CATEGORY_DELIMITER) {
        Some((_, suffix)) => suffix,
        None => first.strip_prefix(CATEGORY_PREFIX).unwrap_or(&first),
    };

    present(Some(name.trim().to_string()))
}

fn normalize_price(field: Option<&FieldValue>) -> Option<PriceValue> {
    match field? {
        FieldValue::Number(n) => Some(PriceValue::Number(*n)),
        other => present(Some(flatten(Some(other)))).map(PriceValue::Text),
    }
}

/// Treat the empty string as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
