//! Core domain types for shopgraph ingestion runs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for ingestion run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// PageType
// ---------------------------------------------------------------------------

/// Page category derived from the URL shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    /// A single-product page (PDP).
    ProductDetail,
    /// A category or collection listing page (PLP).
    ProductListing,
    /// Anything else; never ingested.
    Other,
}

impl PageType {
    /// Short label used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductDetail => "PDP",
            Self::ProductListing => "PLP",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RawPageRecord
// ---------------------------------------------------------------------------

/// An extracted field as the crawler emits it: a list of text nodes, a
/// single string, or (for prices) a bare number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A single scalar string.
    Text(String),
    /// Ordered candidate text nodes.
    List(Vec<String>),
    /// An already-numeric value.
    Number(f64),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(String::from).collect())
    }
}

/// One crawled page, read from a JSON-lines input file.
///
/// Absent fields may be omitted or `null`. Keys not listed here (such as a
/// crawler-side `page_type` hint) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPageRecord {
    /// Crawled page URL.
    pub url: String,
    /// `<title>` text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `<meta name="description">` content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    /// `og:title` content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    /// `og:description` content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    /// First-level headings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h1: Option<FieldValue>,
    /// Second-level headings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h2: Option<FieldValue>,
    /// Product description text nodes (PDP only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_description: Option<FieldValue>,
    /// Price text nodes or number (PDP only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_price: Option<FieldValue>,
    /// Category text nodes (PDP only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_category: Option<FieldValue>,
}
