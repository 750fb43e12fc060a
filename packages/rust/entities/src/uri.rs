//! Entity URI minting.
//!
//! Identifiers are a pure function of the (rewritten) page URL, so
//! re-ingesting the same page always targets the same graph node and the
//! store's create-or-update overwrites instead of duplicating.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Serialize;
use shopgraph_shared::MappingConfig;
use url::Url;

/// Path segment marking a product page.
const PRODUCT_SEGMENT: &str = "product";

/// Path segment marking a category page.
const CATEGORY_SEGMENT: &str = "product-category";

/// Fragment that turns a page URL into its offer URL.
const OFFER_FRAGMENT: &str = "offer";

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("valid regex"));

// ---------------------------------------------------------------------------
// EntityUri
// ---------------------------------------------------------------------------

/// Canonical identifier of a knowledge-graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityUri(String);

impl EntityUri {
    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URI of this entity's `n`th offer sub-resource (`<uri>/offer_<n>`).
    pub fn offer(&self, n: u32) -> EntityUri {
        EntityUri(format!("{}/offer_{n}", self.0))
    }
}

impl std::fmt::Display for EntityUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// UriResolver
// ---------------------------------------------------------------------------

/// Mints entity URIs under a fixed base namespace.
#[derive(Debug, Clone)]
pub struct UriResolver {
    base_uri: String,
    source_domain: String,
    published_domain: String,
}

impl UriResolver {
    pub fn new(config: &MappingConfig) -> Self {
        Self {
            base_uri: config.base_uri.trim_end_matches('/').to_string(),
            source_domain: config.source_domain.clone(),
            published_domain: config.published_domain.clone(),
        }
    }

    /// Swap the crawled origin for the published one.
    ///
    /// Only a leading `source_domain` prefix is replaced, and only once.
    /// Anything else is returned unchanged.
    pub fn rewrite_domain(&self, url: &str) -> String {
        if self.source_domain.is_empty() {
            return url.to_string();
        }
        match url.strip_prefix(&self.source_domain) {
            Some(rest) => format!("{}{rest}", self.published_domain),
            None => url.to_string(),
        }
    }

    /// Resolve a page URL to its entity URI. Total: every input yields one.
    pub fn resolve(&self, url: &str) -> EntityUri {
        let (path, fragment) = split_url(url);
        let stripped = path.trim_matches('/');
        let segments: Vec<&str> = stripped.split('/').collect();
        let last = segments.last().copied().unwrap_or_default();
        let is_offer = fragment.as_deref() == Some(OFFER_FRAGMENT);

        let identifier = if segments.contains(&PRODUCT_SEGMENT) {
            if is_offer {
                format!("offer_{last}")
            } else {
                format!("product_{last}")
            }
        } else if segments.contains(&CATEGORY_SEGMENT) {
            format!("plp_{last}")
        } else {
            // Sanitize the characters as written, not their %XX escapes.
            let decoded = percent_decode_str(stripped).decode_utf8_lossy();
            let sanitized = NON_ALPHANUMERIC.replace_all(&decoded, "_");
            if is_offer {
                format!("offer_{sanitized}")
            } else {
                format!("page_{sanitized}")
            }
        };

        EntityUri(format!("{}/{identifier}", self.base_uri))
    }
}

/// Split a URL into its path and fragment.
///
/// Strings that do not parse as absolute URLs are treated as bare paths so
/// resolution never fails.
fn split_url(url: &str) -> (String, Option<String>) {
    if let Ok(parsed) = Url::parse(url) {
        return (
            parsed.path().to_string(),
            parsed.fragment().map(String::from),
        );
    }

    let (rest, fragment) = match url.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment.to_string())),
        None => (url, None),
    };
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    (path.to_string(), fragment)
}
