//! JSON-LD entity documents submitted to the graph store.

use serde::Serialize;

use crate::uri::EntityUri;

/// schema.org vocabulary every document is expressed in.
const SCHEMA_VOCAB: &str = "http://schema.org/";

/// Private namespace for properties outside schema.org.
const PRIVATE_NAMESPACE: &str = "https://w3id.org/shopgraph#";

// Keep these in sync with the serde renames on the document structs.

/// Property carrying the JSON-encoded custom attributes blob.
pub const CUSTOM_ATTRIBUTES_PROPERTY: &str = "sg:customAttributes";

/// Property listing the fields the store should embed.
pub const EMBEDDING_REQUEST_PROPERTY: &str = "sg:embeddingRequest";

/// Text fields the store computes vector embeddings for.
pub const EMBEDDED_FIELDS: [&str; 2] = ["name", "description"];

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// The `@context` block shared by every document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonLdContext {
    #[serde(rename = "@vocab")]
    pub vocab: &'static str,
    pub sg: &'static str,
}

impl Default for JsonLdContext {
    fn default() -> Self {
        Self {
            vocab: SCHEMA_VOCAB,
            sg: PRIVATE_NAMESPACE,
        }
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A priced instance of a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offer {
    #[serde(rename = "@id")]
    pub id: EntityUri,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    /// Decimal string, e.g. `"45.0"`.
    pub price: String,
    #[serde(rename = "priceCurrency")]
    pub price_currency: String,
    pub availability: String,
}

impl Offer {
    pub fn new(id: EntityUri, price: f64, currency: &str, availability: &str) -> Self {
        Self {
            id,
            kind: "Offer",
            price: decimal_string(price),
            price_currency: currency.to_string(),
            availability: availability.to_string(),
        }
    }
}

/// Plain decimal rendering that keeps a fractional part and never uses
/// exponent notation.
fn decimal_string(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{price:.1}")
    } else {
        price.to_string()
    }
}

/// A `Product` node built from a PDP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductEntity {
    #[serde(rename = "@context")]
    pub context: JsonLdContext,
    #[serde(rename = "@id")]
    pub id: EntityUri,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offers: Option<Offer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "sg:customAttributes", skip_serializing_if = "Option::is_none")]
    pub custom_attributes: Option<String>,
    #[serde(rename = "sg:embeddingRequest")]
    pub embedding_request: [&'static str; 2],
}

/// A `CollectionPage` node built from a PLP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionEntity {
    #[serde(rename = "@context")]
    pub context: JsonLdContext,
    #[serde(rename = "@id")]
    pub id: EntityUri,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    pub url: String,
    #[serde(rename = "sg:customAttributes", skip_serializing_if = "Option::is_none")]
    pub custom_attributes: Option<String>,
}

/// Any document the pipeline submits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityDocument {
    Product(ProductEntity),
    Collection(CollectionEntity),
}

impl EntityDocument {
    /// The `@id` the store keys create-or-update on.
    pub fn id(&self) -> &EntityUri {
        match self {
            Self::Product(p) => &p.id,
            Self::Collection(c) => &c.id,
        }
    }

    /// The schema.org `@type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Product(p) => p.kind,
            Self::Collection(c) => c.kind,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Product(p) => &p.name,
            Self::Collection(c) => &c.name,
        }
    }
}

impl From<ProductEntity> for EntityDocument {
    fn from(value: ProductEntity) -> Self {
        Self::Product(value)
    }
}

impl From<CollectionEntity> for EntityDocument {
    fn from(value: CollectionEntity) -> Self {
        Self::Collection(value)
    }
}

// ---------------------------------------------------------------------------
// Custom attributes
// ---------------------------------------------------------------------------

/// Optional page text packed into one opaque JSON string.
///
/// Only present fields are serialized; an all-empty set is never attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomAttributes<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h1: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h2: Option<&'a str>,
}

impl CustomAttributes<'_> {
    pub fn is_empty(&self) -> bool {
        self.meta_description.is_none()
            && self.og_title.is_none()
            && self.og_description.is_none()
            && self.h1.is_none()
            && self.h2.is_none()
    }

    /// Encode as a JSON string, or `None` when nothing is present.
    pub fn encode(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        serde_json::to_string(self).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offer_price_keeps_decimal_point() {
        let id = crate::UriResolver::new(&shopgraph_shared::MappingConfig::default())
            .resolve("https://shop.example/product/a/")
            .offer(1);
        assert_eq!(Offer::new(id.clone(), 45.0, "GBP", "x").price, "45.0");
        assert_eq!(Offer::new(id.clone(), 12.5, "GBP", "x").price, "12.5");
        assert_eq!(Offer::new(id, 19.99, "GBP", "x").price, "19.99");
    }

    #[test]
    fn offer_price_never_uses_exponent_notation() {
        assert_eq!(decimal_string(1e16), "10000000000000000.0");
        assert_eq!(decimal_string(0.00001), "0.00001");
        assert_eq!(decimal_string(0.0), "0.0");
    }

    #[test]
    fn custom_attributes_encode_only_present_keys() {
        let attrs = CustomAttributes {
            og_title: Some("Red Bag | Shop"),
            h2: Some("Details, Delivery"),
            ..CustomAttributes::default()
        };
        let encoded = attrs.encode().expect("non-empty");
        let value: serde_json::Value = serde_json::from_str(&encoded).expect("valid json");
        let obj = value.as_object().expect("object");
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["og_title"], "Red Bag | Shop");
        assert_eq!(obj["h2"], "Details, Delivery");
    }

    #[test]
    fn empty_custom_attributes_are_not_encoded() {
        assert!(CustomAttributes::default().is_empty());
        assert_eq!(CustomAttributes::default().encode(), None);
    }
}
