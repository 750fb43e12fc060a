//! Entity construction from normalized page records.
//!
//! Builders never fail: missing optional data just leaves fields out. The
//! only "no entity" outcome is a listing page with nothing to name it by.

use shopgraph_extract::{NormalizedPageRecord, PriceValue};
use shopgraph_shared::{MappingConfig, PageType};
use tracing::{debug, warn};

use crate::document::{
    CollectionEntity, CustomAttributes, EMBEDDED_FIELDS, EntityDocument, JsonLdContext, Offer,
    ProductEntity,
};
use crate::uri::{EntityUri, UriResolver};

/// Name given to a product whose page had no title.
pub const PRODUCT_NAME_PLACEHOLDER: &str = "Unnamed Product";

/// Price text the crawler emits when a product has no price.
const NOT_AVAILABLE: &str = "N/A";

/// Builds entity documents under one mapping configuration.
#[derive(Debug, Clone)]
pub struct EntityBuilder {
    resolver: UriResolver,
    currency: String,
    availability: String,
}

impl EntityBuilder {
    pub fn new(config: &MappingConfig) -> Self {
        Self {
            resolver: UriResolver::new(config),
            currency: config.default_currency.clone(),
            availability: config.default_availability.clone(),
        }
    }

    pub fn resolver(&self) -> &UriResolver {
        &self.resolver
    }

    /// Published URL and entity URI for a page.
    pub fn locate(&self, url: &str) -> (String, EntityUri) {
        let published = self.resolver.rewrite_domain(url);
        let uri = self.resolver.resolve(&published);
        (published, uri)
    }

    /// Build whatever entity the record's page type calls for.
    ///
    /// Returns `None` for [`PageType::Other`] and for listing pages that
    /// cannot be named.
    pub fn build(&self, record: &NormalizedPageRecord) -> Option<EntityDocument> {
        match record.page_type {
            PageType::ProductDetail => Some(self.build_product(record).into()),
            PageType::ProductListing => self.build_collection(record).map(Into::into),
            PageType::Other => None,
        }
    }

    pub fn build_product(&self, record: &NormalizedPageRecord) -> ProductEntity {
        let (url, id) = self.locate(&record.url);

        let offers = clean_price(record.product_price.as_ref())
            .map(|price| Offer::new(id.offer(1), price, &self.currency, &self.availability));
        if offers.is_none() {
            debug!(url = %record.url, "no usable price, offer omitted");
        }

        ProductEntity {
            context: JsonLdContext::default(),
            kind: "Product",
            name: record
                .title
                .clone()
                .unwrap_or_else(|| PRODUCT_NAME_PLACEHOLDER.to_string()),
            description: record.product_description.clone(),
            url,
            offers,
            category: record.product_category.clone(),
            custom_attributes: custom_attributes(record).encode(),
            embedding_request: EMBEDDED_FIELDS,
            id,
        }
    }

    pub fn build_collection(&self, record: &NormalizedPageRecord) -> Option<CollectionEntity> {
        let Some(name) = record.category_name.clone().or_else(|| record.title.clone()) else {
            warn!(url = %record.url, "listing page has neither category name nor title, skipping");
            return None;
        };
        let (url, id) = self.locate(&record.url);

        Some(CollectionEntity {
            context: JsonLdContext::default(),
            id,
            kind: "CollectionPage",
            name,
            url,
            custom_attributes: custom_attributes(record).encode(),
        })
    }
}

fn custom_attributes(record: &NormalizedPageRecord) -> CustomAttributes<'_> {
    CustomAttributes {
        meta_description: record.meta_description.as_deref(),
        og_title: record.og_title.as_deref(),
        og_description: record.og_description.as_deref(),
        h1: record.h1.as_deref(),
        h2: record.h2.as_deref(),
    }
}

/// Turn a scraped price into a number.
///
/// Numbers pass through. Text keeps only digits and `.` before parsing;
/// anything that still does not parse is logged and treated as no price.
/// Absent and `"N/A"` prices are absent, never zero.
pub fn clean_price(price: Option<&PriceValue>) -> Option<f64> {
    match price? {
        PriceValue::Number(n) if n.is_finite() => Some(*n),
        PriceValue::Number(n) => {
            warn!(price = %n, "non-finite price, treating as absent");
            None
        }
        PriceValue::Text(text) if text.trim() == NOT_AVAILABLE => None,
        PriceValue::Text(text) => {
            let digits: String = text
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            match digits.parse::<f64>() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(price = %text, error = %e, "could not parse price, treating as absent");
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CUSTOM_ATTRIBUTES_PROPERTY, EMBEDDING_REQUEST_PROPERTY};
    use shopgraph_extract::normalize;
    use shopgraph_shared::{FieldValue, RawPageRecord};

    const BASE: &str = "https://data.example.org/shop";

    fn builder() -> EntityBuilder {
        EntityBuilder::new(&MappingConfig {
            base_uri: BASE.into(),
            source_domain: "https://staging.example.org".into(),
            published_domain: "https://www.example.org".into(),
            ..MappingConfig::default()
        })
    }

    fn pdp(raw: RawPageRecord) -> NormalizedPageRecord {
        normalize(&raw, PageType::ProductDetail)
    }

    fn to_json(entity: &ProductEntity) -> serde_json::Value {
        serde_json::to_value(entity).expect("serialize")
    }

    #[test]
    fn clean_price_cases() {
        assert_eq!(clean_price(Some(&PriceValue::Text("£12.50".into()))), Some(12.5));
        assert_eq!(clean_price(Some(&PriceValue::Text("N/A".into()))), None);
        assert_eq!(clean_price(None), None);
        assert_eq!(clean_price(Some(&PriceValue::Number(19.99))), Some(19.99));
        assert_eq!(clean_price(Some(&PriceValue::Text("£1,299.00".into()))), Some(1299.0));
        assert_eq!(clean_price(Some(&PriceValue::Text("Call us".into()))), None);
        assert_eq!(clean_price(Some(&PriceValue::Text("1.2.3".into()))), None);
        assert_eq!(clean_price(Some(&PriceValue::Number(f64::NAN))), None);
    }

    #[test]
    fn red_bag_scenario() {
        let record = pdp(RawPageRecord {
            url: "https://staging.example.org/product/red-bag/".into(),
            title: Some("Red Bag".into()),
            product_price: Some(FieldValue::from("£45")),
            ..RawPageRecord::default()
        });

        let json = to_json(&builder().build_product(&record));
        assert_eq!(json["@id"], format!("{BASE}/product_red-bag"));
        assert_eq!(json["@type"], "Product");
        assert_eq!(json["name"], "Red Bag");
        assert_eq!(json["url"], "https://www.example.org/product/red-bag/");
        assert_eq!(json["offers"]["@id"], format!("{BASE}/product_red-bag/offer_1"));
        assert_eq!(json["offers"]["@type"], "Offer");
        assert_eq!(json["offers"]["price"], "45.0");
        assert_eq!(json["offers"]["priceCurrency"], "GBP");
        assert_eq!(json["offers"]["availability"], "http://schema.org/InStock");
    }

    #[test]
    fn no_price_means_no_offers_key() {
        let record = pdp(RawPageRecord {
            url: "https://www.example.org/product/red-bag/".into(),
            title: Some("Red Bag".into()),
            ..RawPageRecord::default()
        });
        let json = to_json(&builder().build_product(&record));
        assert!(json.get("offers").is_none());

        let record = pdp(RawPageRecord {
            url: "https://www.example.org/product/red-bag/".into(),
            product_price: Some(FieldValue::from("N/A")),
            ..RawPageRecord::default()
        });
        let json = to_json(&builder().build_product(&record));
        assert!(json.get("offers").is_none());
    }

    #[test]
    fn plain_price_yields_offer_suffix() {
        let record = pdp(RawPageRecord {
            url: "https://www.example.org/product/tote/".into(),
            product_price: Some(FieldValue::from("29.99")),
            ..RawPageRecord::default()
        });
        let entity = builder().build_product(&record);
        let offer = entity.offers.expect("offer attached");
        assert!(offer.id.as_str().ends_with("/offer_1"));
        assert_eq!(offer.price, "29.99");
    }

    #[test]
    fn missing_title_uses_placeholder() {
        let record = pdp(RawPageRecord {
            url: "https://www.example.org/product/tote/".into(),
            title: Some(String::new()),
            ..RawPageRecord::default()
        });
        assert_eq!(builder().build_product(&record).name, PRODUCT_NAME_PLACEHOLDER);
    }

    #[test]
    fn optional_product_fields_only_when_present() {
        let record = pdp(RawPageRecord {
            url: "https://www.example.org/product/tote/".into(),
            title: Some("Tote".into()),
            product_description: Some(FieldValue::from(vec!["Canvas.", "Roomy."])),
            product_category: Some(FieldValue::from(vec!["Bags", "Totes"])),
            ..RawPageRecord::default()
        });
        let json = to_json(&builder().build_product(&record));
        assert_eq!(json["description"], "Canvas., Roomy.");
        assert_eq!(json["category"], "Bags, Totes");

        let bare = pdp(RawPageRecord {
            url: "https://www.example.org/product/tote/".into(),
            product_description: Some(FieldValue::List(vec![])),
            ..RawPageRecord::default()
        });
        let json = to_json(&builder().build_product(&bare));
        assert!(json.get("description").is_none());
        assert!(json.get("category").is_none());
    }

    #[test]
    fn embedding_markers_always_attached() {
        let record = pdp(RawPageRecord {
            url: "https://www.example.org/product/tote/".into(),
            ..RawPageRecord::default()
        });
        let json = to_json(&builder().build_product(&record));
        assert_eq!(
            json[EMBEDDING_REQUEST_PROPERTY],
            serde_json::json!(["name", "description"])
        );
        assert_eq!(json["@context"]["@vocab"], "http://schema.org/");
    }

    #[test]
    fn custom_attributes_present_iff_any_field_present() {
        let empty = pdp(RawPageRecord {
            url: "https://www.example.org/product/tote/".into(),
            meta_description: Some(String::new()),
            h1: Some(FieldValue::List(vec![])),
            ..RawPageRecord::default()
        });
        let json = to_json(&builder().build_product(&empty));
        assert!(json.get(CUSTOM_ATTRIBUTES_PROPERTY).is_none());

        let with_og = pdp(RawPageRecord {
            url: "https://www.example.org/product/tote/".into(),
            og_description: Some("A roomy tote".into()),
            ..RawPageRecord::default()
        });
        let json = to_json(&builder().build_product(&with_og));
        let blob = json[CUSTOM_ATTRIBUTES_PROPERTY].as_str().expect("string blob");
        let attrs: serde_json::Value = serde_json::from_str(blob).expect("json blob");
        assert_eq!(attrs, serde_json::json!({"og_description": "A roomy tote"}));
    }

    #[test]
    fn collection_prefers_category_name() {
        let raw = RawPageRecord {
            url: "https://staging.example.org/product-category/bags/".into(),
            title: Some("Bags – Shop".into()),
            h1: Some(FieldValue::from(vec!["Category: Bags"])),
            ..RawPageRecord::default()
        };
        let record = normalize(&raw, PageType::ProductListing);
        let entity = builder().build_collection(&record).expect("collection");
        assert_eq!(entity.name, "Bags");
        assert_eq!(entity.kind, "CollectionPage");
        assert_eq!(entity.id.as_str(), format!("{BASE}/plp_bags"));
        assert_eq!(entity.url, "https://www.example.org/product-category/bags/");
        let attrs: serde_json::Value =
            serde_json::from_str(entity.custom_attributes.as_deref().expect("blob"))
                .expect("json blob");
        assert_eq!(attrs, serde_json::json!({"h1": "Category: Bags"}));
    }

    #[test]
    fn collection_falls_back_to_title_then_skips() {
        let raw = RawPageRecord {
            url: "https://www.example.org/product-category/bags/".into(),
            title: Some("All Bags".into()),
            ..RawPageRecord::default()
        };
        let record = normalize(&raw, PageType::ProductListing);
        let entity = builder().build_collection(&record).expect("collection");
        assert_eq!(entity.name, "All Bags");
        assert!(entity.custom_attributes.is_none());

        let nameless = normalize(
            &RawPageRecord {
                url: "https://www.example.org/product-category/bags/".into(),
                ..RawPageRecord::default()
            },
            PageType::ProductListing,
        );
        assert!(builder().build_collection(&nameless).is_none());
    }

    #[test]
    fn build_dispatches_on_page_type() {
        let b = builder();
        let raw = RawPageRecord {
            url: "https://www.example.org/about/".into(),
            title: Some("About".into()),
            ..RawPageRecord::default()
        };
        assert!(b.build(&normalize(&raw, PageType::Other)).is_none());

        let doc = b
            .build(&normalize(&raw, PageType::ProductDetail))
            .expect("product");
        assert_eq!(doc.kind(), "Product");
        assert_eq!(doc.name(), "About");
    }
}
