//! Knowledge-graph entity mapping for normalized shop pages.
//!
//! This crate provides:
//! - [`UriResolver`]: stable, idempotent entity identifiers from page URLs
//! - [`EntityBuilder`]: Product / CollectionPage JSON-LD documents
//! - [`clean_price`]: price text → number normalization

mod builder;
mod document;
mod uri;

pub use builder::{EntityBuilder, PRODUCT_NAME_PLACEHOLDER, clean_price};
pub use document::{
    CUSTOM_ATTRIBUTES_PROPERTY, CollectionEntity, CustomAttributes, EMBEDDED_FIELDS,
    EMBEDDING_REQUEST_PROPERTY, EntityDocument, JsonLdContext, Offer, ProductEntity,
};
pub use uri::{EntityUri, UriResolver};
