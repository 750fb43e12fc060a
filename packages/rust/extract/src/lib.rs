//! Page classification and field normalization for crawled shop pages.
//!
//! This crate provides:
//! - [`classify`]: URL-shape page typing (PDP / PLP / other)
//! - [`normalize`]: collapses multi-valued crawler fields into optional scalars

mod classifier;
mod normalize;

pub use classifier::{PLP_PATTERN, PDP_PATTERN, classify};
pub use normalize::{NormalizedPageRecord, PriceValue, category_name, flatten, normalize};
