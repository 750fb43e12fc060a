//! Core pipeline orchestration for shopgraph.
//!
//! This crate ties together classification, normalization, entity mapping,
//! and the graph store into the end-to-end ingestion run.

pub mod input;
pub mod pipeline;
