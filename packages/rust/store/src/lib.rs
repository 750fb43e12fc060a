//! Graph store collaborators.
//!
//! The [`EntityStore`] trait is the whole surface the ingestion pipeline
//! needs from a knowledge-graph backend. Two implementations ship here:
//! - [`HttpEntityStore`]: JSON-LD over HTTP against a remote store
//! - [`DryRunStore`]: writes documents as JSON lines instead of uploading

mod dry_run;
mod http;

use std::future::Future;

use serde::{Deserialize, Serialize};
use shopgraph_entities::EntityDocument;
use shopgraph_shared::Result;

pub use dry_run::DryRunStore;
pub use http::HttpEntityStore;

/// One hit from a vector-similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarEntity {
    /// Entity URI of the match.
    pub id: String,
    /// The embedded text that matched.
    #[serde(default)]
    pub text: String,
    /// Similarity score; higher is closer.
    pub score: f64,
}

/// Capabilities required from a knowledge-graph store.
///
/// A handle is acquired once per batch run and [`close`](Self::close)d on
/// every exit path. Calls after `close` fail.
pub trait EntityStore: Send + Sync {
    /// Remove every entity from the target dataset.
    fn delete_all_entities(&self) -> impl Future<Output = Result<()>> + Send;

    /// Create the entity, or replace it if its `@id` already exists.
    fn create_or_update_entity(
        &self,
        document: &EntityDocument,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Rank stored entities by embedding similarity to the page at `seed_url`.
    fn similar_entities(
        &self,
        seed_url: &str,
        top_k: usize,
    ) -> impl Future<Output = Result<Vec<SimilarEntity>>> + Send;

    /// Release the handle.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}
