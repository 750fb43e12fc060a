//! A store that prints documents instead of uploading them.

use std::io::Write;
use std::sync::Mutex;

use tracing::info;

use shopgraph_entities::EntityDocument;
use shopgraph_shared::{Result, ShopGraphError};

use crate::{EntityStore, SimilarEntity};

/// Writes each submitted document as one JSON line.
///
/// Cleanup is a no-op and similarity queries are unsupported.
pub struct DryRunStore {
    out: Mutex<Box<dyn Write + Send>>,
}

impl DryRunStore {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    /// Dry-run store printing to stdout.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    fn with_writer<T>(&self, f: impl FnOnce(&mut dyn Write) -> std::io::Result<T>) -> Result<T> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| ShopGraphError::Store("dry-run writer poisoned".into()))?;
        f(&mut **out).map_err(|e| ShopGraphError::Store(format!("dry-run write failed: {e}")))
    }
}

impl EntityStore for DryRunStore {
    async fn delete_all_entities(&self) -> Result<()> {
        info!("dry run: skipping delete-all");
        Ok(())
    }

    async fn create_or_update_entity(&self, document: &EntityDocument) -> Result<()> {
        let line = serde_json::to_string(document)
            .map_err(|e| ShopGraphError::Store(format!("failed to encode document: {e}")))?;
        self.with_writer(|out| writeln!(out, "{line}"))
    }

    async fn similar_entities(&self, _seed_url: &str, _top_k: usize) -> Result<Vec<SimilarEntity>> {
        Err(ShopGraphError::Store(
            "similarity queries need a live store, not a dry run".into(),
        ))
    }

    async fn close(&self) -> Result<()> {
        self.with_writer(|out| out.flush())
    }
}
