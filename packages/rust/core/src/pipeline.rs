//! End-to-end ingestion run: pages → classify → normalize → resolve → build → store.
//!
//! A run has two phases. The optional cleanup phase deletes everything in the
//! store; if it fails the run aborts before a single submission. The ingest
//! phase then processes every page independently: one page's failure is
//! logged and recorded, never propagated.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use shopgraph_entities::{EntityBuilder, EntityDocument};
use shopgraph_extract::{classify, normalize};
use shopgraph_shared::{
    MappingConfig, PageType, PipelineSettings, RawPageRecord, Result, RunId, ShopGraphError,
};
use shopgraph_store::EntityStore;

use crate::input::PageBatch;

// ---------------------------------------------------------------------------
// Options & results
// ---------------------------------------------------------------------------

/// Run-level switches for the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Delete all store contents before ingesting.
    pub cleanup: bool,
    /// Maximum in-flight submissions (1 = sequential).
    pub concurrency: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from(&PipelineSettings::default())
    }
}

impl From<&PipelineSettings> for IngestOptions {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            cleanup: settings.cleanup,
            concurrency: settings.concurrency.max(1),
        }
    }
}

/// Why a page produced no submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The URL is neither a product nor a listing page.
    NotAnEntityPage,
    /// The page type is mapped but nothing usable could be built.
    NoUsableEntity,
}

/// Terminal state of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageStatus {
    Submitted { uri: String },
    Skipped { reason: SkipReason },
    Failed { uri: String, error: String },
}

/// What happened to one input page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageOutcome {
    pub url: String,
    pub page_type: PageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub status: PageStatus,
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    /// Per-page outcomes, in input order.
    pub outcomes: Vec<PageOutcome>,
    /// Input lines that could not be parsed.
    pub malformed_lines: usize,
    pub elapsed: Duration,
}

impl IngestReport {
    pub fn submitted(&self) -> usize {
        self.count(|s| matches!(s, PageStatus::Submitted { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, PageStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, PageStatus::Failed { .. }))
    }

    /// Pages a submission was attempted for.
    pub fn attempted(&self) -> usize {
        self.submitted() + self.failed()
    }

    fn count(&self, pred: impl Fn(&PageStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a page reaches a terminal state.
    fn page_done(&self, outcome: &PageOutcome, current: usize, total: usize);
    /// Called when the run completes (not on abort).
    fn done(&self, report: &IngestReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_done(&self, _outcome: &PageOutcome, _current: usize, _total: usize) {}
    fn done(&self, _report: &IngestReport) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A page carried through classification, normalization and building.
#[derive(Debug, Clone)]
pub struct PreparedPage {
    pub url: String,
    pub page_type: PageType,
    pub title: Option<String>,
    /// `None` when the page is skipped.
    pub document: Option<EntityDocument>,
}

impl PreparedPage {
    fn outcome(&self, status: PageStatus) -> PageOutcome {
        PageOutcome {
            url: self.url.clone(),
            page_type: self.page_type,
            title: self.title.clone(),
            status,
        }
    }
}

/// Batch state machine for one run.
enum BatchPhase {
    Cleanup,
    Ingest,
    Finished(IngestReport),
    Aborted(ShopGraphError),
}

/// Classifies, maps and submits crawled pages under one mapping config.
pub struct IngestionPipeline {
    builder: EntityBuilder,
    options: IngestOptions,
}

impl IngestionPipeline {
    pub fn new(mapping: &MappingConfig, options: IngestOptions) -> Result<Self> {
        mapping.validate()?;
        Ok(Self {
            builder: EntityBuilder::new(mapping),
            options,
        })
    }

    pub fn builder(&self) -> &EntityBuilder {
        &self.builder
    }

    /// Take one page from raw record to built document. Never fails.
    pub fn prepare(&self, raw: &RawPageRecord) -> PreparedPage {
        let page_type = classify(&raw.url);
        debug!(url = %raw.url, %page_type, "classified");

        let record = normalize(raw, page_type);
        let document = self.builder.build(&record);
        if let Some(doc) = &document {
            debug!(url = %raw.url, uri = %doc.id(), kind = doc.kind(), "document built");
        }

        PreparedPage {
            url: record.url,
            page_type,
            title: record.title,
            document,
        }
    }

    /// Run a whole batch against `store`.
    ///
    /// The store is closed before returning, whatever the outcome. The only
    /// error is a failed cleanup; per-page failures land in the report.
    #[instrument(skip_all, fields(pages = batch.pages.len(), cleanup = self.options.cleanup))]
    pub async fn run<S>(
        &self,
        store: Arc<S>,
        batch: PageBatch,
        progress: &dyn ProgressReporter,
    ) -> Result<IngestReport>
    where
        S: EntityStore + 'static,
    {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let start = Instant::now();
        let PageBatch { pages, malformed } = batch;

        info!(%run_id, pages = pages.len(), "starting ingestion run");

        let mut pages = Some(pages);
        let mut phase = if self.options.cleanup {
            BatchPhase::Cleanup
        } else {
            BatchPhase::Ingest
        };

        let result = loop {
            phase = match phase {
                BatchPhase::Cleanup => {
                    progress.phase("Deleting existing entities");
                    match store.delete_all_entities().await {
                        Ok(()) => BatchPhase::Ingest,
                        Err(e) => {
                            error!(error = %e, "cleanup failed, aborting before ingestion");
                            BatchPhase::Aborted(ShopGraphError::Cleanup(e.to_string()))
                        }
                    }
                }
                BatchPhase::Ingest => {
                    progress.phase("Ingesting pages");
                    let outcomes = self
                        .ingest(&store, pages.take().unwrap_or_default(), progress)
                        .await;
                    BatchPhase::Finished(IngestReport {
                        run_id: run_id.clone(),
                        started_at,
                        outcomes,
                        malformed_lines: malformed,
                        elapsed: start.elapsed(),
                    })
                }
                BatchPhase::Finished(report) => break Ok(report),
                BatchPhase::Aborted(err) => break Err(err),
            };
        };

        if let Err(e) = store.close().await {
            warn!(error = %e, "failed to close store handle");
        }

        if let Ok(report) = &result {
            progress.done(report);
            info!(
                %run_id,
                submitted = report.submitted(),
                skipped = report.skipped(),
                failed = report.failed(),
                malformed = report.malformed_lines,
                elapsed_ms = report.elapsed.as_millis(),
                "ingestion run complete"
            );
        }

        result
    }

    /// Submit every page on a bounded worker pool, keeping input order in the result.
    async fn ingest<S>(
        &self,
        store: &Arc<S>,
        pages: Vec<RawPageRecord>,
        progress: &dyn ProgressReporter,
    ) -> Vec<PageOutcome>
    where
        S: EntityStore + 'static,
    {
        let total = pages.len();
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut outcomes: Vec<Option<PageOutcome>> = (0..total).map(|_| None).collect();
        let mut handles = Vec::new();
        let mut completed = 0usize;

        for (index, raw) in pages.iter().enumerate() {
            let mut prepared = self.prepare(raw);

            let Some(document) = prepared.document.take() else {
                let reason = match prepared.page_type {
                    PageType::Other => SkipReason::NotAnEntityPage,
                    _ => SkipReason::NoUsableEntity,
                };
                info!(url = %prepared.url, page_type = %prepared.page_type, ?reason, "page skipped");
                let outcome = prepared.outcome(PageStatus::Skipped { reason });
                completed += 1;
                progress.page_done(&outcome, completed, total);
                outcomes[index] = Some(outcome);
                continue;
            };

            let store = Arc::clone(store);
            let semaphore = Arc::clone(&semaphore);
            handles.push((
                index,
                prepared,
                document.id().to_string(),
                tokio::spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return Err(ShopGraphError::Store("worker pool closed".into()));
                    };
                    store.create_or_update_entity(&document).await
                }),
            ));
        }

        for (index, prepared, uri, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(ShopGraphError::Store(format!("submission task failed: {e}"))),
            };

            let status = match result {
                Ok(()) => {
                    info!(url = %prepared.url, page_type = %prepared.page_type, %uri, "entity created");
                    PageStatus::Submitted { uri }
                }
                Err(e) => {
                    error!(
                        url = %prepared.url,
                        page_type = %prepared.page_type,
                        title = prepared.title.as_deref().unwrap_or_default(),
                        error = %e,
                        "entity submission failed"
                    );
                    PageStatus::Failed {
                        uri,
                        error: e.to_string(),
                    }
                }
            };

            let outcome = prepared.outcome(status);
            completed += 1;
            progress.page_done(&outcome, completed, total);
            outcomes[index] = Some(outcome);
        }

        outcomes.into_iter().flatten().collect()
    }
}
