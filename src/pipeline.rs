//! Extraction orchestrator: free-form text in, communication + tasks out.
//!
//! One [`process_and_extract`](ExtractionPipeline::process_and_extract) call
//! is one unit of work: validate input, call the extractor, sanitize its raw
//! output, persist everything. The extractor and store are injected at
//! construction so tests run against a scripted fake and an in-memory store.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::extract::sanitize::{self, ExtractedTask};
use crate::extract::{ExtractionError, TaskExtractor};
use crate::model::{Communication, InputKind, Task};
use crate::store::{NewCommunication, StoreError, TaskStore};

/// Errors from the extraction pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Empty title or content. Raised before any external call; nothing is
    /// persisted.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The extraction service call failed. Nothing is persisted.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A persistence operation failed. The whole batch was rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a successful extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// The stored communication, with its summary.
    pub communication: Communication,
    /// Created tasks in the order the model returned them.
    pub tasks: Vec<Task>,
}

/// The extraction pipeline.
#[derive(Clone)]
pub struct ExtractionPipeline {
    extractor: Arc<dyn TaskExtractor>,
    store: TaskStore,
}

impl std::fmt::Debug for ExtractionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionPipeline")
            .field("model", &self.extractor.model_id())
            .finish_non_exhaustive()
    }
}

impl ExtractionPipeline {
    /// Create a pipeline over the given extractor and store.
    pub fn new(extractor: Arc<dyn TaskExtractor>, store: TaskStore) -> Self {
        Self { extractor, store }
    }

    /// Extract tasks from `content` and persist the result for `user_id`.
    ///
    /// Steps, strictly sequential:
    /// 1. Reject empty (after trimming) title or content.
    /// 2. Call the extractor. On failure, propagate — nothing persisted.
    /// 3. Sanitize the raw task list (order preserved; an empty list is a
    ///    valid outcome, the communication is still recorded).
    /// 4. Persist communication, tasks, and one `created` activity entry per
    ///    task in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] per the taxonomy above. Errors are never
    /// retried here; retry policy belongs to the caller.
    #[instrument(skip(self, content), fields(model = %self.extractor.model_id()))]
    pub async fn process_and_extract(
        &self,
        user_id: &str,
        title: &str,
        content: &str,
        kind: InputKind,
    ) -> Result<ExtractionOutcome, PipelineError> {
        if title.trim().is_empty() {
            return Err(PipelineError::InvalidInput("title must not be empty"));
        }
        if content.trim().is_empty() {
            return Err(PipelineError::InvalidInput("content must not be empty"));
        }

        let raw = self.extractor.extract(content).await?;
        let tasks: Vec<ExtractedTask> = sanitize::sanitize(&raw.tasks);

        info!(
            user = user_id,
            raw_tasks = raw.tasks.len(),
            "extraction returned"
        );

        let (communication, created) = self
            .store
            .record_extraction(
                NewCommunication {
                    user_id: user_id.to_owned(),
                    title: title.to_owned(),
                    content: content.to_owned(),
                    summary: Some(raw.summary),
                    kind,
                },
                tasks,
            )
            .await?;

        info!(
            user = user_id,
            communication = communication.id,
            tasks = created.len(),
            "extraction recorded"
        );

        Ok(ExtractionOutcome {
            communication,
            tasks: created,
        })
    }

    /// Produce a standalone summary of `content` without persisting anything.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] for empty content, otherwise
    /// propagates extractor failures.
    pub async fn summarize(&self, content: &str) -> Result<String, PipelineError> {
        if content.trim().is_empty() {
            return Err(PipelineError::InvalidInput("content must not be empty"));
        }
        Ok(self.extractor.summarize(content).await?)
    }
}
