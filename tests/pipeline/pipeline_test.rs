//! Tests for `src/pipeline.rs` — the extraction orchestrator.
//!
//! Runs the full pipeline against a scripted fake extractor and an in-memory
//! store, checking persistence, ordering, and failure semantics.

use std::sync::Arc;

use serde_json::json;

use taskmill::extract::{ExtractionError, RawExtraction, RawTask, TaskExtractor};
use taskmill::model::{InputKind, Priority, TaskStatus};
use taskmill::pipeline::{ExtractionPipeline, PipelineError};
use taskmill::store::TaskStore;

/// Scripted extractor: returns a canned extraction, or fails when none is
/// configured.
#[derive(Debug)]
struct FakeExtractor {
    response: Option<RawExtraction>,
}

impl FakeExtractor {
    fn returning(response: RawExtraction) -> Arc<Self> {
        Arc::new(Self {
            response: Some(response),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { response: None })
    }
}

#[async_trait::async_trait]
impl TaskExtractor for FakeExtractor {
    async fn extract(&self, _text: &str) -> Result<RawExtraction, ExtractionError> {
        self.response
            .clone()
            .ok_or_else(|| ExtractionError::Parse("scripted failure".to_owned()))
    }

    async fn summarize(&self, _text: &str) -> Result<String, ExtractionError> {
        match &self.response {
            Some(r) => Ok(r.summary.clone()),
            None => Err(ExtractionError::Parse("scripted failure".to_owned())),
        }
    }

    fn model_id(&self) -> &str {
        "fake-model"
    }
}

async fn pipeline_with(extractor: Arc<dyn TaskExtractor>) -> (ExtractionPipeline, TaskStore) {
    let store = TaskStore::open_in_memory()
        .await
        .expect("store should open");
    (ExtractionPipeline::new(extractor, store.clone()), store)
}

async fn count(store: &TaskStore, table: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT count(*) FROM {table}"))
        .fetch_one(store.pool())
        .await
        .expect("count should succeed");
    n
}

fn team_sync_response() -> RawExtraction {
    RawExtraction {
        summary: "Team sync".to_owned(),
        tasks: vec![
            RawTask::from_json(json!({
                "title": "Send report",
                "priority": "high",
                "tags": ["finance"],
            })),
            RawTask::from_json(json!({
                "title": "",
                "priority": "bogus",
            })),
        ],
    }
}

#[tokio::test]
async fn empty_content_is_rejected_before_any_write() {
    let (pipeline, store) = pipeline_with(FakeExtractor::failing()).await;

    let err = pipeline
        .process_and_extract("u1", "Standup", "   ", InputKind::Text)
        .await
        .expect_err("empty content should fail");

    assert!(matches!(err, PipelineError::InvalidInput(_)));
    assert_eq!(count(&store, "communications").await, 0);
    assert_eq!(count(&store, "tasks").await, 0);
}

#[tokio::test]
async fn empty_title_is_rejected_before_any_write() {
    let (pipeline, store) = pipeline_with(FakeExtractor::failing()).await;

    let err = pipeline
        .process_and_extract("u1", "", "notes from the call", InputKind::Text)
        .await
        .expect_err("empty title should fail");

    assert!(matches!(err, PipelineError::InvalidInput(_)));
    assert_eq!(count(&store, "communications").await, 0);
}

#[tokio::test]
async fn extractor_failure_leaves_no_communication_behind() {
    let (pipeline, store) = pipeline_with(FakeExtractor::failing()).await;

    let err = pipeline
        .process_and_extract("u1", "Standup", "notes from the call", InputKind::Text)
        .await
        .expect_err("extractor failure should propagate");

    assert!(matches!(err, PipelineError::Extraction(_)));
    assert_eq!(count(&store, "communications").await, 0);
    assert_eq!(count(&store, "tasks").await, 0);
    assert_eq!(count(&store, "activities").await, 0);
}

#[tokio::test]
async fn team_sync_example_end_to_end() {
    let (pipeline, store) = pipeline_with(FakeExtractor::returning(team_sync_response())).await;

    let outcome = pipeline
        .process_and_extract("u1", "Monday sync", "raw meeting notes", InputKind::Text)
        .await
        .expect("extraction should succeed");

    assert_eq!(outcome.communication.summary.as_deref(), Some("Team sync"));
    assert_eq!(outcome.communication.title, "Monday sync");
    assert_eq!(outcome.communication.content, "raw meeting notes");
    assert_eq!(outcome.communication.kind, InputKind::Text);

    assert_eq!(outcome.tasks.len(), 2);

    let first = &outcome.tasks[0];
    assert_eq!(first.title, "Send report");
    assert_eq!(first.priority, Priority::High);
    assert_eq!(first.tags, vec!["finance".to_owned()]);
    assert_eq!(first.status, TaskStatus::Pending);
    assert_eq!(first.communication_id, Some(outcome.communication.id));

    let second = &outcome.tasks[1];
    assert_eq!(second.title, "Untitled task");
    assert_eq!(second.priority, Priority::Medium);
    assert!(second.tags.is_empty());
    assert_eq!(second.status, TaskStatus::Pending);

    // Exactly two `created` activity entries, in task order.
    let activities = store
        .activities_for_user("u1", 10)
        .await
        .expect("list should succeed");
    assert_eq!(activities.len(), 2);
    for entry in &activities {
        assert_eq!(entry.action, "created");
        assert!(entry.description.contains("communication analysis"));
    }
    // Newest first, so the second task's entry comes first.
    assert!(activities[0].description.contains("Untitled task"));
    assert!(activities[1].description.contains("Send report"));
}

#[tokio::test]
async fn task_count_and_order_match_the_model_output() {
    let titles = ["alpha", "bravo", "charlie", "delta"];
    let response = RawExtraction {
        summary: "ordered".to_owned(),
        tasks: titles
            .iter()
            .map(|t| RawTask::from_json(json!({"title": t})))
            .collect(),
    };
    let (pipeline, _store) = pipeline_with(FakeExtractor::returning(response)).await;

    let outcome = pipeline
        .process_and_extract("u1", "Order check", "text", InputKind::Text)
        .await
        .expect("extraction should succeed");

    let got: Vec<&str> = outcome.tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(got, titles);
}

#[tokio::test]
async fn zero_extracted_tasks_still_records_the_communication() {
    let response = RawExtraction {
        summary: "Nothing actionable".to_owned(),
        tasks: vec![],
    };
    let (pipeline, store) = pipeline_with(FakeExtractor::returning(response)).await;

    let outcome = pipeline
        .process_and_extract("u1", "Small talk", "hello there", InputKind::Voice)
        .await
        .expect("empty extraction is not an error");

    assert!(outcome.tasks.is_empty());
    assert_eq!(
        outcome.communication.summary.as_deref(),
        Some("Nothing actionable")
    );
    assert_eq!(count(&store, "communications").await, 1);
    assert_eq!(count(&store, "tasks").await, 0);
    assert_eq!(count(&store, "activities").await, 0);
}

#[tokio::test]
async fn bad_due_date_rolls_back_the_whole_batch() {
    let response = RawExtraction {
        summary: "partial".to_owned(),
        tasks: vec![
            RawTask::from_json(json!({"title": "fine task"})),
            RawTask::from_json(json!({"title": "bad date", "dueDate": "next Tuesday"})),
        ],
    };
    let (pipeline, store) = pipeline_with(FakeExtractor::returning(response)).await;

    let err = pipeline
        .process_and_extract("u1", "Rollback check", "text", InputKind::Text)
        .await
        .expect_err("unparseable due date should fail persistence");

    assert!(matches!(err, PipelineError::Store(_)));
    // Strict atomicity: nothing from the batch survives, not even the
    // communication or the first (valid) task.
    assert_eq!(count(&store, "communications").await, 0);
    assert_eq!(count(&store, "tasks").await, 0);
    assert_eq!(count(&store, "activities").await, 0);
}

#[tokio::test]
async fn summarize_rejects_empty_content() {
    let (pipeline, _store) = pipeline_with(FakeExtractor::failing()).await;
    let err = pipeline
        .summarize("  ")
        .await
        .expect_err("empty content should fail");
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}

#[tokio::test]
async fn summarize_passes_through_the_extractor_summary() {
    let (pipeline, _store) = pipeline_with(FakeExtractor::returning(RawExtraction {
        summary: "short recap".to_owned(),
        tasks: vec![],
    }))
    .await;

    let summary = pipeline
        .summarize("long meeting text")
        .await
        .expect("summarize should succeed");
    assert_eq!(summary, "short recap");
}
