//! Tests for file-backed store opening and schema idempotency.

use taskmill::model::InputKind;
use taskmill::store::{NewCommunication, TaskStore};

#[tokio::test]
async fn data_survives_a_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("taskmill.db");
    let path = path.to_str().expect("utf-8 path");

    let store = TaskStore::open(path).await.expect("first open");
    let created = store
        .create_communication(NewCommunication {
            user_id: "u1".to_owned(),
            title: "durable".to_owned(),
            content: "survives restarts".to_owned(),
            summary: None,
            kind: InputKind::File,
        })
        .await
        .expect("create");
    store.pool().close().await;

    // Second open re-applies the schema; existing rows must be untouched.
    let reopened = TaskStore::open(path).await.expect("second open");
    let fetched = reopened
        .communication("u1", created.id)
        .await
        .expect("fetch after reopen");
    assert_eq!(fetched.title, "durable");
    assert_eq!(fetched.kind, InputKind::File);
}
