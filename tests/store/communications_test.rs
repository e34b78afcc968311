//! Tests for communication CRUD in `src/store/mod.rs`.

use taskmill::model::InputKind;
use taskmill::store::{NewCommunication, StoreError, TaskStore};

fn new_comm(user: &str, title: &str) -> NewCommunication {
    NewCommunication {
        user_id: user.to_owned(),
        title: title.to_owned(),
        content: "some content".to_owned(),
        summary: Some("a summary".to_owned()),
        kind: InputKind::Text,
    }
}

#[tokio::test]
async fn create_and_fetch_roundtrip() {
    let store = TaskStore::open_in_memory().await.expect("open");

    let created = store
        .create_communication(new_comm("u1", "Sync notes"))
        .await
        .expect("create");
    assert_eq!(created.title, "Sync notes");
    assert_eq!(created.summary.as_deref(), Some("a summary"));
    assert_eq!(created.kind, InputKind::Text);

    let fetched = store.communication("u1", created.id).await.expect("fetch");
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.content, "some content");
}

#[tokio::test]
async fn summary_can_be_absent() {
    let store = TaskStore::open_in_memory().await.expect("open");
    let created = store
        .create_communication(NewCommunication {
            summary: None,
            ..new_comm("u1", "no summary")
        })
        .await
        .expect("create");
    assert_eq!(created.summary, None);
}

#[tokio::test]
async fn fetch_by_another_user_reports_not_found() {
    let store = TaskStore::open_in_memory().await.expect("open");
    let created = store
        .create_communication(new_comm("owner", "private"))
        .await
        .expect("create");

    let err = store
        .communication("intruder", created.id)
        .await
        .expect_err("cross-user fetch should fail");
    assert!(matches!(err, StoreError::NotFound { resource: "communication", .. }));
}

#[tokio::test]
async fn listing_is_newest_first_and_scoped_to_the_user() {
    let store = TaskStore::open_in_memory().await.expect("open");
    for title in ["first", "second", "third"] {
        store
            .create_communication(new_comm("u1", title))
            .await
            .expect("create");
    }
    store
        .create_communication(new_comm("u2", "someone else's"))
        .await
        .expect("create");

    let listed = store.communications_for_user("u1").await.expect("list");
    let titles: Vec<&str> = listed.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["third", "second", "first"]);
}
