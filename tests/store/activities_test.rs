//! Tests for the activity log in `src/store/mod.rs`.

use taskmill::model::{Priority, TaskStatus};
use taskmill::store::{NewTask, TaskStore};

#[tokio::test]
async fn entries_come_back_newest_first() {
    let store = TaskStore::open_in_memory().await.expect("open");
    for action in ["created", "updated", "deleted"] {
        store
            .create_activity("u1", None, action, &format!("something was {action}"))
            .await
            .expect("append");
    }

    let entries = store.activities_for_user("u1", 10).await.expect("list");
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, ["deleted", "updated", "created"]);
}

#[tokio::test]
async fn limit_truncates_the_list() {
    let store = TaskStore::open_in_memory().await.expect("open");
    for i in 0..5 {
        store
            .create_activity("u1", None, "created", &format!("entry {i}"))
            .await
            .expect("append");
    }

    let entries = store.activities_for_user("u1", 2).await.expect("list");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].description, "entry 4");
    assert_eq!(entries[1].description, "entry 3");
}

#[tokio::test]
async fn entries_are_scoped_to_the_user() {
    let store = TaskStore::open_in_memory().await.expect("open");
    store
        .create_activity("u1", None, "created", "mine")
        .await
        .expect("append");
    store
        .create_activity("u2", None, "created", "theirs")
        .await
        .expect("append");

    let entries = store.activities_for_user("u1", 10).await.expect("list");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].description, "mine");
}

#[tokio::test]
async fn task_id_may_reference_a_task_or_be_absent() {
    let store = TaskStore::open_in_memory().await.expect("open");
    let task = store
        .create_task(NewTask {
            user_id: "u1".to_owned(),
            communication_id: None,
            title: "referenced".to_owned(),
            description: String::new(),
            priority: Priority::Medium,
            status: TaskStatus::Pending,
            assignee: None,
            tags: vec![],
            due_date: None,
        })
        .await
        .expect("create task");

    let entry = store
        .create_activity("u1", Some(task.id), "updated", "task touched")
        .await
        .expect("append");
    assert_eq!(entry.task_id, Some(task.id));

    let detached = store
        .create_activity("u1", None, "deleted", "task removed")
        .await
        .expect("append");
    assert_eq!(detached.task_id, None);
}
