//! Tests for per-user prioritization method storage.

use taskmill::model::PrioritizationMethod;
use taskmill::store::TaskStore;

#[tokio::test]
async fn unknown_user_gets_the_default_method() {
    let store = TaskStore::open_in_memory().await.expect("open");
    let method = store.prioritization_method("nobody").await.expect("get");
    assert_eq!(method, PrioritizationMethod::Eisenhower);
}

#[tokio::test]
async fn set_then_get_roundtrips() {
    let store = TaskStore::open_in_memory().await.expect("open");
    store
        .set_prioritization_method("u1", PrioritizationMethod::Abcde)
        .await
        .expect("set");
    let method = store.prioritization_method("u1").await.expect("get");
    assert_eq!(method, PrioritizationMethod::Abcde);
}

#[tokio::test]
async fn setting_twice_overwrites() {
    let store = TaskStore::open_in_memory().await.expect("open");
    store
        .set_prioritization_method("u1", PrioritizationMethod::EatTheFrog)
        .await
        .expect("set");
    store
        .set_prioritization_method("u1", PrioritizationMethod::Chunking)
        .await
        .expect("set again");
    let method = store.prioritization_method("u1").await.expect("get");
    assert_eq!(method, PrioritizationMethod::Chunking);
}

#[tokio::test]
async fn methods_are_per_user() {
    let store = TaskStore::open_in_memory().await.expect("open");
    store
        .set_prioritization_method("u1", PrioritizationMethod::Abcde)
        .await
        .expect("set");

    assert_eq!(
        store.prioritization_method("u2").await.expect("get"),
        PrioritizationMethod::Eisenhower
    );
}
