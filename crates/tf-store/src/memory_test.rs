use super::*;
use serde_json::json;

#[test]
fn test_store_type() {
    let store = MemoryStore::new();
    assert_eq!(store.store_type(), "memory");
}

#[tokio::test]
async fn test_aggregate_drains_source() {
    let store = MemoryStore::new();
    store.seed(None, "raw", vec![json!({"_id": 1}), json!({"_id": 2})]);

    let count = store.aggregate(None, "raw", &[]).await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(store.dispatches().len(), 1);
}

#[tokio::test]
async fn test_transformation_stages_pass_through() {
    let store = MemoryStore::new();
    store.seed(None, "raw", vec![json!({"_id": 1})]);

    let stages = vec![json!({"$match": {"x": 1}}), json!({"$out": "dest"})];
    store.aggregate(None, "raw", &stages).await.unwrap();
    assert_eq!(store.documents(None, "dest"), vec![json!({"_id": 1})]);
}

#[tokio::test]
async fn test_out_replaces_destination_entirely() {
    let store = MemoryStore::new();
    store.seed(None, "dest", vec![json!({"_id": "stale"})]);
    store.seed(None, "raw", vec![json!({"_id": "fresh"})]);

    store
        .aggregate(None, "raw", &[json!({"$out": "dest"})])
        .await
        .unwrap();
    assert_eq!(store.documents(None, "dest"), vec![json!({"_id": "fresh"})]);
}

#[tokio::test]
async fn test_out_with_namespace_crosses_databases() {
    let store = MemoryStore::new();
    store.seed(Some("src"), "raw", vec![json!({"_id": 1})]);

    store
        .aggregate(
            Some("src"),
            "raw",
            &[json!({"$out": {"db": "warehouse", "coll": "facts"}})],
        )
        .await
        .unwrap();
    assert_eq!(
        store.documents(Some("warehouse"), "facts"),
        vec![json!({"_id": 1})]
    );
}

#[tokio::test]
async fn test_merge_upsert_replaces_on_match() {
    let store = MemoryStore::new();
    store.seed(None, "dest", vec![json!({"_id": 1, "v": "old"})]);
    store.seed(
        None,
        "raw",
        vec![json!({"_id": 1, "v": "new"}), json!({"_id": 2, "v": "x"})],
    );

    let merge = json!({"$merge": {
        "into": "dest", "on": "_id",
        "whenMatched": "replace", "whenNotMatched": "insert",
    }});
    store.aggregate(None, "raw", &[merge]).await.unwrap();

    let docs = store.documents(None, "dest");
    assert_eq!(docs.len(), 2);
    assert!(docs.contains(&json!({"_id": 1, "v": "new"})));
}

#[tokio::test]
async fn test_merge_fail_on_collision_keeps_destination_intact() {
    let store = MemoryStore::new();
    store.seed(None, "dest", vec![json!({"_id": 1, "v": "old"})]);
    store.seed(None, "raw", vec![json!({"_id": 1, "v": "dup"})]);

    let merge = json!({"$merge": {
        "into": "dest", "on": "_id",
        "whenMatched": "fail", "whenNotMatched": "insert",
    }});
    let err = store.aggregate(None, "raw", &[merge]).await.unwrap_err();
    assert!(matches!(err, StoreError::MergeConflict { .. }));
    assert_eq!(store.documents(None, "dest"), vec![json!({"_id": 1, "v": "old"})]);
}

#[tokio::test]
async fn test_merge_on_compound_keys() {
    let store = MemoryStore::new();
    store.seed(None, "dest", vec![json!({"region": "eu", "day": 1, "n": 1})]);
    store.seed(
        None,
        "raw",
        vec![
            json!({"region": "eu", "day": 1, "n": 5}),
            json!({"region": "us", "day": 1, "n": 2}),
        ],
    );

    let merge = json!({"$merge": {
        "into": "dest", "on": ["region", "day"],
        "whenMatched": "replace", "whenNotMatched": "insert",
    }});
    store.aggregate(None, "raw", &[merge]).await.unwrap();

    let docs = store.documents(None, "dest");
    assert_eq!(docs.len(), 2);
    assert!(docs.contains(&json!({"region": "eu", "day": 1, "n": 5})));
}

#[tokio::test]
async fn test_merge_keep_existing_and_discard() {
    let store = MemoryStore::new();
    store.seed(None, "dest", vec![json!({"_id": 1, "v": "old"})]);
    store.seed(
        None,
        "raw",
        vec![json!({"_id": 1, "v": "new"}), json!({"_id": 2, "v": "x"})],
    );

    let merge = json!({"$merge": {
        "into": "dest", "on": "_id",
        "whenMatched": "keepExisting", "whenNotMatched": "discard",
    }});
    store.aggregate(None, "raw", &[merge]).await.unwrap();
    assert_eq!(store.documents(None, "dest"), vec![json!({"_id": 1, "v": "old"})]);
}

#[tokio::test]
async fn test_fail_stage_aborts() {
    let store = MemoryStore::new();
    store.seed(None, "raw", vec![json!({"_id": 1})]);

    let stages = vec![json!({"$fail": "boom"}), json!({"$out": "dest"})];
    let err = store.aggregate(None, "raw", &stages).await.unwrap_err();
    assert!(matches!(err, StoreError::Execution(message) if message == "boom"));
    assert!(store.documents(None, "dest").is_empty());
}

#[tokio::test]
async fn test_view_lifecycle() {
    let store = MemoryStore::new();
    let pipeline = vec![json!({"$match": {"active": true}})];

    store
        .create_view(None, "active_users", "users", &pipeline)
        .await
        .unwrap();
    assert!(store.exists(None, "active_users").await.unwrap());
    let view = store.view(None, "active_users").unwrap();
    assert_eq!(view.source, "users");
    assert_eq!(view.pipeline, pipeline);

    // Same name again is an error until dropped.
    let err = store
        .create_view(None, "active_users", "users", &pipeline)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));

    store.drop_if_exists(None, "active_users").await.unwrap();
    assert!(!store.exists(None, "active_users").await.unwrap());
    store
        .create_view(None, "active_users", "users", &pipeline)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_drop_if_exists_is_idempotent() {
    let store = MemoryStore::new();
    store.drop_if_exists(None, "never_created").await.unwrap();
}

#[tokio::test]
async fn test_create_timeseries_once() {
    let store = MemoryStore::new();
    let spec = tf_core::TimeseriesSpec::new("ts");

    store.create_timeseries(None, "metrics", &spec).await.unwrap();
    assert!(store.is_timeseries(None, "metrics"));
    assert!(store.exists(None, "metrics").await.unwrap());

    let err = store
        .create_timeseries(None, "metrics", &spec)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
}
