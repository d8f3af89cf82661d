use bytes::Bytes;
use blobgate::object_store::{LocalStore, ObjectStore, ObjectStoreError};
use blobgate::CACHE_CONTROL_POLICY;

#[tokio::test]
async fn test_local_store_put_get() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let data = Bytes::from("hello world");
    store
        .put("test-key", data.clone(), "text/plain", CACHE_CONTROL_POLICY)
        .await
        .unwrap();

    let object = store.get("test-key").await.unwrap();
    assert_eq!(object.data, data);
    assert_eq!(object.content_type, "text/plain");
    assert_eq!(object.cache_control.as_deref(), Some(CACHE_CONTROL_POLICY));
}

#[tokio::test]
async fn test_local_store_temp_prefixed_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store
        .put(
            "temp/1719009115",
            Bytes::from("anon"),
            "image/png",
            CACHE_CONTROL_POLICY,
        )
        .await
        .unwrap();

    let object = store.get("temp/1719009115").await.unwrap();
    assert_eq!(object.data, Bytes::from("anon"));
    assert_eq!(object.content_type, "image/png");
}

#[tokio::test]
async fn test_local_store_exists() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    assert!(!store.exists("missing").await.unwrap());

    store
        .put("present", Bytes::from("data"), "text/plain", CACHE_CONTROL_POLICY)
        .await
        .unwrap();
    assert!(store.exists("present").await.unwrap());
}

#[tokio::test]
async fn test_local_store_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store
        .put("to-delete", Bytes::from("data"), "text/plain", CACHE_CONTROL_POLICY)
        .await
        .unwrap();
    assert!(store.exists("to-delete").await.unwrap());

    store.delete("to-delete").await.unwrap();
    assert!(!store.exists("to-delete").await.unwrap());
}

#[tokio::test]
async fn test_local_store_delete_nonexistent() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    // Deleting a nonexistent key should not error
    store.delete("nonexistent").await.unwrap();
}

#[tokio::test]
async fn test_local_store_get_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let result = store.get("missing").await;
    assert!(result.is_err());
    assert!(matches!(result.unwrap_err(), ObjectStoreError::NotFound(_)));
}

#[tokio::test]
async fn test_local_store_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store
        .put("key", Bytes::from("first"), "text/plain", CACHE_CONTROL_POLICY)
        .await
        .unwrap();
    store
        .put("key", Bytes::from("second"), "image/png", CACHE_CONTROL_POLICY)
        .await
        .unwrap();

    let object = store.get("key").await.unwrap();
    assert_eq!(object.data, Bytes::from("second"));
    assert_eq!(object.content_type, "image/png");
}

#[tokio::test]
async fn test_local_store_rejects_path_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let result = store
        .put(
            "../escape",
            Bytes::from("nope"),
            "text/plain",
            CACHE_CONTROL_POLICY,
        )
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_local_store_list() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store
        .put("alpha", Bytes::from("a"), "text/plain", CACHE_CONTROL_POLICY)
        .await
        .unwrap();
    store
        .put("temp/beta", Bytes::from("bb"), "text/plain", CACHE_CONTROL_POLICY)
        .await
        .unwrap();

    let entries = store.list(1000).await.unwrap();
    let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["alpha", "temp/beta"]);

    let alpha = &entries[0];
    assert_eq!(alpha.size, 1);
    assert!(alpha.uploaded.is_some());
}

#[tokio::test]
async fn test_local_store_list_respects_limit() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    for i in 0..5 {
        store
            .put(
                &format!("obj-{i}"),
                Bytes::from("x"),
                "text/plain",
                CACHE_CONTROL_POLICY,
            )
            .await
            .unwrap();
    }

    let entries = store.list(3).await.unwrap();
    assert_eq!(entries.len(), 3);
}
