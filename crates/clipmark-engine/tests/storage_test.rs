use clipmark_engine::storage::{CLIPS_KEY, JsonFileStore, KeyValueStore, StorageError};
use serde_json::json;

#[tokio::test]
async fn test_json_file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("storage.json");

    let store = JsonFileStore::new(&path);
    assert_eq!(store.get(CLIPS_KEY).await.unwrap(), None);
    store.set(CLIPS_KEY, json!({"https://a.example": []})).await.unwrap();
    store.set("enableFloatingBtn", json!(false)).await.unwrap();

    let reopened = JsonFileStore::new(&path);
    assert_eq!(
        reopened.get(CLIPS_KEY).await.unwrap(),
        Some(json!({"https://a.example": []}))
    );
    assert_eq!(reopened.get("enableFloatingBtn").await.unwrap(), Some(json!(false)));
    assert!(!path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_empty_file_reads_as_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "  \n").unwrap();
    assert_eq!(JsonFileStore::new(&path).get(CLIPS_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_non_object_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "[1, 2]").unwrap();
    assert!(matches!(
        JsonFileStore::new(&path).get(CLIPS_KEY).await,
        Err(StorageError::NotAnObject(_))
    ));
}
