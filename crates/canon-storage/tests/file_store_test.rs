use std::sync::Arc;

use canon_core::errors::{CanonError, StorageError};
use canon_core::traits::{IDurableStore, IReadiness};
use canon_storage::{FileStore, InMemoryStore};

#[tokio::test]
async fn write_then_read_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("data")).await.unwrap();
    assert!(store.is_ready());

    store
        .write_file("entities/harbor.json", "{\"id\":\"h\"}")
        .await
        .unwrap();
    assert!(store.exists("entities/harbor.json").await.unwrap());
    assert_eq!(
        store.read_file("entities/harbor.json").await.unwrap(),
        "{\"id\":\"h\"}"
    );
}

#[tokio::test]
async fn overwrite_replaces_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    store.write_file("a.json", "a much longer first body").await.unwrap();
    store.write_file("a.json", "short").await.unwrap();
    assert_eq!(store.read_file("a.json").await.unwrap(), "short");
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    assert!(!store.exists("nope.json").await.unwrap());
    match store.read_file("nope.json").await {
        Err(CanonError::StorageError(StorageError::NotFound { path })) => {
            assert_eq!(path, "nope.json")
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn escaping_paths_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    let err = store.write_file("../outside.json", "x").await.unwrap_err();
    assert!(matches!(
        err,
        CanonError::StorageError(StorageError::InvalidPath { .. })
    ));
}

#[tokio::test]
async fn list_files_is_sorted_and_skips_temp_and_subdirs() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    store.write_file("entities/b.json", "[]").await.unwrap();
    store.write_file("entities/a.json", "[]").await.unwrap();
    store.write_file("entities/nested/c.json", "[]").await.unwrap();
    std::fs::write(dir.path().join("entities/.a.json.1.0.tmp"), "partial").unwrap();

    let files = store.list_files("entities").await.unwrap();
    assert_eq!(files, vec!["entities/a.json", "entities/b.json"]);
    assert!(store.list_files("missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_writes_leave_one_complete_body() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).await.unwrap());
    let bodies: Vec<String> = (0..8).map(|i| format!("body-{i}-{}", "x".repeat(256))).collect();

    let mut handles = Vec::new();
    for body in bodies.clone() {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.write_file("snap.json", &body).await.unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let contents = store.read_file("snap.json").await.unwrap();
    assert!(bodies.contains(&contents));
    assert_eq!(store.list_files("").await.unwrap(), vec!["snap.json"]);
}

#[tokio::test]
async fn memory_store_follows_the_same_contract() {
    let store = InMemoryStore::new();
    store.write_file("entities//x.json", "1").await.unwrap();
    store.write_file("entities/deeper/y.json", "2").await.unwrap();
    assert_eq!(store.read_file("entities/x.json").await.unwrap(), "1");
    assert_eq!(
        store.list_files("entities").await.unwrap(),
        vec!["entities/x.json"]
    );
    assert!(store.read_file("entities/z.json").await.is_err());
    assert!(store.write_file("../x", "1").await.is_err());

    store.set_ready(false);
    assert!(!store.is_ready());
}
