use std::sync::Arc;

use ancestry::{DepthScope, DocumentStore, InMemory, OrphanStrategy, Tree, TreeConfig};
use serde_json::json;
use tempfile::TempDir;

use crate::helpers::*;

#[tokio::test]
async fn test_tree_survives_save_and_load() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("tree.json");

    {
        let (tree, store) = test_tree_with(TreeConfig::new(OrphanStrategy::Rootify)).await;
        let chain = create_chain(&tree, 3).await;
        create_child(&tree, &chain[0]).await;
        store.save_to_file(&file).await.unwrap();
    }
    assert!(file.exists());

    let store = Arc::new(InMemory::load_from_file(&file).await.unwrap());
    assert_eq!(store.len().await, 4);
    let tree = Tree::open(store, TreeConfig::new(OrphanStrategy::Rootify))
        .await
        .unwrap();

    let root = tree.find(1).await.unwrap();
    assert_eq!(
        tree.descendant_ids(&root, DepthScope::all()).await.unwrap(),
        vec![2, 3, 4]
    );
    // Allocation continues from the loaded maximum.
    assert_eq!(create_root(&tree).await.id(), Some(5));
    tree.check_integrity().await.unwrap();
}

#[tokio::test]
async fn test_unique_index_survives_save_and_load() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("tree.json");

    let (tree, store) = test_tree_with(TreeConfig::default()).await;
    create_root(&tree).await;
    store.save_to_file(&file).await.unwrap();

    let loaded = InMemory::load_from_file(&file).await.unwrap();
    let err = loaded
        .insert(doc(json!({ "id": 1 })))
        .await
        .unwrap_err();
    assert!(err.is_duplicate_key_on("id"));
}

#[tokio::test]
async fn test_load_missing_file_gives_empty_store() {
    let dir = TempDir::new().unwrap();
    let store = InMemory::load_from_file(dir.path().join("missing.json"))
        .await
        .unwrap();
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_load_rejects_bad_files() {
    let dir = TempDir::new().unwrap();

    let garbage = dir.path().join("garbage.json");
    tokio::fs::write(&garbage, "{not json").await.unwrap();
    let err = InMemory::load_from_file(&garbage).await.unwrap_err();
    assert!(err.is_io_error());

    let future = dir.path().join("future.json");
    tokio::fs::write(&future, r#"{ "_v": 9, "documents": [] }"#)
        .await
        .unwrap();
    let err = InMemory::load_from_file(&future).await.unwrap_err();
    assert!(err.is_io_error());
    assert!(err.to_string().contains("version 9"));
}
