use std::sync::Arc;

use ancestry::{Error, Node, OrphanStrategy, TreeConfig, tree::TreeError};
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn test_rootify_promotes_descendants_one_level() {
    let tree = test_tree(OrphanStrategy::Rootify).await;
    // 1 -> 2 -> 3 -> 4
    let mut chain = create_chain(&tree, 4).await;

    tree.delete(&mut chain[1]).await.unwrap();
    assert!(chain[1].is_destroyed());

    assert_eq!(
        snapshot(&tree).await,
        vec![(1, None), (3, None), (4, Some("3".to_string()))]
    );
    tree.check_integrity().await.unwrap();
}

#[tokio::test]
async fn test_rootify_of_a_root_strips_one_segment() {
    let tree = test_tree(OrphanStrategy::Rootify).await;
    let mut chain = create_chain(&tree, 4).await;
    let sibling = create_child(&tree, &chain[0]).await;

    tree.delete(&mut chain[0]).await.unwrap();

    assert_eq!(
        snapshot(&tree).await,
        vec![
            (2, None),
            (3, Some("2".to_string())),
            (4, Some("2/3".to_string())),
            (sibling.id().unwrap(), None),
        ]
    );
}

#[tokio::test]
async fn test_rootify_refreshes_depth_cache() {
    let config = TreeConfig::new(OrphanStrategy::Rootify).with_depth_cache_field("depth");
    let (tree, _) = test_tree_with(config).await;
    let mut chain = create_chain(&tree, 3).await;

    tree.delete(&mut chain[0]).await.unwrap();

    let third = reload(&tree, &chain[2]).await;
    assert_eq!(third.depth_cache(), Some(1));
    tree.check_integrity().await.unwrap();
}

#[tokio::test]
async fn test_destroy_removes_the_whole_subtree() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    // 1 -> {2 -> 3 -> 4, 5}, and a second root 6.
    let mut chain = create_chain(&tree, 4).await;
    let sibling = create_child(&tree, &chain[0]).await;
    let other_root = create_root(&tree).await;

    tree.delete(&mut chain[1]).await.unwrap();

    assert_eq!(
        snapshot(&tree).await,
        vec![
            (1, None),
            (sibling.id().unwrap(), Some("1".to_string())),
            (other_root.id().unwrap(), None),
        ]
    );
    for id in [2, 3, 4] {
        assert!(tree.find(id).await.unwrap_err().is_not_found());
    }
}

#[tokio::test]
async fn test_restrict_refuses_records_with_children() {
    let tree = test_tree(OrphanStrategy::Restrict).await;
    let mut chain = create_chain(&tree, 3).await;
    let before = snapshot(&tree).await;

    let err = tree.delete(&mut chain[1]).await.unwrap_err();
    assert!(err.is_has_descendants());
    assert!(!chain[1].is_destroyed());
    assert_eq!(snapshot(&tree).await, before);

    // Leaves can go.
    tree.delete(&mut chain[2]).await.unwrap();
    tree.delete(&mut chain[1]).await.unwrap();
    assert_eq!(snapshot(&tree).await, vec![(1, None)]);
}

#[tokio::test]
async fn test_suppressed_delete_leaves_descendants() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    let mut chain = create_chain(&tree, 3).await;

    {
        let mut guard = chain[1].suppress_cascade();
        tree.delete(&mut guard).await.unwrap();
    }

    assert_eq!(
        snapshot(&tree).await,
        vec![(1, None), (3, Some("1/2".to_string()))]
    );
    assert!(tree.check_integrity().await.is_err());
}

#[tokio::test]
async fn test_delete_of_new_or_deleted_record() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    let mut fresh = Node::new();
    tree.delete(&mut fresh).await.unwrap();
    assert!(!fresh.is_destroyed());

    let mut root = create_root(&tree).await;
    tree.delete(&mut root).await.unwrap();
    let err = tree.delete(&mut root).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_failed_orphan_write_surfaces_partial_cascade() {
    // Rootify: 1 -> 2 -> {3, 4}; writes to 3 fail.
    let store = Arc::new(FailingStore::new(3));
    let tree = tree_over(store, OrphanStrategy::Rootify).await;
    let mut chain = create_chain(&tree, 3).await;
    create_child(&tree, &chain[1]).await;

    let err = tree.delete(&mut chain[1]).await.unwrap_err();
    assert!(err.is_partial_cascade());
    assert!(!chain[1].is_destroyed());
    // The record itself survives the failed delete.
    assert_eq!(stored_ancestry(&tree, 2).await.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_failed_destroy_keeps_the_record() {
    let store = Arc::new(FailingStore::new(3));
    let tree = tree_over(store, OrphanStrategy::Destroy).await;
    let mut chain = create_chain(&tree, 3).await;

    let err = tree.delete(&mut chain[1]).await.unwrap_err();
    assert!(err.is_partial_cascade());
    assert!(err.to_string().contains("descendant 3"));
    assert!(tree.find(2).await.is_ok());
}

#[tokio::test]
async fn test_skipped_orphans_are_not_counted_as_promoted() {
    // 1 -> 2 -> {3, 4}; the store also hands back 9, which is not under 2.
    let store = Arc::new(FailingStore::new(4).with_stray(json!({ "id": 9, "ancestry": "7" })));
    let tree = tree_over(store, OrphanStrategy::Rootify).await;
    let mut chain = create_chain(&tree, 3).await;
    create_child(&tree, &chain[1]).await;

    let err = tree.delete(&mut chain[1]).await.unwrap_err();
    let Error::Tree(TreeError::PartialCascade {
        id,
        failed_id,
        completed,
        total,
        ..
    }) = err
    else {
        panic!("expected a partial cascade");
    };
    // Only 3 was promoted before the write to 4 failed.
    assert_eq!((id, failed_id, completed, total), (2, 4, 1, 3));
    assert_eq!(stored_ancestry(&tree, 3).await, None);
}
