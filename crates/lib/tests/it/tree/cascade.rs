use std::sync::Arc;

use ancestry::{DepthScope, Error, Node, OrphanStrategy, TreeConfig, path, tree::TreeError};
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn test_move_rewrites_descendants() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    let a = create_root(&tree).await;
    let mut b = create_child(&tree, &a).await;
    let c = create_child(&tree, &b).await;
    let d = create_root(&tree).await;

    b.set_parent(Some(&d)).unwrap();
    assert!(tree.save(&mut b).await.unwrap());

    let (b_id, c_id, d_id) = (b.id().unwrap(), c.id().unwrap(), d.id().unwrap());
    let b = reload(&tree, &b).await;
    let c = reload(&tree, &c).await;
    assert_eq!(b.ancestor_ids(), &[d_id]);
    assert_eq!(c.ancestor_ids(), &[d_id, b_id]);
    assert_eq!(
        path::decode(stored_ancestry(&tree, c_id).await.as_deref()).unwrap(),
        vec![d_id, b_id]
    );
    assert!(tree.is_childless(&a).await.unwrap());
    tree.check_integrity().await.unwrap();
}

#[tokio::test]
async fn test_move_to_root_and_back() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    let chain = create_chain(&tree, 4).await;
    let mut second = chain[1].clone();

    second.set_parent(None).unwrap();
    assert!(tree.save(&mut second).await.unwrap());
    assert_eq!(stored_ancestry(&tree, 2).await, None);
    assert_eq!(stored_ancestry(&tree, 3).await.as_deref(), Some("2"));
    assert_eq!(stored_ancestry(&tree, 4).await.as_deref(), Some("2/3"));

    second.set_parent(Some(&chain[0])).unwrap();
    assert!(tree.save(&mut second).await.unwrap());
    assert_eq!(stored_ancestry(&tree, 3).await.as_deref(), Some("1/2"));
    assert_eq!(stored_ancestry(&tree, 4).await.as_deref(), Some("1/2/3"));
    tree.check_integrity().await.unwrap();
}

#[tokio::test]
async fn test_move_leaves_lookalike_paths_alone() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    let root = create_root(&tree).await;
    let mut two = create_child_with_id(&tree, &root, 2).await;
    let twenty_three = create_child_with_id(&tree, &root, 23).await;
    create_child_with_id(&tree, &two, 30).await;
    create_child_with_id(&tree, &twenty_three, 40).await;

    two.set_parent(None).unwrap();
    assert!(tree.save(&mut two).await.unwrap());

    assert_eq!(stored_ancestry(&tree, 30).await.as_deref(), Some("2"));
    assert_eq!(stored_ancestry(&tree, 40).await.as_deref(), Some("1/23"));
}

#[tokio::test]
async fn test_move_updates_depth_cache() {
    let (tree, _) = test_tree_with(TreeConfig::default().with_depth_cache_field("depth")).await;
    let chain = create_chain(&tree, 4).await;
    let mut third = chain[2].clone();

    third.set_parent(None).unwrap();
    assert!(tree.save(&mut third).await.unwrap());

    let fourth = reload(&tree, &chain[3]).await;
    assert_eq!(fourth.depth(), 1);
    assert_eq!(fourth.depth_cache(), Some(1));
    assert_eq!(
        tree.descendant_ids(&chain[0], DepthScope::all().at(1))
            .await
            .unwrap(),
        vec![2]
    );
    tree.check_integrity().await.unwrap();
}

#[tokio::test]
async fn test_extension_fields_survive_moves() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    let root = create_root(&tree).await;
    let mut parent = create_child(&tree, &root).await;
    let mut leaf = Node::new().with_field("title", "leaf");
    leaf.set_parent(Some(&parent)).unwrap();
    assert!(tree.save(&mut leaf).await.unwrap());

    parent.set_field("title", "parent");
    parent.set_parent(None).unwrap();
    assert!(tree.save(&mut parent).await.unwrap());

    let leaf = reload(&tree, &leaf).await;
    assert_eq!(leaf.field("title"), Some(&json!("leaf")));
    let parent = reload(&tree, &parent).await;
    assert_eq!(parent.field("title"), Some(&json!("parent")));
    assert!(parent.is_root());
}

#[tokio::test]
async fn test_suppressed_cascade_skips_descendants() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    let chain = create_chain(&tree, 3).await;
    let other_root = create_root(&tree).await;
    let mut second = chain[1].clone();

    {
        let mut guard = second.suppress_cascade();
        guard.set_parent(Some(&other_root)).unwrap();
        assert!(tree.save(&mut guard).await.unwrap());
    }
    assert!(second.cascade_enabled());

    assert_eq!(stored_ancestry(&tree, 2).await.as_deref(), Some("4"));
    // The child still points at the old path.
    assert_eq!(stored_ancestry(&tree, 3).await.as_deref(), Some("1/2"));
    let err = tree.check_integrity().await.unwrap_err();
    assert!(err.is_integrity_error());
}

#[tokio::test]
async fn test_unchanged_ancestry_does_not_cascade() {
    let store = Arc::new(FailingStore::new(2));
    let tree = tree_over(store, OrphanStrategy::Destroy).await;
    let mut root = create_root(&tree).await;
    create_child(&tree, &root).await;

    // A descendant write would fail; a plain field update never attempts one.
    root.set_field("name", "root");
    assert!(tree.save(&mut root).await.unwrap());
    assert!(!root.ancestry_changed());
}

#[tokio::test]
async fn test_failed_descendant_write_surfaces_partial_cascade() {
    // 1 -> 2 -> {3, 4}; 5 is a new root. Writes to 4 fail.
    let store = Arc::new(FailingStore::new(4));
    let tree = tree_over(store, OrphanStrategy::Destroy).await;
    let one = create_root(&tree).await;
    let mut two = create_child(&tree, &one).await;
    create_child(&tree, &two).await;
    create_child(&tree, &two).await;
    let five = create_root(&tree).await;

    two.set_parent(Some(&five)).unwrap();
    let err = tree.save(&mut two).await.unwrap_err();
    assert!(err.is_partial_cascade());
    let Error::Tree(TreeError::PartialCascade {
        id,
        failed_id,
        completed,
        total,
        source,
    }) = err
    else {
        panic!("expected a partial cascade");
    };
    assert_eq!((id, failed_id, completed, total), (2, 4, 1, 2));
    assert!(source.is_store_error());

    // Earlier descendants keep their rewrite; nothing is rolled back.
    assert_eq!(stored_ancestry(&tree, 3).await.as_deref(), Some("5/2"));
    assert_eq!(stored_ancestry(&tree, 4).await.as_deref(), Some("1/2"));
    // The moved record itself was not written.
    assert_eq!(stored_ancestry(&tree, 2).await.as_deref(), Some("1"));
    assert!(two.ancestry_changed());
}

#[tokio::test]
async fn test_before_update_runs_for_host_driven_saves() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    let chain = create_chain(&tree, 3).await;
    let mut second = chain[1].clone();
    second.set_parent(None).unwrap();

    // The host validates and writes the record itself; the tree only cascades.
    assert!(tree.before_validate(&mut second));
    tree.before_update(&second).await.unwrap();
    assert_eq!(stored_ancestry(&tree, 3).await.as_deref(), Some("2"));
    assert_eq!(stored_ancestry(&tree, 2).await.as_deref(), Some("1"));
}
