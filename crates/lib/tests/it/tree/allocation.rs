use std::{collections::BTreeSet, sync::Arc};

use ancestry::{Node, OrphanStrategy};

use crate::helpers::*;

#[tokio::test]
async fn test_sequential_inserts_allocate_one_to_n() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    let mut allocated = Vec::new();
    for _ in 0..5 {
        allocated.push(create_root(&tree).await.id().unwrap());
    }
    assert_eq!(allocated, vec![1, 2, 3, 4, 5]);
}

// Every lost race means another task's insert landed, so three tasks never
// need more than the three attempts allowed.
#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn test_concurrent_inserts_get_distinct_ids() {
    let tree = test_tree(OrphanStrategy::Destroy).await;

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let tree = tree.clone();
            tokio::spawn(async move {
                let mut node = Node::new();
                tree.save(&mut node).await.map(|_| node.id())
            })
        })
        .collect();

    let mut allocated = BTreeSet::new();
    for handle in handles {
        let id = handle.await.unwrap().unwrap().unwrap();
        assert!(allocated.insert(id), "id {id} allocated twice");
    }
    assert_eq!(allocated, (1..=3).collect::<BTreeSet<_>>());
}

#[tokio::test]
async fn test_insert_retries_after_losing_a_race() {
    let store = Arc::new(RacingStore::new(2));
    let tree = tree_over(store.clone(), OrphanStrategy::Destroy).await;

    let mut node = Node::new();
    assert!(tree.save(&mut node).await.unwrap());

    // Ids 1 and 2 went to the competing writer.
    assert_eq!(node.id(), Some(3));
    assert!(!node.is_new_record());
    assert_eq!(store.len().await, 3);
}

#[tokio::test]
async fn test_insert_gives_up_after_three_attempts() {
    let store = Arc::new(RacingStore::new(3));
    let tree = tree_over(store.clone(), OrphanStrategy::Destroy).await;

    let mut node = Node::new();
    let err = tree.save(&mut node).await.unwrap_err();
    assert!(err.is_duplicate_key_on("id"));
    assert_eq!(node.id(), None);
    assert!(node.is_new_record());

    // The next save allocates afresh and succeeds.
    assert!(tree.save(&mut node).await.unwrap());
    assert_eq!(node.id(), Some(4));
}

#[tokio::test]
async fn test_chosen_id_collision_is_not_retried() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    let mut first = Node::with_id(7);
    assert!(tree.save(&mut first).await.unwrap());

    let mut second = Node::with_id(7);
    let err = tree.save(&mut second).await.unwrap_err();
    assert!(err.is_duplicate_key());
    assert_eq!(second.id(), Some(7));
    assert!(second.is_new_record());
}

#[tokio::test]
async fn test_allocation_continues_after_chosen_id() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    let mut chosen = Node::with_id(10);
    assert!(tree.save(&mut chosen).await.unwrap());
    assert_eq!(create_root(&tree).await.id(), Some(11));
}

#[tokio::test]
async fn test_ids_are_not_reused_after_delete() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    create_root(&tree).await;
    create_root(&tree).await;
    let mut newest = create_root(&tree).await;
    assert_eq!(newest.id(), Some(3));

    tree.delete(&mut newest).await.unwrap();
    assert!(newest.is_destroyed());

    let next = create_root(&tree).await;
    assert_eq!(next.id(), Some(4));

    // Clones share the high-water mark.
    let other = tree.clone();
    assert_eq!(create_root(&other).await.id(), Some(5));
}

#[tokio::test]
async fn test_allocation_fails_cleanly_when_ids_run_out() {
    let tree = test_tree(OrphanStrategy::Destroy).await;
    let mut last = Node::with_id(u64::MAX);
    assert!(tree.save(&mut last).await.unwrap());

    let mut node = Node::new();
    let err = tree.save(&mut node).await.unwrap_err();
    assert!(err.is_id_space_exhausted());
    assert_eq!(node.id(), None);
    assert!(node.is_new_record());
}
