//! Recycle Pool Tests
//!
//! Tests for the generic claim/release pool underlying the query pool:
//! free-list reuse, growth accounting, and stale-handle rejection.

use glint::{CacheError, RecyclePool};

#[test]
fn claim_allocates_only_on_free_list_miss() {
    let mut pool: RecyclePool<String> = RecyclePool::new();
    let a = pool.claim_with(|| "first".to_string());
    let b = pool.claim_with(|| "second".to_string());
    assert_eq!(pool.created_count(), 2);

    pool.release(a).expect("claimed");
    let c = pool.claim_with(|| "third".to_string());
    assert_eq!(
        pool.created_count(),
        2,
        "Free-list hit must not run the factory"
    );
    assert_eq!(pool.get(c), Some(&"first".to_string()));
    assert_eq!(pool.get(b), Some(&"second".to_string()));
}

#[test]
fn counts_track_claim_and_release() {
    let mut pool: RecyclePool<u32> = RecyclePool::new();
    let mut handles = Vec::new();
    for i in 0..5 {
        handles.push(pool.claim_with(move || i));
    }
    assert_eq!(pool.claimed_count(), 5);
    assert_eq!(pool.free_count(), 0);
    assert_eq!(pool.total_count(), 5);

    for h in handles.drain(..3) {
        pool.release(h).expect("claimed");
    }
    assert_eq!(pool.claimed_count(), 2);
    assert_eq!(pool.free_count(), 3);
    assert_eq!(pool.total_count(), 5);
}

#[test]
fn stale_handle_is_rejected() {
    let mut pool: RecyclePool<u32> = RecyclePool::new();
    let h = pool.claim_with(|| 7);
    pool.release(h).expect("claimed");

    // The slot got a new generation; the old handle must stay dead even
    // after the resource is claimed again.
    let _again = pool.claim_with(|| unreachable!("free list has an entry"));
    let err = pool.release(h).unwrap_err();
    assert!(matches!(err, CacheError::InvalidReference(_)));
    assert!(pool.get(h).is_none());
}

#[test]
fn get_mut_reaches_the_claimed_resource() {
    let mut pool: RecyclePool<Vec<u32>> = RecyclePool::new();
    let h = pool.claim_with(Vec::new);
    pool.get_mut(h).expect("claimed").push(42);
    assert_eq!(pool.get(h), Some(&vec![42]));
}
