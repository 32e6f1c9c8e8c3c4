use rayon::prelude::*;

use super::{clause, clauses};
use crate::pool::{ClausePool, DEFAULT_LBD_THRESHOLD};

#[test]
fn admits_glue_clauses_once() {
    let pool = ClausePool::new();
    assert_eq!(pool.lbd_threshold(), DEFAULT_LBD_THRESHOLD);
    assert!(pool.is_empty());

    assert!(pool.admit(&clause(&[1, -2]), 2));
    assert!(!pool.admit(&clause(&[1, -2]), 1));
    assert!(pool.admit(&clause(&[-1, 2]), 1));

    assert_eq!(pool.len(), 2);
    assert_eq!(pool.snapshot(), clauses(&[&[1, -2], &[-1, 2]]));
}

#[test]
fn literal_order_and_repetition_do_not_matter() {
    let pool = ClausePool::new();

    assert!(pool.admit(&clause(&[3, -1, 2]), 2));
    assert!(!pool.admit(&clause(&[2, 3, -1]), 2));
    assert!(!pool.admit(&clause(&[-1, -1, 2, 3]), 2));
    assert!(pool.admit(&clause(&[3, 1, 2]), 2));

    // stored as offered
    assert_eq!(pool.snapshot()[0], clause(&[3, -1, 2]));
    assert_eq!(pool.len(), 2);
}

#[test]
fn rejects_clauses_above_threshold() {
    let pool = ClausePool::with_lbd_threshold(3);

    assert!(!pool.admit(&clause(&[1, 2, 3, 4]), 4));
    assert!(pool.admit(&clause(&[1, 2, 3, 4]), 3));
    assert!(ClausePool::with_lbd_threshold(0).admit(&clause(&[1]), 0));
    assert_eq!(pool.len(), 1);
}

#[test]
fn snapshot_is_a_copy() {
    let pool = ClausePool::new();
    pool.admit(&clause(&[1]), 1);

    let before = pool.snapshot();
    pool.admit(&clause(&[2]), 1);

    assert_eq!(before.len(), 1);
    assert_eq!(pool.snapshot().len(), 2);
}

#[test]
fn concurrent_admission() {
    let pool = ClausePool::with_lbd_threshold(8);

    // 64 distinct clauses, each offered by 8 threads in some literal order
    let admitted: usize = (0..512i64)
        .into_par_iter()
        .map(|i| {
            let base = i % 64 + 1;
            let literals = if i % 2 == 0 {
                vec![base, -(base + 100)]
            } else {
                vec![-(base + 100), base]
            };
            pool.admit(&clause(&literals), 1) as usize
        })
        .sum();

    assert_eq!(admitted, 64);
    assert_eq!(pool.len(), 64);
}
