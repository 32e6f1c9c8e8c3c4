use rayon::prelude::*;

use crate::{branch::BranchRegistry, formula::Variable};

fn var(index: usize) -> Variable {
    Variable::from_index(index).unwrap()
}

#[test]
fn record_and_drain() {
    let registry = BranchRegistry::new();
    assert!(registry.is_empty());

    registry.record(2, var(0), true);
    registry.record(2, var(3), false);
    registry.record(5, var(1), true);

    assert_eq!(registry.pending(2), 2);
    assert_eq!(registry.pending(5), 1);
    assert_eq!(registry.pending(7), 0);

    assert_eq!(registry.drain(2), vec![(var(0), true), (var(3), false)]);
    assert_eq!(registry.pending(2), 0);
    assert!(registry.drain(2).is_empty());
    assert!(!registry.is_empty());

    assert_eq!(registry.drain(5), vec![(var(1), true)]);
    assert!(registry.is_empty());
}

#[test]
fn concurrent_record() {
    let registry = BranchRegistry::new();

    (0..400usize).into_par_iter().for_each(|i| {
        registry.record(i % 4, var(i), i % 3 == 0);
    });

    let mut drained: Vec<_> = (0..4).flat_map(|depth| registry.drain(depth)).collect();
    drained.sort();

    assert_eq!(drained.len(), 400);
    assert_eq!(drained[17], (var(17), 17 % 3 == 0));
    assert!(registry.is_empty());
}
