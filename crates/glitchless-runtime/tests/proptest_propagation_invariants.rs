//! Property-based invariant tests for height-ordered propagation.
//!
//! Verifies structural guarantees of `Observable` graphs under arbitrary
//! send sequences:
//!
//! 1. Map chains settle fully: the tail equals the composed function of the
//!    last value sent.
//! 2. A terminal observer runs exactly once per `send` (plus the initial
//!    delivery).
//! 3. Heights strictly decrease along a map chain.
//! 4. Diamonds never expose a half-updated pair of parents.
//! 5. `and` trees match the boolean formula after every toggle.
//! 6. `flat_map` mirrors exactly the selected node; sends to unselected
//!    nodes are invisible.
//! 7. The queue is idle after every top-level `send`.
//! 8. Dropping every derived node releases every registration on the root.

use std::cell::RefCell;
use std::rc::Rc;

use glitchless_runtime::{Observable, combine, is_propagating, pending_len};
use proptest::prelude::*;

// ── Helpers ──────────────────────────────────────────────────────────

fn record_into<A: Clone + 'static>(node: &Observable<A>) -> Rc<RefCell<Vec<A>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    node.observe(move |value: &A| sink.borrow_mut().push(value.clone()));
    seen
}

fn build_chain(root: &Observable<i64>, offsets: &[i64]) -> Vec<Observable<i64>> {
    let mut chain = vec![root.clone()];
    for &offset in offsets {
        let next = chain[chain.len() - 1].map(move |v| v + offset);
        chain.push(next);
    }
    chain
}

#[derive(Debug, Clone)]
enum SelectOp {
    Select(usize),
    Send(usize, i32),
}

fn arb_select_op() -> impl Strategy<Value = SelectOp> {
    prop_oneof![
        (0usize..3).prop_map(SelectOp::Select),
        (0usize..3, any::<i32>()).prop_map(|(idx, v)| SelectOp::Send(idx, v)),
    ]
}

// ═════════════════════════════════════════════════════════════════════════
// 1-3. Map chains
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn chain_settles_and_notifies_once(
        offsets in proptest::collection::vec(-100i64..100, 1..8),
        sends in proptest::collection::vec(-1_000i64..1_000, 0..16),
    ) {
        let root = Observable::new(0i64);
        let chain = build_chain(&root, &offsets);
        let tail = chain.last().expect("chain has a root").clone();
        let seen = record_into(&tail);
        let total: i64 = offsets.iter().sum();

        for &v in &sends {
            root.send(v);
            prop_assert_eq!(tail.get(), v + total);
            prop_assert!(!is_propagating());
            prop_assert_eq!(pending_len(), 0);
        }
        prop_assert_eq!(seen.borrow().len(), sends.len() + 1);
    }

    #[test]
    fn chain_heights_strictly_decrease(
        offsets in proptest::collection::vec(-10i64..10, 1..10),
    ) {
        let root = Observable::new(0i64);
        let chain = build_chain(&root, &offsets);
        for pair in chain.windows(2) {
            prop_assert!(pair[0].height() > pair[1].height());
        }
        prop_assert_eq!(chain[chain.len() - 1].height(), 1);
        prop_assert_eq!(root.height(), offsets.len() + 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Diamonds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn diamond_pairs_are_consistent(
        mul in -5i64..5,
        add in -50i64..50,
        sends in proptest::collection::vec(-1_000i64..1_000, 1..16),
    ) {
        let root = Observable::new(0i64);
        let a = root.map(move |v| v * mul);
        let b = root.map(move |v| v + add);
        let c = combine(&a, &b, |x, y| (*x, *y));
        let seen = record_into(&c);

        for &v in &sends {
            root.send(v);
        }

        let seen = seen.borrow();
        prop_assert_eq!(seen.len(), sends.len() + 1);
        for (pair, &v) in seen.iter().skip(1).zip(&sends) {
            prop_assert_eq!(*pair, (v * mul, v + add));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Boolean and-trees
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn and_tree_matches_formula(
        init in any::<[bool; 3]>(),
        toggles in proptest::collection::vec((0usize..3, any::<bool>()), 0..24),
    ) {
        let roots = init.map(Observable::new);
        let not_first = roots[0].map(|on| !on);
        let left = &not_first & &roots[1];
        let right = &not_first & &roots[2];
        let top = &left & &right;
        let seen = record_into(&top);

        let mut state = init;
        for &(idx, value) in &toggles {
            state[idx] = value;
            roots[idx].send(value);
            prop_assert_eq!(top.get(), !state[0] && state[1] && state[2]);
        }
        prop_assert_eq!(seen.borrow().len(), toggles.len() + 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. flat_map selection
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn flat_map_mirrors_only_selected(
        ops in proptest::collection::vec(arb_select_op(), 0..32),
    ) {
        let inners: Vec<Observable<i32>> = (0..3).map(|i| Observable::new(i * 100)).collect();
        let selector = Observable::new(0usize);
        let choices = inners.clone();
        let mirrored = selector.flat_map(move |&idx| choices[idx].clone());
        let seen = record_into(&mirrored);

        let mut selected = 0usize;
        let mut expected_notifications = 1usize;
        for op in &ops {
            match *op {
                SelectOp::Select(idx) => {
                    selected = idx;
                    selector.send(idx);
                    expected_notifications += 1;
                }
                SelectOp::Send(idx, v) => {
                    inners[idx].send(v);
                    if idx == selected {
                        expected_notifications += 1;
                    }
                }
            }
            prop_assert_eq!(mirrored.get(), inners[selected].get());
        }
        prop_assert_eq!(seen.borrow().len(), expected_notifications);
        for (idx, inner) in inners.iter().enumerate() {
            prop_assert_eq!(inner.child_count(), usize::from(idx == selected));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Teardown
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn dropping_derived_nodes_releases_root(
        offsets in proptest::collection::vec(-10i64..10, 1..6),
        fan_out in 1usize..5,
    ) {
        let root = Observable::new(1i64);
        {
            let chains: Vec<_> = (0..fan_out).map(|_| build_chain(&root, &offsets)).collect();
            prop_assert_eq!(root.child_count(), fan_out);
            root.send(2);
            drop(chains);
        }
        prop_assert_eq!(root.child_count(), 0);
    }
}
