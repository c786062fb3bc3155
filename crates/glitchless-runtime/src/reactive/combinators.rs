#![forbid(unsafe_code)]

//! Two-parent nodes composed from [`Observable::flat_map`] and
//! [`Observable::map`].
//!
//! None of these are primitives. Each selects, per value of the left node, a
//! fresh `map` over the right node, so the result has both parents and the
//! height ordering keeps it from firing on a half-updated pair.

use std::ops::BitAnd;
use std::rc::Rc;

use super::observable::Observable;

impl Observable<bool> {
    /// Logical AND of two boolean nodes.
    #[must_use]
    pub fn and(&self, rhs: &Observable<bool>) -> Observable<bool> {
        let lhs_label = self.debug_label();
        let rhs = rhs.clone();
        self.flat_map(move |&l| {
            let body = rhs.map(move |&r| r && l);
            body.set_debug_label(format!(
                "{lhs_label}.flat_map body: {}.map(|r| r && l)",
                rhs.debug_label()
            ));
            body
        })
    }
}

impl BitAnd for &Observable<bool> {
    type Output = Observable<bool>;

    fn bitand(self, rhs: Self) -> Observable<bool> {
        self.and(rhs)
    }
}

/// Combine two nodes with a binary function.
///
/// The result updates whenever either parent changes and, within one
/// propagation round, is only observed after both parents have settled.
#[must_use]
pub fn combine<A, B, C>(
    lhs: &Observable<A>,
    rhs: &Observable<B>,
    f: impl Fn(&A, &B) -> C + 'static,
) -> Observable<C>
where
    A: Clone + 'static,
    B: 'static,
    C: Clone + 'static,
{
    let rhs = rhs.clone();
    let f = Rc::new(f);
    lhs.flat_map(move |l| {
        let l = l.clone();
        let f = Rc::clone(&f);
        rhs.map(move |r| f(&l, r))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn and_truth_table() {
        for (l, r) in [(false, false), (false, true), (true, false), (true, true)] {
            let lhs = Observable::new(l);
            let rhs = Observable::new(r);
            assert_eq!(lhs.and(&rhs).get(), l && r, "{l} && {r}");
        }
    }

    #[test]
    fn and_follows_both_parents() {
        let lhs = Observable::labeled(true, "lhs");
        let rhs = Observable::labeled(true, "rhs");
        let both = &lhs & &rhs;
        assert!(both.get());

        rhs.send(false);
        assert!(!both.get());
        lhs.send(false);
        rhs.send(true);
        assert!(!both.get());
        lhs.send(true);
        assert!(both.get());
    }

    #[test]
    fn and_registers_one_record_per_parent() {
        let lhs = Observable::labeled(true, "lhs");
        let rhs = Observable::labeled(false, "rhs");
        let both = lhs.and(&rhs);
        assert_eq!(rhs.child_count(), 1);
        assert_eq!(lhs.child_count(), 1);

        // Re-selection swaps the body on rhs instead of stacking a new one.
        lhs.send(false);
        lhs.send(true);
        assert_eq!(rhs.child_count(), 1);

        drop(both);
        assert_eq!(rhs.child_count(), 0);
        assert_eq!(lhs.child_count(), 0);
    }

    #[test]
    fn combine_diamond_is_glitch_free() {
        let root = Observable::new(1);
        let a = root.map(|v| v + 1);
        let b = root.map(|v| v * 10);
        let pairs = Rc::new(RefCell::new(Vec::new()));
        let pairs_clone = Rc::clone(&pairs);
        let c = combine(&a, &b, |x, y| (*x, *y));
        c.observe(move |pair| pairs_clone.borrow_mut().push(*pair));

        root.send(2);
        root.send(5);

        assert_eq!(*pairs.borrow(), vec![(2, 10), (3, 20), (6, 50)]);
    }

    #[test]
    fn combine_with_non_copy_values() {
        let first = Observable::new("Jane".to_string());
        let last = Observable::new("Doe".to_string());
        let full = combine(&first, &last, |f, l| format!("{f} {l}"));
        assert_eq!(full.get(), "Jane Doe");

        last.send("Smith".to_string());
        assert_eq!(full.get(), "Jane Smith");
        first.send("John".to_string());
        assert_eq!(full.get(), "John Smith");
    }
}
