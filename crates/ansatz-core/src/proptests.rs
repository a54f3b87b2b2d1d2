//! Property-based tests for canonical forms.

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;
    use std::sync::OnceLock;

    use proptest::prelude::*;

    use crate::Ex;

    fn symbols() -> &'static [Ex; 3] {
        static SYMBOLS: OnceLock<[Ex; 3]> = OnceLock::new();
        SYMBOLS.get_or_init(|| [Ex::symbol("x"), Ex::symbol("y"), Ex::symbol("z")])
    }

    fn x() -> Ex {
        symbols()[0].clone()
    }

    // Small integers and the three shared symbols
    fn leaf() -> impl Strategy<Value = Ex> {
        prop_oneof![
            (-5i64..=5).prop_map(Ex::integer),
            (0usize..3).prop_map(|i| symbols()[i].clone()),
        ]
    }

    // Leaves plus two wildcards
    fn pattern_leaf() -> impl Strategy<Value = Ex> {
        prop_oneof![leaf(), (0u32..2).prop_map(Ex::wild)]
    }

    // Polynomial-like trees over positive integer powers, with sin as an
    // opaque function; these never hit a domain error.
    fn tree(leaves: BoxedStrategy<Ex>) -> impl Strategy<Value = Ex> {
        leaves.prop_recursive(3, 24, 3, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 2..4).prop_map(Ex::add),
                prop::collection::vec(inner.clone(), 2..3).prop_map(Ex::mul),
                (inner.clone(), 1i64..=3).prop_map(|(b, n)| b.pow(n)),
                inner.prop_map(Ex::sin),
            ]
        })
    }

    fn expr() -> impl Strategy<Value = Ex> {
        tree(leaf().boxed()).prop_map(|e| e.eval().unwrap())
    }

    fn pattern() -> impl Strategy<Value = Ex> {
        tree(pattern_leaf().boxed()).prop_map(|e| e.eval().unwrap())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // Hashing and ordering

        #[test]
        fn hash_ignores_cached_state(e in expr()) {
            let fresh = Ex::from_kind(e.kind().clone());
            prop_assert_eq!(fresh.hash_value(), e.hash_value());
            prop_assert_eq!(fresh.compare(&e), Ordering::Equal);
        }

        #[test]
        fn compare_is_antisymmetric(a in expr(), b in expr()) {
            prop_assert_eq!(a.compare(&b), b.compare(&a).reverse());
        }

        #[test]
        fn equal_expressions_hash_equal(a in expr(), b in expr()) {
            let ab = Ex::add([a.clone(), b.clone()]).eval().unwrap();
            let ba = Ex::add([b, a]).eval().unwrap();
            prop_assert_eq!(&ab, &ba);
            prop_assert_eq!(ab.hash_value(), ba.hash_value());
        }

        // Evaluation

        #[test]
        fn eval_is_idempotent(e in expr()) {
            prop_assert!(e.eval().unwrap().ptr_eq(&e));
        }

        #[test]
        fn eval_reaches_a_fixed_point(e in expr()) {
            let fresh = Ex::from_kind(e.kind().clone());
            prop_assert_eq!(fresh.eval().unwrap(), e);
        }

        #[test]
        fn product_is_commutative(a in expr(), b in expr()) {
            let ab = Ex::mul([a.clone(), b.clone()]).eval().unwrap();
            let ba = Ex::mul([b, a]).eval().unwrap();
            prop_assert_eq!(ab, ba);
        }

        // Matching

        #[test]
        fn match_is_sound(e in expr(), p in pattern()) {
            if let Some(bindings) = e.match_pattern(&p) {
                prop_assert_eq!(bindings.apply(&p).unwrap(), e);
            }
        }

        #[test]
        fn expression_matches_itself(e in expr()) {
            let bindings = e.match_pattern(&e);
            prop_assert!(bindings.is_some_and(|b| b.is_empty()));
            prop_assert!(e.has(&e));
        }

        // Expansion, collection and differentiation

        #[test]
        fn expand_is_idempotent(e in expr()) {
            let once = e.expand().unwrap();
            prop_assert_eq!(once.expand().unwrap(), once.clone());
            prop_assert_eq!(
                Ex::from_kind(once.kind().clone()).expand().unwrap(),
                once
            );
        }

        #[test]
        fn collect_then_expand_round_trips(e in expr()) {
            let expanded = e.expand().unwrap();
            let collected = expanded.collect(&x(), false).unwrap();
            prop_assert_eq!(collected.expand().unwrap(), expanded);
        }

        #[test]
        fn diff_is_linear(a in expr(), b in expr()) {
            let sum = (&a + &b).diff(&x(), 1).unwrap().expand().unwrap();
            let parts = (a.diff(&x(), 1).unwrap() + b.diff(&x(), 1).unwrap())
                .expand()
                .unwrap();
            prop_assert_eq!(sum, parts);
        }
    }
}
