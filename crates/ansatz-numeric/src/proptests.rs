//! Property-based tests for exact and approximate arithmetic.

#[cfg(test)]
mod tests {
    use num_traits::{One, Zero};
    use proptest::prelude::*;

    use crate::{Integer, Numeric, Rational};

    fn small_int() -> impl Strategy<Value = i64> {
        -1000i64..1000i64
    }

    fn non_zero_int() -> impl Strategy<Value = i64> {
        prop_oneof![(-1000i64..=-1i64), (1i64..=1000i64)]
    }

    fn small_rational() -> impl Strategy<Value = Rational> {
        (small_int(), non_zero_int()).prop_map(|(n, d)| Rational::from_i64(n, d))
    }

    fn positive_rational() -> impl Strategy<Value = Rational> {
        (1i64..200i64, 1i64..200i64).prop_map(|(n, d)| Rational::from_i64(n, d))
    }

    // Exact complex rationals
    fn exact() -> impl Strategy<Value = Numeric> {
        (small_rational(), small_rational()).prop_map(|(re, im)| Numeric::complex(re, im))
    }

    proptest! {
        #[test]
        fn integer_floor_division(a in small_int(), b in non_zero_int()) {
            let a = Integer::new(a);
            let b = Integer::new(b);
            let (q, r) = a.div_rem_floor(&b);
            prop_assert_eq!(&(&q * &b) + &r, a);
            prop_assert!(r.is_zero() || r.is_negative() == b.is_negative());
            prop_assert!(r.abs() < b.abs());
        }

        #[test]
        fn integer_root_recovers_base(a in 0i64..5000, n in 1u32..6) {
            let a = Integer::new(a);
            prop_assert_eq!(a.pow(n).nth_root_exact(n), Some(a));
        }

        #[test]
        fn rational_floor_bounds(r in small_rational()) {
            let f = Rational::from_integer(r.floor());
            prop_assert!(f <= r);
            prop_assert!(&r - &f < Rational::one());
        }

        // Field axioms over exact complex values

        #[test]
        fn numeric_add_commutative(a in exact(), b in exact()) {
            prop_assert_eq!(&a + &b, &b + &a);
        }

        #[test]
        fn numeric_mul_associative(a in exact(), b in exact(), c in exact()) {
            prop_assert_eq!(&(&a * &b) * &c, &a * &(&b * &c));
        }

        #[test]
        fn numeric_distributive(a in exact(), b in exact(), c in exact()) {
            prop_assert_eq!(&a * &(&b + &c), &(&a * &b) + &(&a * &c));
        }

        #[test]
        fn numeric_additive_inverse(a in exact()) {
            prop_assert!((&a + &(-&a)).is_zero());
            prop_assert_eq!(&a - &a, Numeric::zero());
        }

        #[test]
        fn numeric_division_inverts_multiplication(a in exact(), b in exact()) {
            prop_assume!(!b.is_zero());
            prop_assert_eq!((&a * &b).checked_div(&b).unwrap(), a);
        }

        #[test]
        fn numeric_exactness_is_contagious(a in exact(), x in -100.0f64..100.0) {
            prop_assert!(!(&a + &Numeric::approx(x)).is_exact());
            prop_assert!(!(&a * &Numeric::approx(x)).is_exact());
        }

        // Exponentiation

        #[test]
        fn numeric_integer_power_adds_exponents(a in exact(), m in 0i64..6, n in 0i64..6) {
            let lhs = &a.checked_pow(&Numeric::integer(m)).unwrap()
                * &a.checked_pow(&Numeric::integer(n)).unwrap();
            let rhs = a.checked_pow(&Numeric::integer(m + n)).unwrap();
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn numeric_root_of_power_is_exact(r in positive_rational(), q in 1i64..5) {
            let raised = Numeric::from_rational(r.pow(u32::try_from(q).unwrap()));
            let root = raised.checked_pow(&Numeric::rational(1, q)).unwrap();
            prop_assert!(root.is_exact());
            prop_assert_eq!(root, Numeric::from_rational(r));
        }

        #[test]
        fn numeric_negative_exponent_is_reciprocal(r in positive_rational(), n in 1i64..5) {
            let a = Numeric::from_rational(r);
            let pos = a.checked_pow(&Numeric::integer(n)).unwrap();
            let neg = a.checked_pow(&Numeric::integer(-n)).unwrap();
            prop_assert!((&pos * &neg).is_one());
        }

        // Canonical order

        #[test]
        fn numeric_compare_antisymmetric(a in exact(), b in exact()) {
            prop_assert_eq!(a.compare(&b), b.compare(&a).reverse());
        }

        #[test]
        fn numeric_equal_values_hash_equal(n in small_int(), d in non_zero_int(), k in 1i64..20) {
            let a = Numeric::rational(n, d);
            let b = Numeric::rational(n * k, d * k);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.hash_value(), b.hash_value());
        }
    }
}
