//! Canonical total order over expressions.
//!
//! Nodes are ordered by hash first, then by type tag, then by a
//! variant-specific deep comparison. The order is deterministic within a
//! process and decides both equality and the sorted order of commutative
//! operands.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::handle::Ex;
use crate::node::Kind;

impl Ex {
    /// Compares two expressions in canonical order.
    #[must_use]
    pub fn compare(&self, other: &Ex) -> Ordering {
        if self.ptr_eq(other) {
            return Ordering::Equal;
        }
        self.hash_value()
            .cmp(&other.hash_value())
            .then_with(|| self.tag().cmp(&other.tag()))
            .then_with(|| self.compare_same_type(other))
    }

    /// Structural equality.
    #[must_use]
    pub fn is_equal(&self, other: &Ex) -> bool {
        self.compare(other) == Ordering::Equal
    }

    /// Deep comparison of two nodes with the same type tag.
    fn compare_same_type(&self, other: &Ex) -> Ordering {
        match (self.kind(), other.kind()) {
            (Kind::Numeric(a), Kind::Numeric(b)) => a.compare(b),
            (Kind::Symbol(a), Kind::Symbol(b)) => a.serial.cmp(&b.serial),
            (Kind::Constant(a), Kind::Constant(b)) => a.cmp(b),
            (Kind::Wildcard(a), Kind::Wildcard(b)) => a.cmp(b),
            (
                Kind::Add {
                    terms: ta,
                    constant: ca,
                },
                Kind::Add {
                    terms: tb,
                    constant: cb,
                },
            ) => ta
                .len()
                .cmp(&tb.len())
                .then_with(|| {
                    ta.iter()
                        .zip(tb)
                        .map(|((ra, ka), (rb, kb))| ra.compare(rb).then_with(|| ka.compare(kb)))
                        .find(|o| o.is_ne())
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| ca.compare(cb)),
            (
                Kind::Mul {
                    factors: fa,
                    coeff: ca,
                },
                Kind::Mul {
                    factors: fb,
                    coeff: cb,
                },
            ) => fa
                .len()
                .cmp(&fb.len())
                .then_with(|| {
                    fa.iter()
                        .zip(fb)
                        .map(|((ba, ea), (bb, eb))| ba.compare(bb).then_with(|| ea.compare(eb)))
                        .find(|o| o.is_ne())
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| ca.compare(cb)),
            (
                Kind::Power {
                    basis: ba,
                    exponent: ea,
                },
                Kind::Power {
                    basis: bb,
                    exponent: eb,
                },
            ) => ba.compare(bb).then_with(|| ea.compare(eb)),
            (Kind::NcMul(a), Kind::NcMul(b)) => compare_seq(a, b),
            (Kind::List(a), Kind::List(b)) => compare_seq(a, b),
            (Kind::Function { func: fa, args: aa }, Kind::Function { func: fb, args: ab }) => {
                fa.cmp(fb).then_with(|| compare_seq(aa, ab))
            }
            (
                Kind::FDerivative {
                    func: fa,
                    params: pa,
                    args: aa,
                },
                Kind::FDerivative {
                    func: fb,
                    params: pb,
                    args: ab,
                },
            ) => fa
                .cmp(fb)
                .then_with(|| pa.cmp(pb))
                .then_with(|| compare_seq(aa, ab)),
            (
                Kind::Relational {
                    lhs: la,
                    rhs: ra,
                    op: oa,
                },
                Kind::Relational {
                    lhs: lb,
                    rhs: rb,
                    op: ob,
                },
            ) => oa
                .cmp(ob)
                .then_with(|| la.compare(lb))
                .then_with(|| ra.compare(rb)),
            // tags differ; only reachable through a direct call
            (a, b) => a.tag().cmp(&b.tag()),
        }
    }
}

fn compare_seq(a: &[Ex], b: &[Ex]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| {
        a.iter()
            .zip(b)
            .map(|(x, y)| x.compare(y))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

impl PartialEq for Ex {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl Eq for Ex {}

impl PartialOrd for Ex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Hash for Ex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_value().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let x = Ex::symbol("x");
        let a = Ex::sin(x.clone());
        let b = Ex::sin(x.clone());
        assert!(!a.ptr_eq(&b));
        assert!(a.is_equal(&b));
        assert_eq!(a, b);
        assert_ne!(a, Ex::cos(x));
    }

    #[test]
    fn test_same_name_symbols_differ() {
        let a = Ex::symbol("x");
        let b = Ex::symbol("x");
        assert_ne!(a, b);
        assert_eq!(a.compare(&b), b.compare(&a).reverse());
    }

    #[test]
    fn test_fderivative_params_participate() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let f = crate::node::Func::Named("f".into());
        let d0 = Ex::fderivative(f.clone(), vec![0], [x.clone(), y.clone()]);
        let d1 = Ex::fderivative(f, vec![1], [x, y]);
        assert_ne!(d0, d1);
    }

    #[test]
    fn test_exact_and_approximate_differ() {
        assert_ne!(Ex::integer(1), Ex::num(1.0));
    }
}
