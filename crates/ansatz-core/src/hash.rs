//! Canonical hashing.
//!
//! Every variant hashes a fixed per-tag seed folded with its children's
//! hashes by rotate-and-XOR, in child order. The value is cached on the node
//! once it is evaluated.

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

use crate::handle::Ex;
use crate::node::{status_flags, Kind, TypeTag};

const GOLDEN_RATIO: u32 = 0x9e37_79b9;

/// Spreads small integers over the full 32-bit range.
pub(crate) fn golden_ratio_hash(x: u32) -> u32 {
    x.wrapping_mul(GOLDEN_RATIO)
}

#[inline]
fn fold(acc: u32, h: u32) -> u32 {
    acc.rotate_left(1) ^ h
}

fn seed(tag: TypeTag) -> u32 {
    golden_ratio_hash(tag as u32 + 1)
}

fn fx_hash<T: Hash + ?Sized>(value: &T) -> u32 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    let h = hasher.finish();
    #[allow(clippy::cast_possible_truncation)]
    let folded = (h ^ (h >> 32)) as u32;
    folded
}

impl Ex {
    /// The canonical hash of this expression.
    ///
    /// Structurally equal expressions hash equal regardless of their status
    /// flags.
    #[must_use]
    pub fn hash_value(&self) -> u32 {
        let node = self.node();
        if let Some(h) = node.cached_hash() {
            return h;
        }
        let h = calchash(self);
        if node.has_flag(status_flags::EVALUATED) {
            node.store_hash(h);
        }
        h
    }
}

fn calchash(ex: &Ex) -> u32 {
    let tag = ex.tag();
    let mut v = seed(tag);
    match ex.kind() {
        Kind::Numeric(n) => v ^= n.hash_value(),
        Kind::Symbol(s) => v ^= golden_ratio_hash(s.serial),
        Kind::Constant(c) => v ^= golden_ratio_hash(*c as u32 + 1),
        Kind::Wildcard(label) => v ^= golden_ratio_hash(label.wrapping_add(0x5bd1_e995)),
        Kind::Add { terms, constant } => {
            for (rest, coeff) in terms {
                v = fold(v, rest.hash_value());
                v = fold(v, coeff.hash_value());
            }
            v = fold(v, constant.hash_value());
        }
        Kind::Mul { factors, coeff } => {
            for (basis, exponent) in factors {
                v = fold(v, basis.hash_value());
                v = fold(v, exponent.hash_value());
            }
            v = fold(v, coeff.hash_value());
        }
        Kind::Power { basis, exponent } => {
            v = fold(v, basis.hash_value());
            v = fold(v, exponent.hash_value());
        }
        Kind::Relational { lhs, rhs, op } => {
            v ^= golden_ratio_hash(*op as u32 + 1);
            v = fold(v, lhs.hash_value());
            v = fold(v, rhs.hash_value());
        }
        Kind::NcMul(factors) => {
            for f in factors {
                v = fold(v, f.hash_value());
            }
        }
        Kind::Function { func, args } => {
            v ^= fx_hash(func.name());
            for a in args {
                v = fold(v, a.hash_value());
            }
        }
        Kind::FDerivative { func, params, args } => {
            v ^= fx_hash(func.name());
            v = fold(v, fx_hash(params.as_slice()));
            for a in args {
                v = fold(v, a.hash_value());
            }
        }
        Kind::List(items) => {
            for item in items {
                v = fold(v, item.hash_value());
            }
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_ignores_flags() {
        let x = Ex::symbol("x");
        let evaluated = x.pow(2).eval().unwrap();
        assert!(evaluated.is_evaluated());
        let fresh = Ex::from_kind(evaluated.kind().clone());
        assert!(!fresh.is_evaluated());
        assert_eq!(fresh.hash_value(), evaluated.hash_value());
    }

    #[test]
    fn test_hash_cached_only_when_evaluated() {
        let x = Ex::symbol("x");
        let raw = Ex::sin(x.clone());
        let _ = raw.hash_value();
        assert!(!raw.node().has_flag(status_flags::HASH_CALCULATED));

        let evaluated = raw.eval().unwrap();
        let h = evaluated.hash_value();
        assert!(evaluated.node().has_flag(status_flags::HASH_CALCULATED));
        assert_eq!(evaluated.hash_value(), h);
    }

    #[test]
    fn test_child_order_matters() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let a = Ex::list([x.clone(), y.clone()]);
        let b = Ex::list([y, x]);
        assert_ne!(a.hash_value(), b.hash_value());
    }
}
