//! Noncommutative products.
//!
//! Factor order is significant. Commutative operands are pulled out into a
//! commutative prefix; the remaining noncommutative factors keep their
//! relative order.

use crate::config::Budget;
use crate::error::Result;
use crate::eval::{eval_children, fired, Mode, Rewrite};
use crate::handle::{recombine_factor, Ex};
use crate::node::{status_flags, Kind};

pub(crate) fn eval(factors: &[Ex], mode: Mode, budget: Budget) -> Result<Rewrite> {
    let (operands, changed) = eval_children(factors, mode, budget)?;

    let mut comm = Vec::new();
    let mut nc = Vec::with_capacity(operands.len());
    let mut reshaped = false;
    for op in operands {
        reshaped |= split(op, &mut comm, &mut nc);
    }

    match nc.len() {
        0 | 1 => {
            fired("ncmul-commutative");
            comm.extend(nc);
            Ok(Rewrite::Eval(Ex::mul(comm)))
        }
        _ if comm.is_empty() => {
            if changed || reshaped {
                Ok(Rewrite::Hold(Kind::NcMul(nc.into_iter().collect())))
            } else {
                Ok(Rewrite::Keep)
            }
        }
        _ => {
            fired("ncmul-split-commutative");
            let flags = if mode == Mode::Deep {
                status_flags::EVALUATED
            } else {
                0
            };
            comm.push(Ex::with_flags(Kind::NcMul(nc.into_iter().collect()), flags));
            Ok(Rewrite::Eval(Ex::mul(comm)))
        }
    }
}

/// Sorts one operand into the commutative prefix or the ordered factors.
/// Returns true if the operand was taken apart.
fn split(op: Ex, comm: &mut Vec<Ex>, nc: &mut Vec<Ex>) -> bool {
    match op.kind() {
        Kind::NcMul(inner) => {
            for item in inner {
                split(item.clone(), comm, nc);
            }
            true
        }
        Kind::Mul { factors, coeff } if !op.is_commutative() => {
            comm.push(Ex::num(coeff.clone()));
            let evaluated = op.is_evaluated();
            for (basis, exponent) in factors {
                split(recombine_factor(basis, exponent, evaluated), comm, nc);
            }
            true
        }
        _ if op.is_commutative() => {
            comm.push(op);
            true
        }
        _ => {
            nc.push(op);
            false
        }
    }
}

/// Ordered product rule.
pub(crate) fn derivative(factors: &[Ex], s: &Ex) -> Result<Ex> {
    let mut terms = Vec::with_capacity(factors.len());
    for (i, factor) in factors.iter().enumerate() {
        let d = factor.derivative(s)?;
        if d.is_zero() {
            continue;
        }
        let mut product = factors.to_vec();
        product[i] = d;
        terms.push(Ex::ncmul(product));
    }
    Ok(Ex::add(terms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeTag;

    #[test]
    fn test_order_is_kept() {
        let a = Ex::nc_symbol("A");
        let b = Ex::nc_symbol("B");
        let ab = Ex::ncmul([a.clone(), b.clone()]).eval().unwrap();
        assert_eq!(ab.tag(), TypeTag::NcMul);
        assert!(ab.op(0).ptr_eq(&a));
        assert!(ab.op(1).ptr_eq(&b));
        assert_ne!(ab, Ex::ncmul([b, a]).eval().unwrap());
    }

    #[test]
    fn test_commutative_prefix() {
        let a = Ex::nc_symbol("A");
        let b = Ex::nc_symbol("B");
        let x = Ex::symbol("x");
        let e = Ex::ncmul([a.clone(), x.clone(), b.clone(), Ex::integer(2)])
            .eval()
            .unwrap();
        assert_eq!(e.tag(), TypeTag::Mul);
        let expected = Ex::ncmul([Ex::integer(2), x, a, b]).eval().unwrap();
        assert_eq!(e, expected);
    }

    #[test]
    fn test_flattens_nested_products() {
        let a = Ex::nc_symbol("A");
        let b = Ex::nc_symbol("B");
        let c = Ex::nc_symbol("C");
        let nested = Ex::ncmul([Ex::ncmul([a.clone(), b.clone()]), c.clone()])
            .eval()
            .unwrap();
        assert_eq!(nested.nops(), 3);
        assert_eq!(nested, Ex::ncmul([a, b, c]).eval().unwrap());
    }

    #[test]
    fn test_single_noncommutative_factor() {
        let a = Ex::nc_symbol("A");
        let x = Ex::symbol("x");
        let e = Ex::ncmul([x.clone(), a.clone()]).eval().unwrap();
        assert_eq!(e.tag(), TypeTag::Mul);
        assert!(Ex::ncmul([a.clone()]).eval().unwrap().ptr_eq(&a));
        assert!(Ex::ncmul(Vec::new()).eval().unwrap().is_one());
    }

    #[test]
    fn test_ordered_product_rule() {
        let a = Ex::nc_symbol("A");
        let b = Ex::nc_symbol("B");
        let x = Ex::symbol("x");
        // d/dx A*(A + x*B) = A*B
        let e = Ex::ncmul([a.clone(), &a + &(&x * &b)]);
        let d = e.diff(&x, 1).unwrap();
        assert_eq!(d, Ex::ncmul([a, b]).eval().unwrap());
    }
}
