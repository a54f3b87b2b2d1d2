//! Relations between two expressions.

use num_traits::Zero;

use crate::config::Budget;
use crate::error::Result;
use crate::eval::{eval_child, Mode, Rewrite};
use crate::handle::Ex;
use crate::node::{Kind, RelOp};

pub(crate) fn eval(lhs: &Ex, rhs: &Ex, op: RelOp, mode: Mode, budget: Budget) -> Result<Rewrite> {
    let l = eval_child(lhs, mode, budget)?;
    let r = eval_child(rhs, mode, budget)?;
    if l.ptr_eq(lhs) && r.ptr_eq(rhs) {
        Ok(Rewrite::Keep)
    } else {
        Ok(Rewrite::Hold(Kind::Relational { lhs: l, rhs: r, op }))
    }
}

impl Ex {
    /// Left-hand side of a relation.
    #[must_use]
    pub fn lhs(&self) -> Option<&Ex> {
        self.as_relational().map(|(lhs, _, _)| lhs)
    }

    /// Right-hand side of a relation.
    #[must_use]
    pub fn rhs(&self) -> Option<&Ex> {
        self.as_relational().map(|(_, rhs, _)| rhs)
    }

    /// Decides a relation whose sides differ by a real number.
    ///
    /// Returns `None` when the difference is not numeric, or when an
    /// ordering is asked of a complex difference.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors of `lhs - rhs`.
    pub fn decide(&self) -> Result<Option<bool>> {
        let Some((lhs, rhs, op)) = self.as_relational() else {
            return Ok(None);
        };
        let diff = (lhs - rhs).eval()?;
        let Some(d) = diff.as_numeric() else {
            return Ok(None);
        };
        let answer = match op {
            RelOp::Eq => Some(d.is_zero()),
            RelOp::Ne => Some(!d.is_zero()),
            _ if !d.is_real() => None,
            RelOp::Lt => Some(d.is_negative()),
            RelOp::Le => Some(!d.is_positive()),
            RelOp::Gt => Some(d.is_positive()),
            RelOp::Ge => Some(!d.is_negative()),
        };
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sides_are_evaluated() {
        let x = Ex::symbol("x");
        let eq = Ex::equation(&x + &x, Ex::integer(1)).eval().unwrap();
        assert_eq!(eq.lhs().unwrap(), &Ex::mul([Ex::integer(2), x]).eval().unwrap());
        assert!(eq.rhs().unwrap().is_one());
        assert_eq!(Ex::integer(1).lhs(), None);
    }

    #[test]
    fn test_decide() {
        let x = Ex::symbol("x");
        let two = Ex::integer(2);
        let three = Ex::integer(3);
        assert_eq!(Ex::relation(two.clone(), three.clone(), RelOp::Lt).decide(), Ok(Some(true)));
        assert_eq!(Ex::relation(two.clone(), three.clone(), RelOp::Ge).decide(), Ok(Some(false)));
        assert_eq!(Ex::equation(&x + &two, &two + &x).decide(), Ok(Some(true)));
        assert_eq!(Ex::equation(x, two).decide(), Ok(None));
        let i = Ex::num(ansatz_numeric::Numeric::i());
        assert_eq!(Ex::relation(i, three, RelOp::Lt).decide(), Ok(None));
    }
}
