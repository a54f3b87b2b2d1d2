//! The bottom-up rewrite engine.
//!
//! `eval` evaluates the children of a node first, then runs the rules of the
//! node's variant against them. Every node entered consumes one level of the
//! [`Budget`]. An evaluated node is returned unchanged, which makes
//! re-evaluation free.

use rayon::prelude::*;
use tracing::trace;

use crate::config::{Budget, EvalConfig};
use crate::error::Result;
use crate::handle::Ex;
use crate::node::{status_flags, Kind};
use crate::{add, function, lst, mul, ncmul, power, relational};

/// Whether children are evaluated before a node's own rules run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Deep,
    Shallow,
}

/// Outcome of running a variant's rules.
pub(crate) enum Rewrite {
    /// Children unchanged and no rule applies.
    Keep,
    /// No rule applies; rebuild from the new children.
    Hold(Kind),
    /// A rule fired; the replacement still needs evaluation.
    Eval(Ex),
    /// A rule fired and produced a final value.
    Done(Ex),
}

pub(crate) fn fired(rule: &'static str) {
    trace!(target: "ansatz::eval", rule, "rule fired");
}

/// Evaluates `children` in order, on the rayon pool once there are enough
/// of them. Returns the results and whether any child changed.
pub(crate) fn eval_children(children: &[Ex], mode: Mode, budget: Budget) -> Result<(Vec<Ex>, bool)> {
    if mode == Mode::Shallow {
        return Ok((children.to_vec(), false));
    }
    let evaluated: Vec<Ex> = if children.len() >= budget.parallel_threshold() {
        children
            .par_iter()
            .map(|child| child.eval_in(budget))
            .collect::<Result<_>>()?
    } else {
        children
            .iter()
            .map(|child| child.eval_in(budget))
            .collect::<Result<_>>()?
    };
    let changed = evaluated
        .iter()
        .zip(children)
        .any(|(new, old)| !new.ptr_eq(old));
    Ok((evaluated, changed))
}

pub(crate) fn eval_child(child: &Ex, mode: Mode, budget: Budget) -> Result<Ex> {
    match mode {
        Mode::Deep => child.eval_in(budget),
        Mode::Shallow => Ok(child.clone()),
    }
}

impl Ex {
    /// Evaluates to canonical form with the default configuration.
    ///
    /// # Errors
    ///
    /// Propagates domain and pole errors from the rules, and
    /// [`Error::RecursionLimit`](crate::Error::RecursionLimit) when the
    /// expression nests deeper than the configured budget.
    pub fn eval(&self) -> Result<Ex> {
        self.eval_with(&EvalConfig::default())
    }

    /// Evaluates to canonical form.
    ///
    /// # Errors
    ///
    /// See [`Ex::eval`].
    pub fn eval_with(&self, config: &EvalConfig) -> Result<Ex> {
        self.eval_in(Budget::new(config))
    }

    /// Runs only this node's own rules against its children as they are.
    ///
    /// The result is not marked evaluated.
    ///
    /// # Errors
    ///
    /// See [`Ex::eval`].
    pub fn eval_shallow(&self) -> Result<Ex> {
        if self.is_evaluated() {
            return Ok(self.clone());
        }
        let budget = Budget::default();
        let rewrite = self.rules(Mode::Shallow, budget)?;
        self.finish(rewrite, Mode::Shallow, budget)
    }

    pub(crate) fn eval_in(&self, budget: Budget) -> Result<Ex> {
        if self.is_evaluated() {
            return Ok(self.clone());
        }
        let inner = budget.descend()?;
        let rewrite = self.rules(Mode::Deep, inner)?;
        self.finish(rewrite, Mode::Deep, inner)
    }

    fn rules(&self, mode: Mode, budget: Budget) -> Result<Rewrite> {
        match self.kind() {
            Kind::Numeric(_) | Kind::Symbol(_) | Kind::Constant(_) | Kind::Wildcard(_) => {
                Ok(Rewrite::Keep)
            }
            Kind::Add { terms, constant } => add::eval(terms, constant, mode, budget),
            Kind::Mul { factors, coeff } => mul::eval(factors, coeff, mode, budget),
            Kind::Power { basis, exponent } => power::eval(basis, exponent, mode, budget),
            Kind::NcMul(factors) => ncmul::eval(factors, mode, budget),
            Kind::Function { func, args } => function::eval(func, args, mode, budget),
            Kind::FDerivative { func, params, args } => {
                function::eval_fderivative(func, params, args, mode, budget)
            }
            Kind::Relational { lhs, rhs, op } => relational::eval(lhs, rhs, *op, mode, budget),
            Kind::List(items) => lst::eval(items, mode, budget),
        }
    }

    fn finish(&self, rewrite: Rewrite, mode: Mode, budget: Budget) -> Result<Ex> {
        let deep = mode == Mode::Deep;
        match rewrite {
            Rewrite::Keep => {
                if deep {
                    self.set_flag(status_flags::EVALUATED);
                }
                Ok(self.clone())
            }
            Rewrite::Hold(kind) => {
                let flags = if deep { status_flags::EVALUATED } else { 0 };
                Ok(Ex::with_flags(kind, flags))
            }
            Rewrite::Eval(ex) => {
                if deep {
                    ex.eval_in(budget)
                } else {
                    Ok(ex)
                }
            }
            Rewrite::Done(ex) => Ok(ex),
        }
    }

    /// Numerically evaluates with the default configuration: exact numbers
    /// and constants become approximate, functions of approximate arguments
    /// are computed. Exact numeric exponents are kept exact.
    ///
    /// # Errors
    ///
    /// See [`Ex::eval`].
    pub fn evalf(&self) -> Result<Ex> {
        self.evalf_with(&EvalConfig::default())
    }

    /// Numerically evaluates. See [`Ex::evalf`].
    ///
    /// # Errors
    ///
    /// See [`Ex::eval`].
    pub fn evalf_with(&self, config: &EvalConfig) -> Result<Ex> {
        self.evalf_in(Budget::new(config))
    }

    pub(crate) fn evalf_in(&self, budget: Budget) -> Result<Ex> {
        let inner = budget.descend()?;
        match self.kind() {
            Kind::Numeric(n) => Ok(if n.is_exact() {
                Ex::num(n.evalf())
            } else {
                self.clone()
            }),
            Kind::Constant(c) => Ok(Ex::num(c.value())),
            Kind::Symbol(_) | Kind::Wildcard(_) => Ok(self.clone()),
            Kind::Power { basis, exponent } => {
                let basis = basis.evalf_in(inner)?;
                let exponent = if exponent.is_numeric() {
                    exponent.clone()
                } else {
                    exponent.evalf_in(inner)?
                };
                Ex::power(basis, exponent).eval_in(inner)
            }
            _ => {
                let ops = self
                    .ops()
                    .iter()
                    .map(|child| child.evalf_in(inner))
                    .collect::<Result<Vec<_>>>()?;
                self.with_ops(ops).eval_in(inner)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use ansatz_numeric::Numeric;

    #[test]
    fn test_evaluated_node_is_returned_unchanged() {
        let x = Ex::symbol("x");
        let e = (&x + &x).eval().unwrap();
        assert!(e.is_evaluated());
        assert!(e.eval().unwrap().ptr_eq(&e));
    }

    #[test]
    fn test_hold_marks_same_node() {
        let x = Ex::symbol("x");
        let f = Ex::named("f", [x]);
        let e = f.eval().unwrap();
        assert!(e.ptr_eq(&f));
        assert!(f.is_evaluated());
    }

    #[test]
    fn test_recursion_limit() {
        let mut e = Ex::symbol("x");
        for _ in 0..20 {
            e = Ex::named("f", [e]);
        }
        let config = EvalConfig::new().with_max_depth(10);
        assert_eq!(e.eval_with(&config), Err(Error::RecursionLimit { limit: 10 }));
        assert!(e.eval().is_ok());
    }

    #[test]
    fn test_parallel_children_keep_order() {
        let xs: Vec<Ex> = (0..40).map(|i| Ex::symbol(&format!("x{i}"))).collect();
        let items: Vec<Ex> = xs.iter().map(|x| x + &Ex::integer(0)).collect();
        let config = EvalConfig::new().with_parallel_threshold(4);
        let list = Ex::list(items).eval_with(&config).unwrap();
        for (i, x) in xs.iter().enumerate() {
            assert!(list.op(i).ptr_eq(x));
        }
    }

    #[test]
    fn test_shallow_does_not_touch_children() {
        let x = Ex::symbol("x");
        let inner = &x + &Ex::integer(0);
        let outer = Ex::named("f", [inner.clone()]);
        let shallow = outer.eval_shallow().unwrap();
        assert!(!shallow.is_evaluated());
        assert!(shallow.op(0).ptr_eq(&inner));
    }

    #[test]
    fn test_evalf() {
        let x = Ex::symbol("x");
        let e = (Ex::pi() * x.pow(2) + Ex::rational(1, 2)).evalf().unwrap();
        // 0.5 + 3.14...*x^2, exponent stays exact
        let expected = (Ex::num(std::f64::consts::PI) * x.pow(2) + Ex::num(0.5))
            .eval()
            .unwrap();
        assert_eq!(e, expected);

        let s = Ex::sin(Ex::integer(1)).evalf().unwrap();
        assert_eq!(s.as_numeric(), Some(&Numeric::approx(1f64.sin())));
    }
}
