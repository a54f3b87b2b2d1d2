//! Structural pattern matching and substitution.
//!
//! A pattern is an ordinary expression that may contain wildcards. Matching
//! is purely structural: same variant, same non-child attributes, same
//! number of children, children matched in order against one shared set of
//! bindings. A wildcard seen twice must bind to equal expressions.

use tracing::trace;

use crate::error::{Error, Result};
use crate::handle::Ex;
use crate::node::{Kind, RelOp};

/// Wildcard bindings collected by a successful match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bindings(Vec<(Ex, Ex)>);

impl Bindings {
    /// Creates an empty set of bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The expression bound to `wildcard`.
    #[must_use]
    pub fn get(&self, wildcard: &Ex) -> Option<&Ex> {
        self.0
            .iter()
            .find(|(w, _)| w.is_equal(wildcard))
            .map(|(_, value)| value)
    }

    /// Number of bound wildcards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(wildcard, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = &(Ex, Ex)> {
        self.0.iter()
    }

    /// Substitutes the bindings into `target`, literally.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn apply(&self, target: &Ex) -> Result<Ex> {
        let (ls, lr): (Vec<Ex>, Vec<Ex>) = self.0.iter().cloned().unzip();
        target.subs(&ls, &lr, SubsMode::Literal)
    }
}

/// How `subs` treats its left-hand sides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubsMode {
    /// Replace nodes equal to a left-hand side.
    #[default]
    Literal,
    /// Treat left-hand sides as patterns and substitute their bindings
    /// into the replacement.
    Pattern,
}

/// Non-child attributes that must agree for two nodes to match.
fn same_attributes(a: &Kind, b: &Kind) -> bool {
    match (a, b) {
        (Kind::Function { func: f, .. }, Kind::Function { func: g, .. }) => f == g,
        (
            Kind::FDerivative {
                func: f, params: p, ..
            },
            Kind::FDerivative {
                func: g, params: q, ..
            },
        ) => f == g && p == q,
        (Kind::Relational { op: p, .. }, Kind::Relational { op: q, .. }) => p == q,
        _ => true,
    }
}

impl Ex {
    /// Matches this expression against `pattern`.
    ///
    /// Returns the wildcard bindings on success.
    #[must_use]
    pub fn match_pattern(&self, pattern: &Ex) -> Option<Bindings> {
        let mut bindings = Bindings::new();
        self.match_into(pattern, &mut bindings).then_some(bindings)
    }

    /// Matches against `pattern`, extending `bindings`.
    ///
    /// On failure `bindings` is left as it was.
    pub fn match_into(&self, pattern: &Ex, bindings: &mut Bindings) -> bool {
        let mark = bindings.len();
        let matched = self.match_step(pattern, bindings);
        if !matched {
            bindings.0.truncate(mark);
        }
        matched
    }

    fn match_step(&self, pattern: &Ex, bindings: &mut Bindings) -> bool {
        if let Kind::Wildcard(_) = pattern.kind() {
            if let Some(bound) = bindings.get(pattern) {
                return bound.is_equal(self);
            }
            bindings.0.push((pattern.clone(), self.clone()));
            return true;
        }
        if self.tag() != pattern.tag() || self.nops() != pattern.nops() {
            return false;
        }
        if self.nops() == 0 {
            return self.is_equal(pattern);
        }
        if !same_attributes(self.kind(), pattern.kind()) {
            return false;
        }
        (0..self.nops()).all(|i| self.op(i).match_step(&pattern.op(i), bindings))
    }

    /// Returns true if this expression or any subexpression matches
    /// `pattern`.
    #[must_use]
    pub fn has(&self, pattern: &Ex) -> bool {
        self.match_pattern(pattern).is_some() || (0..self.nops()).any(|i| self.op(i).has(pattern))
    }

    /// Substitutes `lr[i]` for `ls[i]` and evaluates the result.
    ///
    /// In [`SubsMode::Literal`] a node is replaced when it equals one of
    /// `ls`; otherwise its children are substituted. In
    /// [`SubsMode::Pattern`] the first `ls[i]` that matches a node wins and
    /// the bindings are substituted into `lr[i]`; children are only visited
    /// when nothing matches.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `ls` and `lr` differ in length.
    /// - Evaluation errors of the result.
    pub fn subs(&self, ls: &[Ex], lr: &[Ex], mode: SubsMode) -> Result<Ex> {
        if ls.len() != lr.len() {
            return Err(Error::InvalidArgument(format!(
                "subs needs as many replacements as targets, got {} and {}",
                ls.len(),
                lr.len()
            )));
        }
        self.replace(ls, lr, mode)?.eval()
    }

    /// Substitutes an equation `lhs == rhs` or a list of equations.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `eqs` is neither.
    pub fn subs_eq(&self, eqs: &Ex, mode: SubsMode) -> Result<Ex> {
        let equations: &[Ex] = match eqs.kind() {
            Kind::List(items) => items,
            Kind::Relational { .. } => std::slice::from_ref(eqs),
            _ => {
                return Err(Error::InvalidArgument(
                    "subs needs an equation or a list of equations".into(),
                ))
            }
        };
        let mut ls = Vec::with_capacity(equations.len());
        let mut lr = Vec::with_capacity(equations.len());
        for eq in equations {
            match eq.as_relational() {
                Some((lhs, rhs, RelOp::Eq)) => {
                    ls.push(lhs.clone());
                    lr.push(rhs.clone());
                }
                _ => {
                    return Err(Error::InvalidArgument(format!(
                        "subs needs equations, got {eq}"
                    )))
                }
            }
        }
        self.subs(&ls, &lr, mode)
    }

    /// Substitution without evaluation.
    fn replace(&self, ls: &[Ex], lr: &[Ex], mode: SubsMode) -> Result<Ex> {
        match mode {
            SubsMode::Literal => {
                if let Some(i) = ls.iter().position(|l| l.is_equal(self)) {
                    return Ok(lr[i].clone());
                }
            }
            SubsMode::Pattern => {
                for (l, r) in ls.iter().zip(lr) {
                    if let Some(bindings) = self.match_pattern(l) {
                        trace!(target: "ansatz::subs", pattern = %l, bound = bindings.len(), "pattern matched");
                        let (keys, values): (Vec<Ex>, Vec<Ex>) =
                            bindings.0.into_iter().unzip();
                        return r.replace(&keys, &values, SubsMode::Literal);
                    }
                }
            }
        }

        let nops = self.nops();
        if nops == 0 {
            return Ok(self.clone());
        }
        let mut ops = Vec::with_capacity(nops);
        let mut changed = false;
        for i in 0..nops {
            let child = self.op(i);
            let new = child.replace(ls, lr, mode)?;
            changed |= !new.ptr_eq(&child);
            ops.push(new);
        }
        if changed {
            Ok(self.with_ops(ops))
        } else {
            Ok(self.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_binds_anything() {
        let x = Ex::symbol("x");
        let w = Ex::wild(0);
        let e = Ex::sin(&x + &Ex::integer(1)).eval().unwrap();
        let b = e.match_pattern(&Ex::sin(w.clone())).unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(b.get(&w).unwrap(), &(&x + &Ex::integer(1)).eval().unwrap());
    }

    #[test]
    fn test_repeated_wildcard_must_agree() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let w = Ex::wild(0);
        let pattern = Ex::named("f", [w.clone(), w]);
        assert!(Ex::named("f", [x.clone(), x.clone()]).match_pattern(&pattern).is_some());
        assert!(Ex::named("f", [x, y]).match_pattern(&pattern).is_none());
    }

    #[test]
    fn test_attributes_must_agree() {
        let x = Ex::symbol("x");
        let w = Ex::wild(0);
        assert!(Ex::sin(x.clone()).match_pattern(&Ex::cos(w.clone())).is_none());
        assert!(Ex::named("f", [x.clone()]).match_pattern(&Ex::named("g", [w])).is_none());
        assert!(x.match_pattern(&Ex::symbol("x")).is_none());
    }

    #[test]
    fn test_failed_match_leaves_bindings() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let w0 = Ex::wild(0);
        let w1 = Ex::wild(1);
        let mut b = Bindings::new();
        assert!(x.match_into(&w0, &mut b));
        let pattern = Ex::named("f", [w1, Ex::integer(3)]);
        assert!(!Ex::named("f", [y, Ex::integer(4)]).match_into(&pattern, &mut b));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_soundness() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let e = Ex::named("f", [x.pow(2), Ex::sin(y)]).eval().unwrap();
        let pattern = Ex::named("f", [Ex::wild(0).pow(Ex::wild(1)), Ex::sin(Ex::wild(2))]);
        let b = e.match_pattern(&pattern).unwrap();
        assert_eq!(b.apply(&pattern).unwrap(), e);
    }

    #[test]
    fn test_has() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let e = (Ex::sin(x.clone()) + y.clone()).eval().unwrap();
        assert!(e.has(&x));
        assert!(e.has(&Ex::sin(Ex::wild(0))));
        assert!(!e.has(&Ex::cos(Ex::wild(0))));
    }

    #[test]
    fn test_literal_subs() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let e = (&x.pow(2) + &y).eval().unwrap();
        let r = e.subs(&[x.clone()], &[Ex::integer(3)], SubsMode::Literal).unwrap();
        assert_eq!(r, (&y + &Ex::integer(9)).eval().unwrap());

        let untouched = e.subs(&[Ex::symbol("z")], &[Ex::integer(0)], SubsMode::Literal).unwrap();
        assert!(untouched.ptr_eq(&e));
    }

    #[test]
    fn test_pattern_subs() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let w = Ex::wild(0);
        let e = (Ex::sin(x.clone()) + Ex::sin(y.clone())).eval().unwrap();
        let r = e
            .subs(&[Ex::sin(w.clone())], &[Ex::cos(w)], SubsMode::Pattern)
            .unwrap();
        assert_eq!(r, (Ex::cos(x) + Ex::cos(y)).eval().unwrap());
    }

    #[test]
    fn test_pattern_subs_checks_node_first() {
        let x = Ex::symbol("x");
        let w = Ex::wild(0);
        // f(f(x)) -> g(f(x)): the outer node matches, its children are not visited
        let e = Ex::named("f", [Ex::named("f", [x.clone()])]);
        let r = e
            .subs(&[Ex::named("f", [w.clone()])], &[Ex::named("g", [w])], SubsMode::Pattern)
            .unwrap();
        assert_eq!(r, Ex::named("g", [Ex::named("f", [x])]));
    }

    #[test]
    fn test_subs_argument_errors() {
        let x = Ex::symbol("x");
        assert!(matches!(
            x.subs(&[x.clone()], &[], SubsMode::Literal),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            x.subs_eq(&Ex::integer(1), SubsMode::Literal),
            Err(Error::InvalidArgument(_))
        ));
        let not_eq = Ex::list([Ex::relation(x.clone(), Ex::integer(1), RelOp::Lt)]);
        assert!(matches!(
            x.subs_eq(&not_eq, SubsMode::Literal),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_subs_equation_list() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let eqs = Ex::list([
            Ex::equation(x.clone(), Ex::integer(1)),
            Ex::equation(y.clone(), Ex::integer(2)),
        ]);
        let r = (&x * &y + x.clone()).subs_eq(&eqs, SubsMode::Literal).unwrap();
        assert_eq!(r, Ex::integer(3));
    }
}
