//! Generic algorithms over the child-access protocol: mapping, polynomial
//! degree and coefficients, collection and differentiation.

use tracing::debug;

use crate::error::{Error, Result};
use crate::handle::Ex;
use crate::node::Kind;
use crate::{add, function, mul, ncmul, power};

impl Ex {
    /// Applies `f` to every direct child, rebuilds a node of the same variant
    /// and evaluates it. Atoms are returned as they are; a container without
    /// children is only evaluated.
    ///
    /// # Errors
    ///
    /// Propagates errors from `f` and from evaluation.
    pub fn map<F>(&self, mut f: F) -> Result<Ex>
    where
        F: FnMut(&Ex) -> Result<Ex>,
    {
        if self.kind().is_atom() {
            return Ok(self.clone());
        }
        let nops = self.nops();
        if nops == 0 {
            return self.eval();
        }
        let ops = (0..nops)
            .map(|i| f(&self.op(i)))
            .collect::<Result<Vec<_>>>()?;
        self.with_ops(ops).eval()
    }

    /// Highest power of `s`.
    ///
    /// # Errors
    ///
    /// [`Error::UndefinedDegree`] if `s` occurs under a non-integer power.
    pub fn degree(&self, s: &Ex) -> Result<i64> {
        self.degree_bound(s, false)
    }

    /// Lowest power of `s`.
    ///
    /// # Errors
    ///
    /// See [`Ex::degree`].
    pub fn ldegree(&self, s: &Ex) -> Result<i64> {
        self.degree_bound(s, true)
    }

    fn degree_bound(&self, s: &Ex, low: bool) -> Result<i64> {
        if self.is_equal(s) {
            return Ok(1);
        }
        match self.kind() {
            Kind::Add { terms, constant } => add::degree(terms, constant, s, low),
            Kind::Mul { factors, .. } => mul::degree(factors, s, low),
            Kind::Power { basis, exponent } => power::degree(basis, exponent, s, low),
            _ => Ok(0),
        }
    }

    /// Coefficient of `s^n`, for an expanded polynomial in `s`.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn coeff(&self, s: &Ex, n: i64) -> Result<Ex> {
        if self.is_equal(s) {
            return Ok(if n == 1 { Ex::one() } else { Ex::zero() });
        }
        match self.kind() {
            Kind::Add { terms, constant } => add::coeff(terms, constant, s, n),
            Kind::Mul { factors, coeff } => mul::coeff(factors, coeff, s, n),
            Kind::Power { basis, exponent } => Ok(power::coeff(self, basis, exponent, s, n)),
            _ => Ok(if n == 0 { self.clone() } else { Ex::zero() }),
        }
    }

    /// Regroups as a polynomial in `s`.
    ///
    /// `s` may be a list of symbols: with `distributed` the result is a sum
    /// over every joint power of them, otherwise the coefficients are
    /// collected recursively with the first symbol outermost. Terms that do
    /// not fit the polynomial shape are added back unchanged.
    ///
    /// # Errors
    ///
    /// Propagates degree and evaluation errors.
    pub fn collect(&self, s: &Ex, distributed: bool) -> Result<Ex> {
        let collected = match s.items() {
            Some([]) => return Ok(self.clone()),
            Some([single]) => return self.collect(single, false),
            Some(syms) if distributed => self.collect_distributed(syms)?,
            Some(syms) => {
                let mut x = self.clone();
                for sym in syms.iter().rev() {
                    x = x.collect(sym, false)?;
                }
                x
            }
            None => {
                let mut parts = Vec::new();
                for n in self.ldegree(s)?..=self.degree(s)? {
                    parts.push(Ex::mul([self.coeff(s, n)?, s.pow(n)]));
                }
                Ex::add(parts).eval()?
            }
        };
        let irregular = (self - &collected).expand()?;
        debug!(
            target: "ansatz::collect",
            terms = collected.nops(),
            irregular = !irregular.is_zero(),
            "collected"
        );
        (collected + irregular).eval()
    }

    fn collect_distributed(&self, syms: &[Ex]) -> Result<Ex> {
        let mut bounds = Vec::with_capacity(syms.len());
        for sym in syms {
            bounds.push((self.ldegree(sym)?, self.degree(sym)?));
        }
        let mut counters: Vec<i64> = bounds.iter().map(|&(low, _)| low).collect();

        // coeffs[i] is the coefficient once counters[..=i] are fixed
        let mut coeffs = Vec::with_capacity(syms.len());
        let mut c = self.clone();
        for (sym, &n) in syms.iter().zip(&counters) {
            c = c.coeff(sym, n)?;
            coeffs.push(c.clone());
        }

        let last = syms.len() - 1;
        let mut parts = Vec::new();
        'enumerate: loop {
            if !coeffs[last].is_zero() {
                let mut product: Vec<Ex> = syms
                    .iter()
                    .zip(&counters)
                    .map(|(sym, &n)| sym.pow(n))
                    .collect();
                product.push(coeffs[last].clone());
                parts.push(Ex::mul(product));
            }

            let mut n = syms.len();
            loop {
                if n == 0 {
                    break 'enumerate;
                }
                n -= 1;
                counters[n] += 1;
                if counters[n] <= bounds[n].1 {
                    break;
                }
                counters[n] = bounds[n].0;
            }

            let mut c = if n == 0 {
                self.clone()
            } else {
                coeffs[n - 1].clone()
            };
            for i in n..syms.len() {
                c = c.coeff(&syms[i], counters[i])?;
                coeffs[i] = c.clone();
            }
        }
        Ex::add(parts).eval()
    }

    /// The `nth` derivative by the symbol `s`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `s` is not a symbol.
    /// - Evaluation errors, e.g. a pole in an intermediate result.
    pub fn diff(&self, s: &Ex, nth: u32) -> Result<Ex> {
        if !s.is_symbol() {
            return Err(Error::InvalidArgument(format!(
                "can only differentiate by a symbol, got {s}"
            )));
        }
        if nth == 0 {
            return Ok(self.clone());
        }
        let mut d = self.eval()?;
        for _ in 0..nth {
            d = d.derivative(s)?.eval()?;
            if d.is_zero() {
                break;
            }
        }
        Ok(d)
    }

    /// One derivative by `s`, unevaluated.
    pub(crate) fn derivative(&self, s: &Ex) -> Result<Ex> {
        match self.kind() {
            Kind::Numeric(_) | Kind::Constant(_) | Kind::Wildcard(_) => Ok(Ex::zero()),
            Kind::Symbol(_) => Ok(if self.is_equal(s) { Ex::one() } else { Ex::zero() }),
            Kind::Add { terms, .. } => add::derivative(terms, s),
            Kind::Mul { factors, coeff } => mul::derivative(factors, coeff, s),
            Kind::Power { basis, exponent } => power::derivative(self, basis, exponent, s),
            Kind::NcMul(factors) => ncmul::derivative(factors, s),
            Kind::Function { func, args } => function::derivative(func, None, args, s),
            Kind::FDerivative { func, params, args } => {
                function::derivative(func, Some(params.as_slice()), args, s)
            }
            Kind::Relational { .. } | Kind::List(_) => self.map(|child| child.diff(s, 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeTag;

    fn square_of_sum(x: &Ex, y: &Ex) -> Ex {
        // (x + y + 1)^2, expanded
        Ex::add([
            x.pow(2),
            y.pow(2),
            Ex::mul([Ex::integer(2), x.clone(), y.clone()]),
            Ex::mul([Ex::integer(2), x.clone()]),
            Ex::mul([Ex::integer(2), y.clone()]),
            Ex::integer(1),
        ])
        .eval()
        .unwrap()
    }

    #[test]
    fn test_map() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let f = Ex::named("f", [x.clone(), y.clone()]);
        let g = f.map(|c| Ok(c.pow(2))).unwrap();
        assert_eq!(g, Ex::named("f", [x.pow(2), y.pow(2)]));
        assert!(g.is_evaluated());
        assert!(x.map(|_| Ok(Ex::zero())).unwrap().ptr_eq(&x));
    }

    #[test]
    fn test_default_degree_and_coeff() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let f = Ex::sin(x.clone());
        assert_eq!(x.degree(&x).unwrap(), 1);
        assert_eq!(y.degree(&x).unwrap(), 0);
        assert_eq!(f.degree(&x).unwrap(), 0);
        assert!(f.coeff(&x, 0).unwrap().ptr_eq(&f));
        assert!(f.coeff(&x, 1).unwrap().is_zero());
        assert!(x.coeff(&x, 1).unwrap().is_one());
    }

    #[test]
    fn test_collect_single_symbol() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let p = square_of_sum(&x, &y);
        let c = p.collect(&x, false).unwrap();
        let linear = (Ex::integer(2) * y.clone() + Ex::integer(2)).eval().unwrap();
        assert_eq!(c.coeff(&x, 1).unwrap(), linear);
        assert_eq!(c.expand().unwrap(), p);
    }

    #[test]
    fn test_collect_symbol_list() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let p = square_of_sum(&x, &y);
        let syms = Ex::list([x.clone(), y.clone()]);
        let recursive = p.collect(&syms, false).unwrap();
        let distributed = p.collect(&syms, true).unwrap();
        assert_eq!(recursive.expand().unwrap(), p);
        assert_eq!(distributed.expand().unwrap(), p);
        assert_eq!(distributed, p);
    }

    #[test]
    fn test_collect_keeps_irregular_terms() {
        let x = Ex::symbol("x");
        // x*sin(x) has degree one in x but its coefficient still contains x
        let e = (&x * &Ex::sin(x.clone()) + x.pow(2)).eval().unwrap();
        let c = e.collect(&x, false).unwrap();
        assert_eq!(c, e);
    }

    #[test]
    fn test_diff_rules() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        assert!(Ex::pi().diff(&x, 1).unwrap().is_zero());
        assert!(y.diff(&x, 1).unwrap().is_zero());
        assert!(x.diff(&x, 1).unwrap().is_one());
        let e = x.pow(3);
        assert!(e.diff(&x, 0).unwrap().ptr_eq(&e));
        assert!(e.diff(&x, 10).unwrap().is_zero());
        assert_eq!(e.diff(&x, 3).unwrap(), Ex::integer(6));
        assert!(matches!(
            e.diff(&x.pow(2), 1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_diff_maps_over_containers() {
        let x = Ex::symbol("x");
        let list = Ex::list([x.pow(2), Ex::integer(3)]);
        let d = list.diff(&x, 1).unwrap();
        assert_eq!(d.tag(), TypeTag::List);
        assert_eq!(d.op(0), Ex::mul([Ex::integer(2), x]).eval().unwrap());
        assert!(d.op(1).is_zero());
    }
}
