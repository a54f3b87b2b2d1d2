//! Expansion: multiplying out products and integer powers of sums.

use num_traits::One;

use ansatz_numeric::{Integer, Numeric};

use crate::error::Result;
use crate::handle::Ex;
use crate::node::{status_flags, Kind};

/// Options for [`Ex::expand_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Also expand the arguments of functions.
    pub function_args: bool,
}

impl ExpandOptions {
    /// Expands function arguments too.
    #[must_use]
    pub fn with_function_args(mut self) -> Self {
        self.function_args = true;
        self
    }
}

impl Ex {
    /// Expands with default options and marks the result expanded.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn expand(&self) -> Result<Ex> {
        self.expand_with(ExpandOptions::default())
    }

    /// Multiplies out products of sums and positive integer powers of sums,
    /// and splits powers with a sum as exponent.
    ///
    /// Only results of default options are flagged as expanded.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn expand_with(&self, options: ExpandOptions) -> Result<Ex> {
        let plain = options == ExpandOptions::default();
        if plain && self.is_expanded() {
            return Ok(self.clone());
        }
        let expanded = match self.kind() {
            Kind::Numeric(_) | Kind::Symbol(_) | Kind::Constant(_) | Kind::Wildcard(_) => {
                return Ok(self.clone());
            }
            Kind::Mul { .. } => {
                let factors = self
                    .ops()
                    .iter()
                    .map(|f| f.expand_with(options))
                    .collect::<Result<Vec<_>>>()?;
                distribute(factors, options)?
            }
            Kind::Power { basis, exponent } => expand_power(self, basis, exponent, options)?,
            Kind::NcMul(factors) => {
                let factors = factors
                    .iter()
                    .map(|f| f.expand_with(options))
                    .collect::<Result<Vec<_>>>()?;
                distribute_ordered(&factors)?
            }
            Kind::Function { .. } | Kind::FDerivative { .. } if !options.function_args => {
                self.eval()?
            }
            _ => self.map(|child| child.expand_with(options))?,
        };
        if plain {
            expanded.set_flag(status_flags::EXPANDED);
        }
        Ok(expanded)
    }
}

/// The summands of an expanded expression.
fn summands(e: &Ex) -> Vec<Ex> {
    match e.kind() {
        Kind::Add { .. } => e.ops(),
        _ => vec![e.clone()],
    }
}

/// Returns true if evaluating a product left a sum standing as a factor.
fn has_sum_factor(e: &Ex) -> bool {
    match e.kind() {
        Kind::Add { .. } => true,
        Kind::Mul { factors, .. } => factors
            .iter()
            .any(|(basis, exponent)| matches!(basis.kind(), Kind::Add { .. }) && exponent.is_one()),
        _ => false,
    }
}

fn finish_product(product: Ex, options: ExpandOptions) -> Result<Ex> {
    let product = product.eval()?;
    if has_sum_factor(&product) {
        product.expand_with(options)
    } else {
        Ok(product)
    }
}

/// Multiplies out a product of expanded factors.
fn distribute(factors: Vec<Ex>, options: ExpandOptions) -> Result<Ex> {
    let mut partial = vec![Ex::one()];
    for factor in factors {
        let terms = summands(&factor);
        let mut next = Vec::with_capacity(partial.len() * terms.len());
        for p in &partial {
            for t in &terms {
                next.push(finish_product(Ex::mul([p.clone(), t.clone()]), options)?);
            }
        }
        partial = next;
    }
    Ex::add(partial).eval()
}

/// Multiplies out an ordered product, keeping factor order in every term.
fn distribute_ordered(factors: &[Ex]) -> Result<Ex> {
    let mut partial: Vec<Vec<Ex>> = vec![Vec::new()];
    for factor in factors {
        let terms = summands(factor);
        let mut next = Vec::with_capacity(partial.len() * terms.len());
        for p in &partial {
            for t in &terms {
                let mut seq = p.clone();
                seq.push(t.clone());
                next.push(seq);
            }
        }
        partial = next;
    }
    let products = partial
        .into_iter()
        .map(|seq| Ex::ncmul(seq).eval())
        .collect::<Result<Vec<_>>>()?;
    Ex::add(products).eval()
}

fn expand_power(power: &Ex, basis: &Ex, exponent: &Ex, options: ExpandOptions) -> Result<Ex> {
    let b = basis.expand_with(options)?;
    let e = exponent.expand_with(options)?;

    // x^(a+b) -> x^a * x^b
    if let Kind::Add { .. } = e.kind() {
        let factors: Vec<Ex> = e.ops().into_iter().map(|t| Ex::power(b.clone(), t)).collect();
        return Ex::mul(factors).eval()?.expand_with(options);
    }

    if let Some(n) = e.as_numeric().filter(|n| n.is_integer()).and_then(Numeric::to_i64) {
        if let Kind::Add { .. } = b.kind() {
            if let Ok(k) = u32::try_from(n.unsigned_abs()) {
                let sum = multinomial(&b, k, options)?;
                return if n > 0 {
                    Ok(sum)
                } else {
                    Ex::power(sum, Ex::minus_one()).eval()
                };
            }
        }
    }

    if b.ptr_eq(basis) && e.ptr_eq(exponent) {
        return power.eval();
    }
    let rebuilt = Ex::power(b, e).eval()?;
    if matches!(rebuilt.kind(), Kind::Power { .. }) {
        Ok(rebuilt)
    } else {
        rebuilt.expand_with(options)
    }
}

/// `(t_1 + ... + t_m)^n` by the multinomial theorem.
fn multinomial(sum: &Ex, n: u32, options: ExpandOptions) -> Result<Ex> {
    let terms = sum.ops();
    let mut parts = Vec::new();
    let mut counts = vec![0u32; terms.len()];
    compositions(n, 0, &mut counts, &mut |counts| {
        let mut product = Vec::with_capacity(counts.len() + 1);
        let mut remaining = n;
        let mut coeff = Integer::one();
        for (term, &k) in terms.iter().zip(counts) {
            coeff = coeff * binomial(remaining, k);
            remaining -= k;
            if k > 0 {
                product.push(term.pow(i64::from(k)));
            }
        }
        product.push(Ex::num(coeff));
        parts.push(finish_product(Ex::mul(product), options)?);
        Ok(())
    })?;
    Ex::add(parts).eval()
}

/// Visits every way of writing `n` as an ordered sum of `counts.len()`
/// nonnegative parts.
fn compositions<F>(n: u32, index: usize, counts: &mut [u32], visit: &mut F) -> Result<()>
where
    F: FnMut(&[u32]) -> Result<()>,
{
    if index + 1 == counts.len() {
        counts[index] = n;
        return visit(counts);
    }
    for k in 0..=n {
        counts[index] = k;
        compositions(n - k, index + 1, counts, visit)?;
    }
    Ok(())
}

fn binomial(n: u32, k: u32) -> Integer {
    let mut result = Integer::one();
    for j in 0..k {
        result = result * Integer::from(i64::from(n - j)) / Integer::from(i64::from(j + 1));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeTag;

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(5, 2), Integer::from(10));
        assert_eq!(binomial(7, 0), Integer::from(1));
        assert_eq!(binomial(40, 20), Integer::from(137_846_528_820i64));
    }

    #[test]
    fn test_product_of_sums() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        // (x + 1)*(y - 1) = x*y - x + y - 1
        let e = ((&x + &Ex::integer(1)) * (&y - &Ex::integer(1))).expand().unwrap();
        let expected = Ex::add([
            &x * &y,
            -&x,
            y.clone(),
            Ex::integer(-1),
        ])
        .eval()
        .unwrap();
        assert_eq!(e, expected);
        assert!(e.is_expanded());
    }

    #[test]
    fn test_difference_of_squares() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let e = ((&x + &y) * (&x - &y)).expand().unwrap();
        assert_eq!(e, (x.pow(2) - y.pow(2)).eval().unwrap());
    }

    #[test]
    fn test_multinomial() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let e = (&x + &y + Ex::integer(1)).pow(2).expand().unwrap();
        let expected = Ex::add([
            x.pow(2),
            y.pow(2),
            Ex::mul([Ex::integer(2), x.clone(), y.clone()]),
            Ex::mul([Ex::integer(2), x.clone()]),
            Ex::mul([Ex::integer(2), y.clone()]),
            Ex::integer(1),
        ])
        .eval()
        .unwrap();
        assert_eq!(e, expected);

        let cube = (&x + &Ex::integer(1)).pow(3).expand().unwrap();
        assert_eq!(cube.coeff(&x, 2).unwrap(), Ex::integer(3));
        assert_eq!(cube.nops(), 4);
    }

    #[test]
    fn test_scaled_terms_in_powers() {
        let x = Ex::symbol("x");
        // (2*x - 1)^2 = 4*x^2 - 4*x + 1
        let e = (Ex::integer(2) * x.clone() - Ex::integer(1)).pow(2).expand().unwrap();
        assert_eq!(e.coeff(&x, 2).unwrap(), Ex::integer(4));
        assert_eq!(e.coeff(&x, 1).unwrap(), Ex::integer(-4));
        assert_eq!(e.coeff(&x, 0).unwrap(), Ex::integer(1));
    }

    #[test]
    fn test_negative_power_of_sum() {
        let x = Ex::symbol("x");
        let e = (&x + &Ex::integer(1)).pow(-2).expand().unwrap();
        assert_eq!(e.tag(), TypeTag::Power);
        let denominator = (&x + &Ex::integer(1)).pow(2).expand().unwrap();
        assert_eq!(e, denominator.pow(-1).eval().unwrap());
    }

    #[test]
    fn test_sum_exponent_splits() {
        let x = Ex::symbol("x");
        let a = Ex::symbol("a");
        // x^(a + 2) -> x^2 * x^a
        let e = x.pow(&a + &Ex::integer(2)).expand().unwrap();
        assert_eq!(e.tag(), TypeTag::Mul);
        assert_eq!(e, Ex::mul([x.pow(2), x.pow(a)]).eval().unwrap());
    }

    #[test]
    fn test_function_arguments() {
        let x = Ex::symbol("x");
        let arg = (&x + &Ex::integer(1)).pow(2);
        let f = Ex::sin(arg.clone());
        let kept = f.expand().unwrap();
        assert_eq!(kept.op(0), arg.eval().unwrap());
        let opened = f.expand_with(ExpandOptions::default().with_function_args()).unwrap();
        assert_eq!(opened.op(0), arg.expand().unwrap());
        assert!(!opened.is_expanded());
    }

    #[test]
    fn test_noncommutative_expansion_keeps_order() {
        let a = Ex::nc_symbol("A");
        let b = Ex::nc_symbol("B");
        let e = Ex::ncmul([&a + &b, &a + &b]).expand().unwrap();
        let expected = Ex::add([
            Ex::ncmul([a.clone(), a.clone()]),
            Ex::ncmul([a.clone(), b.clone()]),
            Ex::ncmul([b.clone(), a.clone()]),
            Ex::ncmul([b.clone(), b.clone()]),
        ])
        .eval()
        .unwrap();
        assert_eq!(e, expected);
        assert_eq!(e.nops(), 4);
    }

    #[test]
    fn test_vanishing_sum_expands_to_zero() {
        let x = Ex::symbol("x");
        let raw = Ex::add([Ex::integer(2), Ex::integer(-2)]);
        assert_eq!(raw.nops(), 0);
        assert_eq!(raw.expand().unwrap(), Ex::zero());
        assert_eq!(raw.map(|c| Ok(c.clone())).unwrap(), Ex::zero());

        let d = Ex::zero().diff(&x, 1).unwrap() + Ex::zero().diff(&x, 1).unwrap();
        assert_eq!(d.expand().unwrap(), Ex::zero());
    }

    #[test]
    fn test_expanded_flag_short_circuits() {
        let x = Ex::symbol("x");
        let e = ((&x + &Ex::integer(1)) * x.clone()).expand().unwrap();
        assert!(e.expand().unwrap().ptr_eq(&e));
    }
}
