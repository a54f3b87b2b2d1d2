//! Commutative products: canonicalization, degree, coefficients and the
//! product rule.

use num_traits::{One, Zero};

use ansatz_numeric::Numeric;

use crate::config::Budget;
use crate::error::{Error, Result};
use crate::eval::{eval_children, fired, Mode, Rewrite};
use crate::handle::{recombine_factor, Ex};
use crate::node::{Factors, Kind, Terms};

pub(crate) fn eval(factors: &Factors, coeff: &Numeric, mode: Mode, budget: Budget) -> Result<Rewrite> {
    let children: Vec<Ex> = factors
        .iter()
        .map(|(basis, exponent)| recombine_factor(basis, exponent, false))
        .collect();
    let (mut operands, _) = eval_children(&children, mode, budget)?;

    if operands.iter().filter(|op| !op.is_commutative()).count() >= 2 {
        fired("mul-noncommutative");
        operands.push(Ex::num(coeff.clone()));
        return Ok(Rewrite::Eval(Ex::ncmul(operands)));
    }
    canonicalize(operands, coeff.clone(), mode, budget)
}

fn canonicalize(operands: Vec<Ex>, coeff: Numeric, mode: Mode, budget: Budget) -> Result<Rewrite> {
    let mut coeff = coeff;
    let mut pairs = Vec::with_capacity(operands.len());
    for op in operands {
        split_operand(op, &mut coeff, &mut pairs);
    }

    // Merging x^a * x^b can produce new factors (2^(1/2) * 2^(1/2) -> 2),
    // so repeat until no two bases are equal. Only numeric exponents are
    // split off, so x^a * x^b with symbolic a, b is left alone.
    loop {
        pairs.sort_by(|a: &(Ex, Ex), b: &(Ex, Ex)| {
            a.0.compare(&b.0).then_with(|| a.1.compare(&b.1))
        });
        let mut kept = Vec::with_capacity(pairs.len());
        let mut merged = Vec::new();
        let mut iter = pairs.into_iter().peekable();
        while let Some((basis, exponent)) = iter.next() {
            let mut exponents = vec![exponent];
            while let Some((_, e)) = iter.next_if(|(b, _)| b.is_equal(&basis)) {
                exponents.push(e);
            }
            if exponents.len() == 1 {
                kept.push((basis, exponents.remove(0)));
                continue;
            }
            fired("mul-merge-bases");
            let sum = Ex::add(exponents).eval_in(budget)?;
            merged.push(Ex::power(basis, sum).eval_in(budget)?);
        }
        pairs = kept;
        if merged.is_empty() {
            break;
        }
        for m in merged {
            split_operand(m, &mut coeff, &mut pairs);
        }
    }

    if coeff.is_zero() {
        fired("mul-zero");
        return Ok(Rewrite::Done(Ex::num(coeff)));
    }
    if pairs.is_empty() {
        fired("mul-numeric");
        return Ok(Rewrite::Done(Ex::num(coeff)));
    }
    if pairs.len() == 1 {
        if coeff.is_one() {
            fired("mul-single-factor");
            let (basis, exponent) = pairs.remove(0);
            return Ok(Rewrite::Done(recombine_factor(
                &basis,
                &exponent,
                mode == Mode::Deep,
            )));
        }
        if let (Kind::Add { terms, constant }, true) = (pairs[0].0.kind(), pairs[0].1.is_one()) {
            fired("mul-distribute-coefficient");
            let terms: Terms = terms
                .iter()
                .map(|(rest, k)| (rest.clone(), k * &coeff))
                .collect();
            return Ok(Rewrite::Eval(Ex::from_kind(Kind::Add {
                terms,
                constant: constant * &coeff,
            })));
        }
    }
    Ok(Rewrite::Hold(Kind::Mul {
        factors: pairs.into_iter().collect(),
        coeff,
    }))
}

/// Splits one operand into the coefficient and `(basis, exponent)` pairs.
/// A power with a non-numeric exponent is kept whole as a basis.
fn split_operand(op: Ex, coeff: &mut Numeric, pairs: &mut Vec<(Ex, Ex)>) {
    match op.kind() {
        Kind::Numeric(n) => *coeff = &*coeff * n,
        Kind::Mul { factors, coeff: k } => {
            *coeff = &*coeff * k;
            pairs.extend(factors.iter().cloned());
        }
        Kind::Power { basis, exponent } if exponent.is_numeric() => {
            pairs.push((basis.clone(), exponent.clone()));
        }
        _ => pairs.push((op, Ex::one())),
    }
}

pub(crate) fn degree(factors: &Factors, s: &Ex, low: bool) -> Result<i64> {
    let mut sum = 0i64;
    for (basis, exponent) in factors {
        let factor = recombine_factor(basis, exponent, false);
        let d = if low { factor.ldegree(s)? } else { factor.degree(s)? };
        sum = sum.checked_add(d).ok_or(Error::DegreeOverflow)?;
    }
    Ok(sum)
}

pub(crate) fn coeff(factors: &Factors, overall: &Numeric, s: &Ex, n: i64) -> Result<Ex> {
    let mut parts = Vec::with_capacity(factors.len() + 1);
    if n == 0 {
        // a factor with a nonzero power of s makes the product vanish
        for (basis, exponent) in factors {
            parts.push(recombine_factor(basis, exponent, false).coeff(s, 0)?);
        }
        parts.push(Ex::num(overall.clone()));
        return Ex::mul(parts).eval();
    }

    let mut found = false;
    for (basis, exponent) in factors {
        let factor = recombine_factor(basis, exponent, false);
        let c = factor.coeff(s, n)?;
        if c.is_zero() {
            parts.push(factor);
        } else {
            parts.push(c);
            found = true;
        }
    }
    if !found {
        return Ok(Ex::zero());
    }
    parts.push(Ex::num(overall.clone()));
    Ex::mul(parts).eval()
}

/// Product rule over the factors.
pub(crate) fn derivative(factors: &Factors, overall: &Numeric, s: &Ex) -> Result<Ex> {
    let ops: Vec<Ex> = factors
        .iter()
        .map(|(basis, exponent)| recombine_factor(basis, exponent, false))
        .collect();
    let mut terms = Vec::with_capacity(ops.len());
    for (i, factor) in ops.iter().enumerate() {
        let d = factor.derivative(s)?;
        if d.is_zero() {
            continue;
        }
        let mut product = ops.clone();
        product[i] = d;
        product.push(Ex::num(overall.clone()));
        terms.push(Ex::mul(product));
    }
    Ok(Ex::add(terms))
}
