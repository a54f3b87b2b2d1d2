//! Sums: canonicalization, degree, coefficients and derivative.

use num_traits::{One, Zero};

use ansatz_numeric::Numeric;

use crate::config::Budget;
use crate::error::Result;
use crate::eval::{eval_children, fired, Mode, Rewrite};
use crate::handle::{scaled, Ex};
use crate::node::{status_flags, Factors, Kind, Terms};

pub(crate) fn eval(terms: &Terms, constant: &Numeric, mode: Mode, budget: Budget) -> Result<Rewrite> {
    let rests: Vec<Ex> = terms.iter().map(|(rest, _)| rest.clone()).collect();
    let (rests, _) = eval_children(&rests, mode, budget)?;
    let pairs = rests
        .into_iter()
        .zip(terms.iter().map(|(_, coeff)| coeff.clone()));
    Ok(canonicalize(pairs, constant.clone(), mode))
}

/// Flattens, combines like terms, sorts and collapses degenerate sums.
fn canonicalize(pairs: impl Iterator<Item = (Ex, Numeric)>, constant: Numeric, mode: Mode) -> Rewrite {
    let mut constant = constant;
    let mut split = Vec::new();
    for (rest, coeff) in pairs {
        split_pair(rest, coeff, &mut constant, &mut split);
    }
    split.sort_by(|a, b| a.0.compare(&b.0));

    let mut terms = Terms::new();
    for (rest, coeff) in split {
        if let Some((last, sum)) = terms.last_mut() {
            if last.is_equal(&rest) {
                *sum = &*sum + &coeff;
                continue;
            }
        }
        terms.push((rest, coeff));
    }
    terms.retain(|(_, coeff)| !coeff.is_zero());

    if terms.is_empty() {
        fired("add-constant");
        return Rewrite::Done(Ex::num(constant));
    }
    if terms.len() == 1 && constant.is_zero() {
        fired("add-single-term");
        let (rest, coeff) = terms.remove(0);
        if coeff.is_one() {
            return Rewrite::Done(rest);
        }
        return match mode {
            Mode::Deep => Rewrite::Done(scaled(&rest, &coeff)),
            Mode::Shallow => Rewrite::Done(Ex::mul([rest, Ex::num(coeff)])),
        };
    }
    Rewrite::Hold(Kind::Add { terms, constant })
}

/// Splits `coeff * rest` into the constant and `(term, coefficient)` pairs.
fn split_pair(rest: Ex, coeff: Numeric, constant: &mut Numeric, out: &mut Vec<(Ex, Numeric)>) {
    match rest.kind() {
        Kind::Numeric(n) => *constant = &*constant + &(n * &coeff),
        Kind::Add {
            terms,
            constant: inner,
        } => {
            *constant = &*constant + &(inner * &coeff);
            for (r, k) in terms {
                split_pair(r.clone(), k * &coeff, constant, out);
            }
        }
        Kind::Mul { factors, coeff: k } if !k.is_one() => {
            let unit = unit_product(factors, rest.is_evaluated());
            out.push((unit, k * &coeff));
        }
        _ => out.push((rest, coeff)),
    }
}

/// The product of `factors` with coefficient one.
fn unit_product(factors: &Factors, evaluated: bool) -> Ex {
    let flags = if evaluated { status_flags::EVALUATED } else { 0 };
    if factors.len() == 1 {
        let (basis, exponent) = &factors[0];
        if exponent.is_one() {
            return basis.clone();
        }
        return Ex::with_flags(
            Kind::Power {
                basis: basis.clone(),
                exponent: exponent.clone(),
            },
            flags,
        );
    }
    Ex::with_flags(
        Kind::Mul {
            factors: factors.clone(),
            coeff: Numeric::one(),
        },
        flags,
    )
}

/// Highest (or lowest) degree over all terms; a nonzero constant counts as
/// degree zero.
pub(crate) fn degree(terms: &Terms, constant: &Numeric, s: &Ex, low: bool) -> Result<i64> {
    let mut deg = (!constant.is_zero()).then_some(0);
    for (rest, _) in terms {
        let d = if low { rest.ldegree(s)? } else { rest.degree(s)? };
        deg = Some(match deg {
            None => d,
            Some(cur) if low => cur.min(d),
            Some(cur) => cur.max(d),
        });
    }
    Ok(deg.unwrap_or(0))
}

pub(crate) fn coeff(terms: &Terms, constant: &Numeric, s: &Ex, n: i64) -> Result<Ex> {
    let mut parts = Vec::with_capacity(terms.len() + 1);
    for (rest, k) in terms {
        let c = rest.coeff(s, n)?;
        if !c.is_zero() {
            parts.push(Ex::mul([c, Ex::num(k.clone())]));
        }
    }
    if n == 0 {
        parts.push(Ex::num(constant.clone()));
    }
    Ex::add(parts).eval()
}

pub(crate) fn derivative(terms: &Terms, s: &Ex) -> Result<Ex> {
    let mut parts = Vec::with_capacity(terms.len());
    for (rest, k) in terms {
        let d = rest.derivative(s)?;
        if !d.is_zero() {
            parts.push(Ex::mul([d, Ex::num(k.clone())]));
        }
    }
    Ok(Ex::add(parts))
}
