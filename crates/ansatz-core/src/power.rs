//! Powers: the exponentiation rule set, degree, coefficients and derivative.
//!
//! The rules run against an evaluated basis `b` and exponent `e`; the first
//! one that matches wins:
//!
//! 1. `b^0 -> 1`, except `0^0` which is a domain error.
//! 2. `b^1 -> b`.
//! 3. `0^e` for numeric `e`: a domain error if `Re(e) = 0`, a pole if
//!    `Re(e) < 0`, otherwise `0`.
//! 4. `1^e -> 1`.
//! 5. Numeric `b` and `e`: compute the power, exactly when possible; for an
//!    inexact result with rational `e = n/m`, split off the integer part
//!    `b^(n/m) -> b^(r/m) * b^q`.
//! 6. `(x^c1)^e -> x^(c1*e)` for numeric `e` and `c1` when `e` is an
//!    integer or `c1` is real with `|c1| < 1`.
//! 7. `(x*y*...)^n` with integer `n` distributes over the factors.
//! 8. `(c*x*...)^e` with numeric coefficient `c` and non-integer `e`:
//!    `(x*...)^e * c^e` for `c > 0`, `(-x*...)^e * (-c)^e` for `c < 0`.
//! 9. `A^n` for noncommutative `A` and positive integer `n` is the ordered
//!    product `A*A*...*A`.
//! 10. Otherwise the power is held.

use num_traits::{One, Zero};
use std::iter;

use ansatz_numeric::{Numeric, Rational};

use crate::config::Budget;
use crate::error::{Error, Result};
use crate::eval::{eval_child, fired, Mode, Rewrite};
use crate::handle::Ex;
use crate::node::{Factors, Kind};

pub(crate) fn eval(basis: &Ex, exponent: &Ex, mode: Mode, budget: Budget) -> Result<Rewrite> {
    let b = eval_child(basis, mode, budget)?;
    let e = eval_child(exponent, mode, budget)?;
    if let Some(rewrite) = rules(&b, &e)? {
        return Ok(rewrite);
    }
    if b.ptr_eq(basis) && e.ptr_eq(exponent) {
        Ok(Rewrite::Keep)
    } else {
        Ok(Rewrite::Hold(Kind::Power {
            basis: b,
            exponent: e,
        }))
    }
}

fn rules(b: &Ex, e: &Ex) -> Result<Option<Rewrite>> {
    if b.is_one() {
        fired("power-unit-basis");
        return Ok(Some(Rewrite::Done(Ex::one())));
    }

    let Some(ne) = e.as_numeric() else {
        return Ok(None);
    };

    if ne.is_zero() {
        if b.is_zero() {
            return Err(Error::Domain("pow(0,0) is undefined"));
        }
        fired("power-zero-exponent");
        return Ok(Some(Rewrite::Done(Ex::one())));
    }

    if ne.is_one() {
        fired("power-unit-exponent");
        return Ok(Some(Rewrite::Done(b.clone())));
    }

    if b.is_zero() {
        let re = ne.real();
        if re.is_zero() {
            return Err(Error::Domain("pow(0,I) is undefined"));
        }
        if re.is_negative() {
            return Err(Error::Pole("pow(0,negative) is a division by zero"));
        }
        fired("power-zero-basis");
        return Ok(Some(Rewrite::Done(Ex::zero())));
    }

    if let Some(nb) = b.as_numeric() {
        return numeric_power(b, nb, ne);
    }

    if let Some((sub_basis, sub_exponent)) = b.as_power() {
        if let Some(c1) = sub_exponent.as_numeric() {
            if ne.is_integer() || magnitude_below_one(c1) {
                fired("power-of-power");
                return Ok(Some(Rewrite::Eval(Ex::power(
                    sub_basis.clone(),
                    Ex::num(c1 * ne),
                ))));
            }
        }
    }

    if let Kind::Mul { factors, coeff } = b.kind() {
        if ne.is_integer() {
            fired("power-distribute-integer");
            return Ok(Some(Rewrite::Eval(distribute(factors, coeff, ne)?)));
        }
        if !coeff.is_one() && coeff.is_real() {
            let (unit, magnitude) = if coeff.is_positive() {
                (Numeric::one(), coeff.clone())
            } else if !coeff.is_minus_one() {
                (Numeric::minus_one(), coeff.abs())
            } else {
                return Ok(None);
            };
            fired("power-split-coefficient");
            let rest = Ex::from_kind(Kind::Mul {
                factors: factors.clone(),
                coeff: unit,
            });
            return Ok(Some(Rewrite::Eval(Ex::mul([
                Ex::power(rest, e.clone()),
                Ex::power(Ex::num(magnitude), e.clone()),
            ]))));
        }
    }

    if ne.is_pos_integer() && !b.is_commutative() {
        if let Some(n) = ne.to_i64().and_then(|n| usize::try_from(n).ok()) {
            fired("power-noncommutative");
            return Ok(Some(Rewrite::Eval(Ex::ncmul(iter::repeat(b.clone()).take(n)))));
        }
    }

    Ok(None)
}

/// `|c| < 1`, compared through `re^2 + im^2` so exact values stay exact.
fn magnitude_below_one(c: &Numeric) -> bool {
    let (re, im) = (c.real(), c.imag());
    let norm = &(&re * &re) + &(&im * &im);
    (&norm - &Numeric::one()).is_negative()
}

/// Rule 5: both basis and exponent numeric.
fn numeric_power(b: &Ex, nb: &Numeric, ne: &Numeric) -> Result<Option<Rewrite>> {
    let value = nb.checked_pow(ne)?;
    if !nb.is_exact() || !ne.is_exact() || value.is_exact() {
        fired("power-numeric");
        return Ok(Some(Rewrite::Done(Ex::num(value))));
    }

    let (Some(n), Some(m)) = (ne.numer(), ne.denom()) else {
        return Ok(None);
    };
    let (q, r) = n.div_rem_floor(&m);

    if q.is_zero() {
        // (5/8)^(1/3) -> 1/2 * 5^(1/3)
        if let (false, Some(bn), Some(bd)) = (nb.is_integer(), nb.numer(), nb.denom()) {
            let bnum = Numeric::from(bn);
            let bden = Numeric::from(bd);
            let root = bnum.checked_pow(ne)?;
            if root.is_integer() {
                fired("power-numerator-root");
                return Ok(Some(Rewrite::Eval(Ex::mul([
                    Ex::power(Ex::num(bden), Ex::num(-ne)),
                    Ex::num(root),
                ]))));
            }
            let root = bden.checked_pow(ne)?;
            if root.is_integer() {
                fired("power-denominator-root");
                return Ok(Some(Rewrite::Eval(Ex::mul([
                    Ex::power(Ex::num(bnum), Ex::num(ne.clone())),
                    Ex::num(root.inverse()?),
                ]))));
            }
        }
        return Ok(None);
    }

    // 2^(7/3) -> 2^(1/3) * 2^2
    fired("power-split-exponent");
    Ok(Some(Rewrite::Eval(Ex::mul([
        Ex::power(b.clone(), Ex::num(Rational::new(r, m))),
        Ex::power(b.clone(), Ex::num(Numeric::from(q))),
    ]))))
}

/// Rule 7: `(c * prod(b_i^e_i))^n = c^n * prod(b_i^(e_i*n))`.
fn distribute(factors: &Factors, coeff: &Numeric, n: &Numeric) -> Result<Ex> {
    let exponent = Ex::num(n.clone());
    let mut ops: Vec<Ex> = factors
        .iter()
        .map(|(basis, e)| Ex::power(basis.clone(), Ex::mul([e.clone(), exponent.clone()])))
        .collect();
    ops.push(Ex::num(coeff.checked_pow(n)?));
    Ok(Ex::mul(ops))
}

fn integer_exponent(exponent: &Ex) -> Option<i64> {
    exponent.as_numeric().filter(|n| n.is_integer()).and_then(Numeric::to_i64)
}

pub(crate) fn degree(basis: &Ex, exponent: &Ex, s: &Ex, low: bool) -> Result<i64> {
    if let Some(n) = exponent.as_numeric().filter(|n| n.is_integer()) {
        let d = if basis.is_equal(s) {
            1
        } else if low {
            basis.ldegree(s)?
        } else {
            basis.degree(s)?
        };
        if d == 0 {
            return Ok(0);
        }
        return n
            .to_i64()
            .and_then(|n| d.checked_mul(n))
            .ok_or(Error::DegreeOverflow);
    }
    if basis.has(s) {
        return Err(Error::UndefinedDegree);
    }
    Ok(0)
}

pub(crate) fn coeff(power: &Ex, basis: &Ex, exponent: &Ex, s: &Ex, n: i64) -> Ex {
    if !basis.is_equal(s) {
        return if n == 0 { power.clone() } else { Ex::zero() };
    }
    match integer_exponent(exponent) {
        Some(k) if k == n => Ex::one(),
        Some(_) => Ex::zero(),
        // non-integer powers of s count as degree zero
        None if n == 0 => power.clone(),
        None => Ex::zero(),
    }
}

/// `d/ds b^e`.
pub(crate) fn derivative(power: &Ex, basis: &Ex, exponent: &Ex, s: &Ex) -> Result<Ex> {
    let db = basis.derivative(s)?;
    if let Some(r) = exponent.as_numeric().filter(|n| n.is_real()) {
        // r * b^(r-1) * b'
        return Ok(Ex::mul([
            Ex::power(basis.clone(), Ex::num(r - &Numeric::one())),
            db,
            Ex::num(r.clone()),
        ]));
    }
    // b^e * (e' * ln(b) + e * b' / b)
    let de = exponent.derivative(s)?;
    Ok(Ex::mul([
        power.clone(),
        Ex::add([
            Ex::mul([de, Ex::ln(basis.clone())]),
            Ex::mul([exponent.clone(), db, Ex::power(basis.clone(), Ex::minus_one())]),
        ]),
    ]))
}
