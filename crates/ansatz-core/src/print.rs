//! Text rendering.
//!
//! Sums print their constant first, products their coefficient first;
//! subexpressions are parenthesized when they bind weaker than their
//! context: `1-x`, `-2/3*x*(1+y)`, `x^(-1)`, `D[0,1](f)(x,y)`, `{a,b}`.

use num_traits::{One, Zero};
use std::fmt::{self, Write as _};

use ansatz_numeric::Numeric;

use crate::handle::{recombine_factor, Ex};
use crate::node::{Factors, Kind, Terms};

const SUM: u8 = 0;
const PRODUCT: u8 = 1;
const POWER: u8 = 2;
const ATOM: u8 = 3;

fn numeric_precedence(n: &Numeric) -> u8 {
    if !n.imag().is_zero() || n.is_negative() {
        SUM
    } else if !n.is_integer() && n.is_exact() {
        PRODUCT
    } else {
        ATOM
    }
}

fn precedence(e: &Ex) -> u8 {
    match e.kind() {
        Kind::Numeric(n) => numeric_precedence(n),
        Kind::Add { .. } | Kind::Relational { .. } => SUM,
        Kind::Mul { coeff, .. } if !coeff.is_real() || coeff.is_negative() => SUM,
        Kind::Mul { .. } | Kind::NcMul(_) => PRODUCT,
        Kind::Power { .. } => POWER,
        _ => ATOM,
    }
}

fn write_at(f: &mut fmt::Formatter<'_>, e: &Ex, level: u8) -> fmt::Result {
    if precedence(e) < level {
        write!(f, "({e})")
    } else {
        write!(f, "{e}")
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Ex]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_char(',')?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_add(f: &mut fmt::Formatter<'_>, terms: &Terms, constant: &Numeric) -> fmt::Result {
    let mut first = true;
    if !constant.is_zero() {
        write!(f, "{constant}")?;
        first = false;
    }
    for (rest, coeff) in terms {
        if !coeff.is_real() {
            if !first {
                f.write_char('+')?;
            }
            write!(f, "({coeff})*")?;
            write_at(f, rest, PRODUCT)?;
        } else {
            let negative = coeff.is_negative();
            if negative {
                f.write_char('-')?;
            } else if !first {
                f.write_char('+')?;
            }
            let magnitude = if negative { -coeff } else { coeff.clone() };
            if magnitude.is_one() {
                write_at(f, rest, if negative { PRODUCT } else { SUM })?;
            } else {
                write!(f, "{magnitude}*")?;
                write_at(f, rest, PRODUCT)?;
            }
        }
        first = false;
    }
    if first {
        f.write_char('0')?;
    }
    Ok(())
}

fn write_mul(f: &mut fmt::Formatter<'_>, factors: &Factors, coeff: &Numeric) -> fmt::Result {
    if factors.is_empty() {
        return write!(f, "{coeff}");
    }
    if !coeff.is_real() {
        write!(f, "({coeff})*")?;
    } else if coeff.is_minus_one() {
        f.write_char('-')?;
    } else if !coeff.is_one() {
        write!(f, "{coeff}*")?;
    }
    for (i, (basis, exponent)) in factors.iter().enumerate() {
        if i > 0 {
            f.write_char('*')?;
        }
        write_at(f, &recombine_factor(basis, exponent, false), PRODUCT)?;
    }
    Ok(())
}

fn write_power(f: &mut fmt::Formatter<'_>, basis: &Ex, exponent: &Ex) -> fmt::Result {
    write_at(f, basis, ATOM)?;
    f.write_char('^')?;
    let plain = match exponent.kind() {
        Kind::Numeric(n) => n.is_integer() && !n.is_negative(),
        Kind::Symbol(_) | Kind::Constant(_) | Kind::Wildcard(_) | Kind::Function { .. } => true,
        _ => false,
    };
    if plain {
        write!(f, "{exponent}")
    } else {
        write!(f, "({exponent})")
    }
}

impl fmt::Display for Ex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Kind::Numeric(n) => write!(f, "{n}"),
            Kind::Symbol(s) => f.write_str(s.name()),
            Kind::Constant(c) => f.write_str(c.name()),
            Kind::Wildcard(label) => write!(f, "${label}"),
            Kind::Add { terms, constant } => write_add(f, terms, constant),
            Kind::Mul { factors, coeff } => write_mul(f, factors, coeff),
            Kind::Power { basis, exponent } => write_power(f, basis, exponent),
            Kind::NcMul(factors) => {
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        f.write_char('*')?;
                    }
                    write_at(f, factor, POWER)?;
                }
                Ok(())
            }
            Kind::Function { func, args } => {
                write!(f, "{}(", func.name())?;
                write_seq(f, args)?;
                f.write_char(')')
            }
            Kind::FDerivative { func, params, args } => {
                f.write_str("D[")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, "]({})(", func.name())?;
                write_seq(f, args)?;
                f.write_char(')')
            }
            Kind::Relational { lhs, rhs, op } => write!(f, "{lhs}{}{rhs}", op.symbol()),
            Kind::List(items) => {
                f.write_char('{')?;
                write_seq(f, items)?;
                f.write_char('}')
            }
        }
    }
}

impl fmt::Debug for Ex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ex({self})")
    }
}
