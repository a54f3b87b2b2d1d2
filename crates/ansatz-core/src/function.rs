//! Function applications and derivatives of opaque functions.

use num_traits::{One, Zero};

use ansatz_numeric::Numeric;

use crate::config::Budget;
use crate::error::{Error, Result};
use crate::eval::{eval_children, fired, Mode, Rewrite};
use crate::handle::Ex;
use crate::node::{Args, Func, Kind};

pub(crate) fn eval(func: &Func, args: &Args, mode: Mode, budget: Budget) -> Result<Rewrite> {
    if func.is_builtin() && args.len() != 1 {
        return Err(Error::InvalidArgument(format!(
            "{} takes exactly one argument, got {}",
            func.name(),
            args.len()
        )));
    }
    let (args, changed) = eval_children(args, mode, budget)?;
    if func.is_builtin() {
        if let Some(value) = builtin(func, &args[0])? {
            return Ok(Rewrite::Done(value));
        }
    }
    if changed {
        Ok(Rewrite::Hold(Kind::Function {
            func: func.clone(),
            args: args.into_iter().collect(),
        }))
    } else {
        Ok(Rewrite::Keep)
    }
}

fn builtin(func: &Func, arg: &Ex) -> Result<Option<Ex>> {
    if let Some(n) = arg.as_numeric() {
        if !n.is_exact() {
            fired("function-approximate");
            return approximate(func, n).map(|v| Some(Ex::num(v)));
        }
        let value = match func {
            Func::Sin if n.is_zero() => Some(Ex::zero()),
            Func::Cos if n.is_zero() => Some(Ex::one()),
            Func::Exp if n.is_zero() => Some(Ex::one()),
            Func::Ln if n.is_one() => Some(Ex::zero()),
            Func::Ln if n.is_zero() => return Err(Error::Pole("ln(0)")),
            _ => None,
        };
        if value.is_some() {
            fired("function-exact-value");
        }
        return Ok(value);
    }
    if let (Func::Exp, Kind::Function { func: Func::Ln, args }) = (func, arg.kind()) {
        fired("exp-of-ln");
        return Ok(Some(args[0].clone()));
    }
    Ok(None)
}

/// Principal values over the complex doubles.
fn approximate(func: &Func, n: &Numeric) -> Result<Numeric> {
    let (a, b) = n.to_f64_pair();
    let (re, im) = match func {
        Func::Sin => (a.sin() * b.cosh(), a.cos() * b.sinh()),
        Func::Cos => (a.cos() * b.cosh(), -(a.sin() * b.sinh())),
        Func::Exp => {
            let m = a.exp();
            (m * b.cos(), m * b.sin())
        }
        Func::Ln => {
            if a == 0.0 && b == 0.0 {
                return Err(Error::Pole("ln(0)"));
            }
            (a.hypot(b).ln(), b.atan2(a))
        }
        Func::Named(_) => return Ok(n.clone()),
    };
    Ok(Numeric::approx_complex(re, im))
}

pub(crate) fn eval_fderivative(
    func: &Func,
    params: &[usize],
    args: &Args,
    mode: Mode,
    budget: Budget,
) -> Result<Rewrite> {
    let (args, changed) = eval_children(args, mode, budget)?;
    if changed {
        Ok(Rewrite::Hold(Kind::FDerivative {
            func: func.clone(),
            params: params.to_vec(),
            args: args.into_iter().collect(),
        }))
    } else {
        Ok(Rewrite::Keep)
    }
}

/// Partial derivative of `func` by argument `i`.
fn partial(func: &Func, params: Option<&[usize]>, args: &Args, i: usize) -> Ex {
    if let Some(params) = params {
        let mut params = params.to_vec();
        params.push(i);
        return Ex::fderivative(func.clone(), params, args.iter().cloned());
    }
    let x = args[0].clone();
    match func {
        Func::Sin => Ex::cos(x),
        Func::Cos => -Ex::sin(x),
        Func::Exp => Ex::exp(x),
        Func::Ln => x.pow(Ex::minus_one()),
        Func::Named(_) => Ex::fderivative(func.clone(), vec![i], args.iter().cloned()),
    }
}

/// Chain rule: `sum_i partial_i(f)(args) * d/ds args[i]`.
///
/// `params` is `Some` when differentiating a partial derivative.
pub(crate) fn derivative(func: &Func, params: Option<&[usize]>, args: &Args, s: &Ex) -> Result<Ex> {
    let mut terms = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        let d = arg.diff(s, 1)?;
        if d.is_zero() {
            continue;
        }
        terms.push(Ex::mul([partial(func, params, args, i), d]));
    }
    Ok(Ex::add(terms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::TypeTag;

    #[test]
    fn test_exact_identities() {
        let zero = Ex::integer(0);
        assert!(Ex::sin(zero.clone()).eval().unwrap().is_zero());
        assert!(Ex::cos(zero.clone()).eval().unwrap().is_one());
        assert!(Ex::exp(zero.clone()).eval().unwrap().is_one());
        assert!(Ex::ln(Ex::integer(1)).eval().unwrap().is_zero());
        assert_eq!(Ex::ln(zero).eval().unwrap_err().kind(), ErrorKind::Pole);
        assert_eq!(Ex::sin(Ex::integer(1)).eval().unwrap().tag(), TypeTag::Function);
    }

    #[test]
    fn test_exp_of_ln() {
        let x = Ex::symbol("x");
        assert!(Ex::exp(Ex::ln(x.clone())).eval().unwrap().ptr_eq(&x));
        assert_eq!(Ex::ln(Ex::exp(x)).eval().unwrap().tag(), TypeTag::Function);
    }

    #[test]
    fn test_approximate_arguments() {
        let e = Ex::exp(Ex::num(1.0)).eval().unwrap();
        assert_eq!(e.as_numeric(), Some(&Numeric::approx(1f64.exp())));
        let e = Ex::ln(Ex::num(-1.0)).eval().unwrap();
        assert_eq!(
            e.as_numeric(),
            Some(&Numeric::approx_complex(0.0, std::f64::consts::PI))
        );
        assert_eq!(Ex::ln(Ex::num(0.0)).eval().unwrap_err().kind(), ErrorKind::Pole);
    }

    #[test]
    fn test_builtin_arity() {
        let x = Ex::symbol("x");
        let bad = Ex::function(Func::Sin, [x.clone(), x]);
        assert!(matches!(bad.eval(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_chain_rule() {
        let x = Ex::symbol("x");
        // d/dx sin(x^2) = 2*x*cos(x^2)
        let d = Ex::sin(x.pow(2)).diff(&x, 1).unwrap();
        let expected = Ex::mul([Ex::integer(2), x.clone(), Ex::cos(x.pow(2))])
            .eval()
            .unwrap();
        assert_eq!(d, expected);

        // d/dx ln(x) = x^(-1)
        let d = Ex::ln(x.clone()).diff(&x, 1).unwrap();
        assert_eq!(d, x.pow(-1).eval().unwrap());

        // d^2/dx^2 cos(x) = -cos(x)
        let d = Ex::cos(x.clone()).diff(&x, 2).unwrap();
        assert_eq!(d, (-Ex::cos(x)).eval().unwrap());
    }

    #[test]
    fn test_opaque_function_derivatives() {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let f = Ex::named("f", [x.clone(), y.clone()]);
        let fx = f.diff(&x, 1).unwrap();
        assert_eq!(fx.tag(), TypeTag::FDerivative);
        assert_eq!(fx, Ex::fderivative(Func::Named("f".into()), vec![0], [x.clone(), y.clone()]));

        let fxy = fx.diff(&y, 1).unwrap();
        let fyx = f.diff(&y, 1).unwrap().diff(&x, 1).unwrap();
        assert_eq!(fxy, fyx);
        assert_ne!(fxy, fx);
    }
}
