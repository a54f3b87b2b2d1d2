//! Shared expression handles.
//!
//! An [`Ex`] is a reference-counted pointer to a [`Node`]. Cloning a handle is
//! cheap and aliases the node; nodes are immutable while shared, and
//! in-place mutation requires the handle to be the only owner.

use num_traits::{One, Zero};
use smallvec::SmallVec;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

use ansatz_numeric::{Numeric, Rational};

use crate::error::{Error, Result};
use crate::node::{status_flags, Constant, Factors, Func, Kind, Node, RelOp, Symbol, Terms, TypeTag};

static NEXT_SERIAL: AtomicU32 = AtomicU32::new(0);

const ATOM_FLAGS: u8 = status_flags::EVALUATED | status_flags::EXPANDED;

/// A handle to an expression node.
///
/// Equality, ordering and hashing of handles follow the canonical order of
/// the nodes they point to, not pointer identity.
#[derive(Clone)]
pub struct Ex(Arc<Node>);

impl Ex {
    pub(crate) fn with_flags(kind: Kind, flags: u8) -> Self {
        Self(Arc::new(Node::new(kind, flags)))
    }

    /// Wraps a variant payload in a fresh, unevaluated node.
    #[must_use]
    pub fn from_kind(kind: Kind) -> Self {
        let flags = if kind.is_atom() { ATOM_FLAGS } else { 0 };
        Self::with_flags(kind, flags)
    }

    // === Atoms ===

    /// A numeric literal.
    #[must_use]
    pub fn num(value: impl Into<Numeric>) -> Self {
        Self::with_flags(Kind::Numeric(value.into()), ATOM_FLAGS)
    }

    /// An exact integer.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::num(Numeric::integer(value))
    }

    /// An exact rational `num/den`.
    ///
    /// # Panics
    ///
    /// Panics if `den` is zero.
    #[must_use]
    pub fn rational(num: i64, den: i64) -> Self {
        Self::num(Numeric::rational(num, den))
    }

    /// The shared exact zero.
    #[must_use]
    pub fn zero() -> Self {
        static ZERO: OnceLock<Ex> = OnceLock::new();
        ZERO.get_or_init(|| Ex::integer(0)).clone()
    }

    /// The shared exact one.
    #[must_use]
    pub fn one() -> Self {
        static ONE: OnceLock<Ex> = OnceLock::new();
        ONE.get_or_init(|| Ex::integer(1)).clone()
    }

    /// The shared exact minus one.
    #[must_use]
    pub fn minus_one() -> Self {
        static MINUS_ONE: OnceLock<Ex> = OnceLock::new();
        MINUS_ONE.get_or_init(|| Ex::integer(-1)).clone()
    }

    /// A new commutative symbol, distinct from every other symbol.
    #[must_use]
    pub fn symbol(name: &str) -> Self {
        Self::new_symbol(name, true)
    }

    /// A new noncommutative symbol.
    #[must_use]
    pub fn nc_symbol(name: &str) -> Self {
        Self::new_symbol(name, false)
    }

    fn new_symbol(name: &str, commutative: bool) -> Self {
        let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
        Self::with_flags(
            Kind::Symbol(Symbol {
                serial,
                name: Arc::from(name),
                commutative,
            }),
            ATOM_FLAGS,
        )
    }

    /// A named constant.
    #[must_use]
    pub fn constant(constant: Constant) -> Self {
        Self::with_flags(Kind::Constant(constant), ATOM_FLAGS)
    }

    /// `Pi`.
    #[must_use]
    pub fn pi() -> Self {
        Self::constant(Constant::Pi)
    }

    /// A pattern wildcard.
    #[must_use]
    pub fn wild(label: u32) -> Self {
        Self::with_flags(Kind::Wildcard(label), ATOM_FLAGS)
    }

    // === Containers (unevaluated) ===

    /// The sum of `operands`.
    pub fn add(operands: impl IntoIterator<Item = Ex>) -> Self {
        let mut constant = Numeric::zero();
        let mut terms = Terms::new();
        for op in operands {
            match op.kind() {
                Kind::Numeric(n) => constant = &constant + n,
                _ => terms.push((op, Numeric::one())),
            }
        }
        Self::from_kind(Kind::Add { terms, constant })
    }

    /// The product of `operands`, in the given order.
    pub fn mul(operands: impl IntoIterator<Item = Ex>) -> Self {
        let mut coeff = Numeric::one();
        let mut factors = Factors::new();
        for op in operands {
            match op.kind() {
                Kind::Numeric(n) => coeff = &coeff * n,
                _ => factors.push((op, Ex::one())),
            }
        }
        Self::from_kind(Kind::Mul { factors, coeff })
    }

    /// `basis ^ exponent`.
    #[must_use]
    pub fn power(basis: Ex, exponent: Ex) -> Self {
        Self::from_kind(Kind::Power { basis, exponent })
    }

    /// `self ^ exponent`.
    #[must_use]
    pub fn pow(&self, exponent: impl Into<Ex>) -> Self {
        Self::power(self.clone(), exponent.into())
    }

    /// The ordered product of `factors`.
    pub fn ncmul(factors: impl IntoIterator<Item = Ex>) -> Self {
        Self::from_kind(Kind::NcMul(factors.into_iter().collect()))
    }

    /// Applies `func` to `args`.
    pub fn function(func: Func, args: impl IntoIterator<Item = Ex>) -> Self {
        Self::from_kind(Kind::Function {
            func,
            args: args.into_iter().collect(),
        })
    }

    /// Applies an opaque named function to `args`.
    pub fn named(name: &str, args: impl IntoIterator<Item = Ex>) -> Self {
        Self::function(Func::Named(Arc::from(name)), args)
    }

    /// `sin(arg)`.
    #[must_use]
    pub fn sin(arg: Ex) -> Self {
        Self::function(Func::Sin, [arg])
    }

    /// `cos(arg)`.
    #[must_use]
    pub fn cos(arg: Ex) -> Self {
        Self::function(Func::Cos, [arg])
    }

    /// `exp(arg)`.
    #[must_use]
    pub fn exp(arg: Ex) -> Self {
        Self::function(Func::Exp, [arg])
    }

    /// `ln(arg)`.
    #[must_use]
    pub fn ln(arg: Ex) -> Self {
        Self::function(Func::Ln, [arg])
    }

    /// Partial derivative of `func` by the argument positions in `params`.
    pub fn fderivative(func: Func, params: Vec<usize>, args: impl IntoIterator<Item = Ex>) -> Self {
        let mut params = params;
        params.sort_unstable();
        Self::from_kind(Kind::FDerivative {
            func,
            params,
            args: args.into_iter().collect(),
        })
    }

    /// `lhs op rhs`.
    #[must_use]
    pub fn relation(lhs: Ex, rhs: Ex, op: RelOp) -> Self {
        Self::from_kind(Kind::Relational { lhs, rhs, op })
    }

    /// The equation `lhs == rhs`.
    #[must_use]
    pub fn equation(lhs: Ex, rhs: Ex) -> Self {
        Self::relation(lhs, rhs, RelOp::Eq)
    }

    /// An ordered list.
    pub fn list(items: impl IntoIterator<Item = Ex>) -> Self {
        Self::from_kind(Kind::List(items.into_iter().collect()))
    }

    // === Node access ===

    /// The underlying node.
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.0
    }

    /// The variant payload.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        self.0.kind()
    }

    /// The stable type tag.
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        self.kind().tag()
    }

    /// Returns true once the node is a fixed point of evaluation.
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.0.has_flag(status_flags::EVALUATED)
    }

    /// Returns true once the node is known to be fully expanded.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.0.has_flag(status_flags::EXPANDED)
    }

    pub(crate) fn set_flag(&self, flag: u8) -> &Self {
        self.0.set_flag(flag);
        self
    }

    /// Number of handles sharing the node.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Returns true if this handle is the sole owner of its node.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.ref_count() == 1
    }

    /// Returns true if both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Ex) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // === Copy-on-write ===

    /// Mutable access to the payload of a uniquely owned node.
    ///
    /// Clears the cached hash but never the `evaluated` flag; callers making
    /// a semantic change use [`Ex::clear_evaluated`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotModifiable`] if the node is shared.
    pub fn try_mut(&mut self) -> Result<&mut Kind> {
        if !self.is_unique() {
            debug!(
                target: "ansatz::node",
                refs = self.ref_count(),
                tag = self.tag().name(),
                "refusing to modify a shared node"
            );
            return Err(Error::NotModifiable);
        }
        Arc::get_mut(&mut self.0)
            .map(Node::kind_mut)
            .ok_or(Error::NotModifiable)
    }

    /// Clone-then-mutate: detaches this handle from other owners if needed
    /// and returns mutable access to its own copy.
    pub fn to_mut(&mut self) -> &mut Kind {
        Arc::make_mut(&mut self.0).kind_mut()
    }

    /// Clears the `evaluated` and `expanded` flags of a uniquely owned node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotModifiable`] if the node is shared.
    pub fn clear_evaluated(&mut self) -> Result<()> {
        match Arc::get_mut(&mut self.0) {
            Some(node) => {
                node.clear_flag_mut(status_flags::EVALUATED | status_flags::EXPANDED);
                Ok(())
            }
            None => Err(Error::NotModifiable),
        }
    }

    /// Replaces child `i` of a uniquely owned node.
    ///
    /// # Errors
    ///
    /// - [`Error::NotModifiable`] if the node is shared.
    /// - [`Error::IndexOutOfRange`] if `i >= nops()`.
    /// - [`Error::Unsupported`] for sums and products, whose children are
    ///   derived from their canonical pairs.
    pub fn let_op(&mut self, i: usize, value: Ex) -> Result<()> {
        let nops = self.nops();
        if i >= nops {
            return Err(Error::IndexOutOfRange { index: i, nops });
        }
        if matches!(self.tag(), TypeTag::Add | TypeTag::Mul) {
            return Err(Error::Unsupported {
                operation: "let_op",
                tag: self.tag().name(),
            });
        }
        let slot = match self.try_mut()? {
            Kind::Power { basis, exponent } => {
                if i == 0 {
                    basis
                } else {
                    exponent
                }
            }
            Kind::Relational { lhs, rhs, .. } => {
                if i == 0 {
                    lhs
                } else {
                    rhs
                }
            }
            Kind::NcMul(factors) => &mut factors[i],
            Kind::Function { args, .. } | Kind::FDerivative { args, .. } => &mut args[i],
            Kind::List(items) => &mut items[i],
            Kind::Numeric(_)
            | Kind::Symbol(_)
            | Kind::Constant(_)
            | Kind::Wildcard(_)
            | Kind::Add { .. }
            | Kind::Mul { .. } => unreachable!("index checked above"),
        };
        *slot = value;
        Ok(())
    }

    // === Child access ===

    /// Number of children.
    ///
    /// A sum's children are its terms followed by a nonzero constant; a
    /// product's are its factors followed by a coefficient other than one.
    #[must_use]
    pub fn nops(&self) -> usize {
        match self.kind() {
            Kind::Numeric(_) | Kind::Symbol(_) | Kind::Constant(_) | Kind::Wildcard(_) => 0,
            Kind::Add { terms, constant } => terms.len() + usize::from(!constant.is_zero()),
            Kind::Mul { factors, coeff } => factors.len() + usize::from(!coeff.is_one()),
            Kind::Power { .. } | Kind::Relational { .. } => 2,
            Kind::NcMul(factors) => factors.len(),
            Kind::Function { args, .. } | Kind::FDerivative { args, .. } => args.len(),
            Kind::List(items) => items.len(),
        }
    }

    /// Child `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= nops()`, like slice indexing. Use [`Ex::try_op`] for
    /// a checked variant.
    #[must_use]
    pub fn op(&self, i: usize) -> Ex {
        match self.try_op(i) {
            Ok(child) => child,
            Err(err) => panic!("{err}"),
        }
    }

    /// Child `i`, checked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `i >= nops()`.
    pub fn try_op(&self, i: usize) -> Result<Ex> {
        let out_of_range = || Error::IndexOutOfRange {
            index: i,
            nops: self.nops(),
        };
        let evaluated = self.is_evaluated();
        match self.kind() {
            Kind::Numeric(_) | Kind::Symbol(_) | Kind::Constant(_) | Kind::Wildcard(_) => {
                Err(out_of_range())
            }
            Kind::Add { terms, constant } => match terms.get(i) {
                Some((rest, coeff)) => Ok(recombine_term(rest, coeff, evaluated)),
                None if i == terms.len() && !constant.is_zero() => Ok(Ex::num(constant.clone())),
                None => Err(out_of_range()),
            },
            Kind::Mul { factors, coeff } => match factors.get(i) {
                Some((basis, exponent)) => Ok(recombine_factor(basis, exponent, evaluated)),
                None if i == factors.len() && !coeff.is_one() => Ok(Ex::num(coeff.clone())),
                None => Err(out_of_range()),
            },
            Kind::Power { basis, exponent } => match i {
                0 => Ok(basis.clone()),
                1 => Ok(exponent.clone()),
                _ => Err(out_of_range()),
            },
            Kind::Relational { lhs, rhs, .. } => match i {
                0 => Ok(lhs.clone()),
                1 => Ok(rhs.clone()),
                _ => Err(out_of_range()),
            },
            Kind::NcMul(factors) => factors.get(i).cloned().ok_or_else(out_of_range),
            Kind::Function { args, .. } | Kind::FDerivative { args, .. } => {
                args.get(i).cloned().ok_or_else(out_of_range)
            }
            Kind::List(items) => items.get(i).cloned().ok_or_else(out_of_range),
        }
    }

    /// All children in order.
    #[must_use]
    pub fn ops(&self) -> Vec<Ex> {
        (0..self.nops()).map(|i| self.op(i)).collect()
    }

    /// Rebuilds a node of the same variant from new children, in the
    /// order [`Ex::op`] reports them. The result is unevaluated.
    pub(crate) fn with_ops(&self, ops: Vec<Ex>) -> Ex {
        let mut ops = ops;
        match self.kind() {
            Kind::Numeric(_) | Kind::Symbol(_) | Kind::Constant(_) | Kind::Wildcard(_) => {
                self.clone()
            }
            Kind::Add { .. } => Ex::add(ops),
            Kind::Mul { .. } => Ex::mul(ops),
            Kind::Power { .. } => {
                let exponent = ops.pop().unwrap_or_else(Ex::one);
                let basis = ops.pop().unwrap_or_else(Ex::one);
                Ex::power(basis, exponent)
            }
            Kind::Relational { op, .. } => {
                let rhs = ops.pop().unwrap_or_else(Ex::zero);
                let lhs = ops.pop().unwrap_or_else(Ex::zero);
                Ex::relation(lhs, rhs, *op)
            }
            Kind::NcMul(_) => Ex::ncmul(ops),
            Kind::Function { func, .. } => Ex::function(func.clone(), ops),
            Kind::FDerivative { func, params, .. } => Ex::from_kind(Kind::FDerivative {
                func: func.clone(),
                params: params.clone(),
                args: ops.into_iter().collect(),
            }),
            Kind::List(_) => Ex::list(ops),
        }
    }

    // === Queries ===

    /// The numeric value of a numeric literal.
    #[must_use]
    pub fn as_numeric(&self) -> Option<&Numeric> {
        match self.kind() {
            Kind::Numeric(n) => Some(n),
            _ => None,
        }
    }

    /// The symbol payload of a symbol.
    #[must_use]
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self.kind() {
            Kind::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// `(basis, exponent)` of a power.
    #[must_use]
    pub fn as_power(&self) -> Option<(&Ex, &Ex)> {
        match self.kind() {
            Kind::Power { basis, exponent } => Some((basis, exponent)),
            _ => None,
        }
    }

    /// `(lhs, rhs, op)` of a relation.
    #[must_use]
    pub fn as_relational(&self) -> Option<(&Ex, &Ex, RelOp)> {
        match self.kind() {
            Kind::Relational { lhs, rhs, op } => Some((lhs, rhs, *op)),
            _ => None,
        }
    }

    /// Returns true for a numeric literal.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.as_numeric().is_some()
    }

    /// Returns true for a symbol.
    #[must_use]
    pub fn is_symbol(&self) -> bool {
        self.as_symbol().is_some()
    }

    /// Returns true for a numeric zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.as_numeric().is_some_and(Zero::is_zero)
    }

    /// Returns true for a numeric one.
    #[must_use]
    pub fn is_one(&self) -> bool {
        self.as_numeric().is_some_and(One::is_one)
    }

    /// Returns false if reordering this expression against another
    /// noncommutative one changes its value.
    #[must_use]
    pub fn is_commutative(&self) -> bool {
        match self.kind() {
            Kind::Symbol(s) => s.commutative,
            Kind::Numeric(_)
            | Kind::Constant(_)
            | Kind::Wildcard(_)
            | Kind::Function { .. }
            | Kind::FDerivative { .. }
            | Kind::Relational { .. }
            | Kind::List(_) => true,
            Kind::Add { terms, .. } => terms.iter().all(|(t, _)| t.is_commutative()),
            Kind::Mul { factors, .. } => factors.iter().all(|(b, _)| b.is_commutative()),
            Kind::Power { basis, .. } => basis.is_commutative(),
            Kind::NcMul(factors) => factors.iter().all(Ex::is_commutative),
        }
    }
}

/// Rebuilds `coeff * rest` from a sum's pair.
pub(crate) fn recombine_term(rest: &Ex, coeff: &Numeric, evaluated: bool) -> Ex {
    if coeff.is_one() {
        return rest.clone();
    }
    if evaluated {
        scaled(rest, coeff)
    } else {
        Ex::mul([rest.clone(), Ex::num(coeff.clone())])
    }
}

/// `coeff * rest` as an evaluated product, for an evaluated `rest` that is
/// neither numeric nor a sum.
pub(crate) fn scaled(rest: &Ex, coeff: &Numeric) -> Ex {
    let kind = match rest.kind() {
        Kind::Mul { factors, coeff: c } => Kind::Mul {
            factors: factors.clone(),
            coeff: c * coeff,
        },
        Kind::Power { basis, exponent } if exponent.is_numeric() => Kind::Mul {
            factors: SmallVec::from_iter([(basis.clone(), exponent.clone())]),
            coeff: coeff.clone(),
        },
        _ => Kind::Mul {
            factors: SmallVec::from_iter([(rest.clone(), Ex::one())]),
            coeff: coeff.clone(),
        },
    };
    Ex::with_flags(kind, status_flags::EVALUATED)
}

/// Rebuilds `basis ^ exponent` from a product's pair.
pub(crate) fn recombine_factor(basis: &Ex, exponent: &Ex, evaluated: bool) -> Ex {
    if exponent.is_one() {
        return basis.clone();
    }
    let flags = if evaluated { status_flags::EVALUATED } else { 0 };
    Ex::with_flags(
        Kind::Power {
            basis: basis.clone(),
            exponent: exponent.clone(),
        },
        flags,
    )
}

impl From<i64> for Ex {
    fn from(value: i64) -> Self {
        Ex::integer(value)
    }
}

impl From<i32> for Ex {
    fn from(value: i32) -> Self {
        Ex::integer(i64::from(value))
    }
}

impl From<Numeric> for Ex {
    fn from(value: Numeric) -> Self {
        Ex::num(value)
    }
}

impl From<Rational> for Ex {
    fn from(value: Rational) -> Self {
        Ex::num(Numeric::from_rational(value))
    }
}

impl From<&Ex> for Ex {
    fn from(value: &Ex) -> Self {
        value.clone()
    }
}

// Operators build unevaluated nodes.

impl Add for &Ex {
    type Output = Ex;

    fn add(self, rhs: Self) -> Ex {
        Ex::add([self.clone(), rhs.clone()])
    }
}

impl Add for Ex {
    type Output = Ex;

    fn add(self, rhs: Self) -> Ex {
        Ex::add([self, rhs])
    }
}

impl Sub for &Ex {
    type Output = Ex;

    fn sub(self, rhs: Self) -> Ex {
        Ex::add([self.clone(), -rhs])
    }
}

impl Sub for Ex {
    type Output = Ex;

    fn sub(self, rhs: Self) -> Ex {
        &self - &rhs
    }
}

impl Mul for &Ex {
    type Output = Ex;

    fn mul(self, rhs: Self) -> Ex {
        Ex::mul([self.clone(), rhs.clone()])
    }
}

impl Mul for Ex {
    type Output = Ex;

    fn mul(self, rhs: Self) -> Ex {
        Ex::mul([self, rhs])
    }
}

impl Div for &Ex {
    type Output = Ex;

    fn div(self, rhs: Self) -> Ex {
        Ex::mul([self.clone(), rhs.pow(Ex::minus_one())])
    }
}

impl Div for Ex {
    type Output = Ex;

    fn div(self, rhs: Self) -> Ex {
        &self / &rhs
    }
}

// Mixed owned/borrowed operands delegate to the borrowed impls.
macro_rules! mixed_binop {
    ($($imp:ident, $method:ident);* $(;)?) => {$(
        impl $imp<&Ex> for Ex {
            type Output = Ex;

            fn $method(self, rhs: &Ex) -> Ex {
                <&Ex as $imp>::$method(&self, rhs)
            }
        }

        impl $imp<Ex> for &Ex {
            type Output = Ex;

            fn $method(self, rhs: Ex) -> Ex {
                <&Ex as $imp>::$method(self, &rhs)
            }
        }
    )*};
}

mixed_binop!(Add, add; Sub, sub; Mul, mul; Div, div);

impl Neg for &Ex {
    type Output = Ex;

    fn neg(self) -> Ex {
        Ex::mul([self.clone(), Ex::minus_one()])
    }
}

impl Neg for Ex {
    type Output = Ex;

    fn neg(self) -> Ex {
        -&self
    }
}
