//! Expression node types.
//!
//! A [`Node`] is one vertex of the expression graph: a variant ([`Kind`])
//! plus a cached hash and a set of status flags. Nodes are only ever touched
//! through [`Ex`] handles.

use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

use ansatz_numeric::Numeric;

use crate::handle::Ex;

/// Status flag bits stored on every node.
pub mod status_flags {
    /// The node is a fixed point of evaluation.
    pub const EVALUATED: u8 = 1 << 0;
    /// The node is fully expanded.
    pub const EXPANDED: u8 = 1 << 1;
    /// The cached hash value is valid.
    pub const HASH_CALCULATED: u8 = 1 << 2;
}

/// Sorted `(term, coefficient)` pairs of a sum.
pub type Terms = SmallVec<[(Ex, Numeric); 4]>;

/// Sorted `(basis, exponent)` pairs of a product.
pub type Factors = SmallVec<[(Ex, Ex); 4]>;

/// Function arguments.
pub type Args = SmallVec<[Ex; 2]>;

/// Stable per-variant type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeTag {
    /// Numeric literal.
    Numeric,
    /// Symbol.
    Symbol,
    /// Named mathematical constant.
    Constant,
    /// Pattern wildcard.
    Wildcard,
    /// Sum.
    Add,
    /// Commutative product.
    Mul,
    /// Power.
    Power,
    /// Noncommutative product.
    NcMul,
    /// Function application.
    Function,
    /// Derivative of an opaque function.
    FDerivative,
    /// Relation between two expressions.
    Relational,
    /// Ordered list.
    List,
}

impl TypeTag {
    /// Returns the stable name of the tag.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Numeric => "numeric",
            TypeTag::Symbol => "symbol",
            TypeTag::Constant => "constant",
            TypeTag::Wildcard => "wildcard",
            TypeTag::Add => "add",
            TypeTag::Mul => "mul",
            TypeTag::Power => "power",
            TypeTag::NcMul => "ncmul",
            TypeTag::Function => "function",
            TypeTag::FDerivative => "fderivative",
            TypeTag::Relational => "relational",
            TypeTag::List => "lst",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named symbol with a process-unique serial number.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub(crate) serial: u32,
    pub(crate) name: Arc<str>,
    pub(crate) commutative: bool,
}

impl Symbol {
    /// Unique serial number; two symbols are equal iff their serials are.
    #[must_use]
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns false for noncommutative symbols.
    #[must_use]
    pub fn is_commutative(&self) -> bool {
        self.commutative
    }
}

/// A named mathematical constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Constant {
    /// Archimedes' constant.
    Pi,
    /// The Euler-Mascheroni constant.
    Euler,
    /// Catalan's constant.
    Catalan,
}

impl Constant {
    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Constant::Pi => "Pi",
            Constant::Euler => "Euler",
            Constant::Catalan => "Catalan",
        }
    }

    /// Double precision value.
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            Constant::Pi => std::f64::consts::PI,
            Constant::Euler => 0.577_215_664_901_532_9,
            Constant::Catalan => 0.915_965_594_177_219,
        }
    }
}

/// A function head.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Func {
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Natural exponential.
    Exp,
    /// Natural logarithm.
    Ln,
    /// An opaque user function with no evaluation rules.
    Named(Arc<str>),
}

impl Func {
    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Exp => "exp",
            Func::Ln => "ln",
            Func::Named(name) => name,
        }
    }

    /// Builtins take exactly one argument.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Func::Named(_))
    }
}

/// Relational operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl RelOp {
    /// Operator symbol.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }
}

/// The variant payload of a node.
#[derive(Clone, Debug)]
pub enum Kind {
    // === Atoms ===
    /// A numeric literal.
    Numeric(Numeric),

    /// A symbolic variable.
    Symbol(Symbol),

    /// A named constant.
    Constant(Constant),

    /// A pattern wildcard with a label.
    Wildcard(u32),

    // === Containers ===
    /// Sum `constant + sum(coeff * term)`.
    ///
    /// Once evaluated: terms sorted by canonical order, no term is a numeric,
    /// a sum, or a product with a coefficient other than one, and no
    /// coefficient is zero.
    Add {
        /// Term/coefficient pairs.
        terms: Terms,
        /// Overall additive constant.
        constant: Numeric,
    },

    /// Commutative product `coeff * prod(basis ^ exponent)`.
    ///
    /// Once evaluated: bases sorted by canonical order and pairwise distinct,
    /// every exponent is numeric, a numeric basis only carries a fractional
    /// exponent, no basis with exponent one is a product, and at most one
    /// factor is noncommutative.
    Mul {
        /// Basis/exponent pairs.
        factors: Factors,
        /// Overall numeric coefficient.
        coeff: Numeric,
    },

    /// `basis ^ exponent`.
    Power {
        /// The basis.
        basis: Ex,
        /// The exponent.
        exponent: Ex,
    },

    /// Ordered product of noncommutative factors.
    NcMul(SmallVec<[Ex; 4]>),

    /// A function application.
    Function {
        /// The function head.
        func: Func,
        /// The arguments.
        args: Args,
    },

    /// Partial derivative of an opaque function.
    FDerivative {
        /// The differentiated function.
        func: Func,
        /// Sorted multiset of argument positions differentiated by.
        params: Vec<usize>,
        /// The arguments.
        args: Args,
    },

    /// `lhs op rhs`.
    Relational {
        /// Left-hand side.
        lhs: Ex,
        /// Right-hand side.
        rhs: Ex,
        /// The relation.
        op: RelOp,
    },

    /// An ordered list of expressions.
    List(Vec<Ex>),
}

impl Kind {
    /// Returns the type tag of this variant.
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        match self {
            Kind::Numeric(_) => TypeTag::Numeric,
            Kind::Symbol(_) => TypeTag::Symbol,
            Kind::Constant(_) => TypeTag::Constant,
            Kind::Wildcard(_) => TypeTag::Wildcard,
            Kind::Add { .. } => TypeTag::Add,
            Kind::Mul { .. } => TypeTag::Mul,
            Kind::Power { .. } => TypeTag::Power,
            Kind::NcMul(_) => TypeTag::NcMul,
            Kind::Function { .. } => TypeTag::Function,
            Kind::FDerivative { .. } => TypeTag::FDerivative,
            Kind::Relational { .. } => TypeTag::Relational,
            Kind::List(_) => TypeTag::List,
        }
    }

    /// Returns true if this variant has no children.
    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            Kind::Numeric(_) | Kind::Symbol(_) | Kind::Constant(_) | Kind::Wildcard(_)
        )
    }
}

/// A graph vertex: variant payload, status flags and cached hash.
pub struct Node {
    kind: Kind,
    flags: AtomicU8,
    hashvalue: AtomicU32,
}

impl Node {
    pub(crate) fn new(kind: Kind, flags: u8) -> Self {
        Self {
            kind,
            flags: AtomicU8::new(flags & !status_flags::HASH_CALCULATED),
            hashvalue: AtomicU32::new(0),
        }
    }

    /// The variant payload.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Current status flags.
    #[must_use]
    pub fn flags(&self) -> u8 {
        self.flags.load(Ordering::Acquire)
    }

    /// Returns true if all bits of `flag` are set.
    #[must_use]
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags() & flag == flag
    }

    pub(crate) fn set_flag(&self, flag: u8) {
        self.flags.fetch_or(flag, Ordering::AcqRel);
    }

    pub(crate) fn cached_hash(&self) -> Option<u32> {
        if self.has_flag(status_flags::HASH_CALCULATED) {
            Some(self.hashvalue.load(Ordering::Acquire))
        } else {
            None
        }
    }

    pub(crate) fn store_hash(&self, value: u32) {
        self.hashvalue.store(value, Ordering::Release);
        self.set_flag(status_flags::HASH_CALCULATED);
    }

    /// Mutable access for a uniquely owned node. Drops the cached hash.
    pub(crate) fn kind_mut(&mut self) -> &mut Kind {
        *self.flags.get_mut() &= !status_flags::HASH_CALCULATED;
        &mut self.kind
    }

    pub(crate) fn clear_flag_mut(&mut self, flag: u8) {
        *self.flags.get_mut() &= !flag;
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            flags: AtomicU8::new(self.flags()),
            hashvalue: AtomicU32::new(self.hashvalue.load(Ordering::Acquire)),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("flags", &self.flags())
            .finish()
    }
}
