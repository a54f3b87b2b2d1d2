//! # Ansatz
//!
//! A symbolic expression engine with canonical forms and rule-based
//! evaluation.
//!
//! Expressions are immutable, reference-counted trees. Building one is
//! cheap and performs no simplification; [`Ex::eval`](ansatz_core::Ex::eval)
//! brings it to canonical form, after which structural equality is
//! mathematical equality for the supported identities.
//!
//! ## Features
//!
//! - **Exact Arithmetic**: arbitrary precision integers, rationals and
//!   Gaussian rationals, with floating-point values kept apart
//! - **Canonical Sums and Products**: like terms and like powers merge
//! - **Pattern Matching**: wildcards, substitution and `has`
//! - **Polynomial Queries**: expand, collect, degree and coefficients
//! - **Differentiation**: including derivatives of unknown functions
//!
//! ## Quick Start
//!
//! ```rust
//! use ansatz::prelude::*;
//!
//! let mut symbols = SymbolTable::new();
//! let x = symbols.symbol("x");
//!
//! let e = (&x + &Ex::integer(1)).pow(2);
//! let expanded = e.expand().unwrap();
//! assert_eq!(expanded.coeff(&x, 1).unwrap(), Ex::integer(2));
//! assert_eq!(expanded.degree(&x).unwrap(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use ansatz_core as core;
pub use ansatz_numeric as numeric;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use ansatz_core::{
        Bindings, Constant, Error, EvalConfig, Ex, ExpandOptions, Func, Kind, RelOp, Result,
        SubsMode, SymbolTable, TypeTag,
    };
    pub use ansatz_numeric::{Integer, Numeric, Rational};
}
