//! # ansatz-core
//!
//! Expression graph and rewrite engine for the ansatz symbolic engine.
//!
//! This crate provides:
//! - Reference-counted, copy-on-write expression nodes
//! - A canonical hash and total order over expressions
//! - Structural pattern matching and substitution
//! - Bottom-up evaluation to canonical form, with per-variant rule sets
//! - Expansion, collection, degree/coefficient queries and differentiation
//!
//! ## Design Principles
//!
//! - **Shared Immutable Nodes**: an [`Ex`] is an `Arc` handle; nodes are only
//!   mutated in place when the handle is their sole owner
//! - **Evaluate Once**: evaluated nodes carry a flag and are returned as they
//!   are on re-evaluation
//! - **Explicit Budget**: recursion depth is a value threaded through
//!   evaluation, and running out of it is an ordinary [`Error`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod add;
mod compare;
pub mod config;
pub mod error;
mod eval;
pub mod expand;
mod function;
pub mod handle;
mod hash;
mod lst;
mod mul;
mod ncmul;
pub mod node;
pub mod pattern;
mod power;
mod print;
mod relational;
pub mod symbol;
mod traversal;

#[cfg(test)]
mod proptests;

pub use config::{Budget, EvalConfig};
pub use error::{Error, ErrorKind, Result};
pub use expand::ExpandOptions;
pub use handle::Ex;
pub use node::{status_flags, Constant, Func, Kind, Node, RelOp, Symbol, TypeTag};
pub use pattern::{Bindings, SubsMode};
pub use symbol::SymbolTable;
