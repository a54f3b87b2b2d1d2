//! # ansatz-numeric
//!
//! Numeric values for the ansatz expression engine.
//!
//! This crate wraps `dashu` to provide:
//! - Arbitrary precision integers (`Integer`)
//! - Arbitrary precision rationals (`Rational`)
//! - Exact or approximate complex scalars (`Numeric`)
//!
//! Exact values stay exact under arithmetic and under exponentiation whenever
//! the result is representable; approximate values are plain `f64` pairs.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod integer;
pub mod numeric;
pub mod rational;

#[cfg(test)]
mod proptests;

pub use error::NumericError;
pub use integer::Integer;
pub use numeric::Numeric;
pub use rational::Rational;
