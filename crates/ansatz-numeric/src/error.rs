//! Errors raised by numeric arithmetic.

use thiserror::Error;

/// A failed numeric operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NumericError {
    /// Division by zero, including raising zero to a non-positive power.
    #[error("division by zero")]
    DivisionByZero,
}
