//! Errors raised by expression operations.

use ansatz_numeric::NumericError;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`], for callers that only need to know
/// which kind of failure occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A mathematically undefined operation.
    Domain,
    /// A singularity such as division by zero.
    Pole,
    /// A resource budget was exhausted.
    ResourceExhausted,
    /// The API was used in a way the node protocol forbids.
    ProtocolMisuse,
    /// An argument had the wrong shape.
    MalformedInput,
}

/// Errors that can occur while building, evaluating or transforming
/// expressions.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A mathematically undefined operation, such as `0^0`.
    #[error("domain error: {0}")]
    Domain(&'static str),

    /// A singularity, such as `0^(-1)` or `ln(0)`.
    #[error("pole: {0}")]
    Pole(&'static str),

    /// Evaluation nested deeper than the configured budget.
    #[error("recursion limit of {limit} exceeded")]
    RecursionLimit {
        /// The configured maximum depth.
        limit: usize,
    },

    /// In-place mutation of a node that has other owners.
    #[error("node is shared and cannot be modified in place")]
    NotModifiable,

    /// Child access past the last child.
    #[error("child index {index} out of range for node with {nops} children")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of children of the node.
        nops: usize,
    },

    /// An operation the node's variant does not provide.
    #[error("{operation} is not supported on {tag} nodes")]
    Unsupported {
        /// The operation attempted.
        operation: &'static str,
        /// Type tag name of the node.
        tag: &'static str,
    },

    /// An argument of the wrong shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Degree asked of an expression with a non-integer power of the
    /// variable.
    #[error("undefined degree because of non-integer exponent")]
    UndefinedDegree,

    /// A degree too large for a machine integer.
    #[error("degree does not fit in a 64-bit integer")]
    DegreeOverflow,
}

impl Error {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Domain(_) => ErrorKind::Domain,
            Error::Pole(_) => ErrorKind::Pole,
            Error::RecursionLimit { .. } | Error::DegreeOverflow => ErrorKind::ResourceExhausted,
            Error::NotModifiable | Error::IndexOutOfRange { .. } | Error::Unsupported { .. } => {
                ErrorKind::ProtocolMisuse
            }
            Error::InvalidArgument(_) | Error::UndefinedDegree => ErrorKind::MalformedInput,
        }
    }
}

impl From<NumericError> for Error {
    fn from(err: NumericError) -> Self {
        match err {
            NumericError::DivisionByZero => Error::Pole("division by zero"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(Error::Domain("0^0").kind(), ErrorKind::Domain);
        assert_eq!(Error::RecursionLimit { limit: 3 }.kind(), ErrorKind::ResourceExhausted);
        assert_eq!(Error::NotModifiable.kind(), ErrorKind::ProtocolMisuse);
        assert_eq!(
            Error::InvalidArgument("x".into()).kind(),
            ErrorKind::MalformedInput
        );
        assert_eq!(Error::from(NumericError::DivisionByZero).kind(), ErrorKind::Pole);
    }
}
