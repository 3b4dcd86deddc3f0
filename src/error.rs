// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for quantum object operations.

use std::fmt;

/// Result type alias for quantum object operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Quantum object error types.
///
/// Every variant is fatal to the operation that raised it. Non-fatal
/// conditions (representation mismatches, degenerate ground states,
/// unsupported constructor input) are reported through `tracing` instead.
#[derive(Debug)]
pub enum Error {
    /// Operands have different tensor dimensions
    DimensionMismatch(String),
    /// Operands have equal dims but different matrix shapes
    ShapeMismatch(String),
    /// Factors of a product are not conformable
    IncompatibleShape(String),
    /// Operation is not defined for these operands
    UnsupportedOperation(String),
    /// Exponent is negative or not an integer
    InvalidExponent(String),
    /// Data cannot be interpreted as a superoperator
    InvalidShapeForSuper(String),
    /// Unrecognized option value (norm name, method, sort order, ...)
    InvalidArgument(String),
    /// Operation requires a different kind of quantum object
    Type(String),
    /// Basis list length does not match the object
    SizeMismatch(String),
    /// Malformed time-dependent description
    Format(String),
    /// Coefficient expression could not be parsed or evaluated
    Expression(String),
    /// Iterative solver did not converge
    NoConvergence(String),
    /// Configuration error
    Config(String),
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DimensionMismatch(msg) => write!(f, "Dimension mismatch: {}", msg),
            Error::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            Error::IncompatibleShape(msg) => write!(f, "Incompatible shapes: {}", msg),
            Error::UnsupportedOperation(msg) => write!(f, "Unsupported operation: {}", msg),
            Error::InvalidExponent(msg) => write!(f, "Invalid exponent: {}", msg),
            Error::InvalidShapeForSuper(msg) => {
                write!(f, "Invalid shape for a super operator: {}", msg)
            }
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::Type(msg) => write!(f, "Type error: {}", msg),
            Error::SizeMismatch(msg) => write!(f, "Size mismatch: {}", msg),
            Error::Format(msg) => write!(f, "Format error: {}", msg),
            Error::Expression(msg) => write!(f, "Expression error: {}", msg),
            Error::NoConvergence(msg) => write!(f, "No convergence: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
