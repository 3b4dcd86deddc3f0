// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! QubitOS quantum objects
//!
//! This crate provides the quantum-object type used by QubitOS: kets, bras,
//! operators, vectorized operators and superoperators stored as sparse
//! complex matrices with tensor-dimension bookkeeping.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Time-dependent composition (td)        │
//! ├──────────────────┬──────────────────────┤
//! │ Matrix functions │   Spectral layer      │
//! ├──────────────────┴──────────────────────┤
//! │   Qobj core + algebra (qobj)             │
//! ├────────────────┬────────────────────────┤
//! │ Dims classifier│  CSR kernels, eigen,    │
//! │ (dims)         │  expm (sparse, linalg)  │
//! └────────────────┴────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`qobj`]: The quantum object, its algebra and matrix functions
//! - [`dims`]: Dimension descriptors and type classification
//! - [`sparse`]: Compressed sparse row matrices and norms
//! - [`linalg`]: Matrix exponential and eigensolvers
//! - [`td`]: Time-dependent composition and coefficient expressions
//! - [`config`]: Numeric settings
//! - [`error`]: Error types

pub mod config;
pub mod dims;
pub mod error;
pub mod linalg;
pub mod qobj;
pub mod sparse;
pub mod td;

pub use config::Settings;
pub use dims::{DimSide, Dims, QobjType};
pub use error::{Error, Result};
pub use linalg::{EigenOptions, SortOrder};
pub use qobj::{BasisInput, Diagonal, Qobj, QobjBuilder, QobjInput, Scalar, SuperRep};
pub use sparse::{CsrMatrix, MemoryOrder};
pub use td::{CoeffFn, TdArgs, TdElement};

#[cfg(test)]
pub mod test_utils;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
