// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Numeric kernels behind the matrix-function and spectral layers.

pub mod eigen;
pub mod expm;
mod lanczos;

pub use eigen::{eigs, EigenDecomposition, EigenOptions, SortOrder};
pub use expm::{inverse, matrix_exp, solve_linear, sparse_matrix_exp};
