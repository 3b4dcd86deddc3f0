// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sparse storage backing every quantum object.

mod csr;
pub mod norms;

pub use csr::{CsrMatrix, MemoryOrder};
