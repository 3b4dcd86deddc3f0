// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Accepted constructor inputs.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use super::Qobj;
use crate::sparse::CsrMatrix;

/// Numeric data a quantum object can be built from.
///
/// Conversions exist from the natural Rust types, so constructors accept
/// `f64`, `Complex64`, `Vec`s, nested `Vec`s, ndarray arrays, CSR matrices
/// and other quantum objects directly.
#[derive(Debug, Clone, Default)]
pub enum QobjInput {
    /// No data: a zero matrix shaped by the requested dims or shape.
    #[default]
    Empty,
    /// Copy of another quantum object.
    Qobj(Qobj),
    /// Row-major nested rows; all rows must have the same length.
    Rows(Vec<Vec<Complex64>>),
    /// One-dimensional data, taken as a column vector.
    Vector(Vec<Complex64>),
    /// Dense matrix.
    Dense(Array2<Complex64>),
    /// Dense one-dimensional data, taken as a column vector.
    DenseVector(Array1<Complex64>),
    /// Sparse matrix.
    Sparse(CsrMatrix),
    /// Single number, stored as a 1×1 matrix.
    Scalar(Complex64),
    /// Anything else, described for diagnostics.
    Unsupported(String),
}

impl QobjInput {
    /// Short name of the input kind.
    pub fn kind(&self) -> &'static str {
        match self {
            QobjInput::Empty => "empty",
            QobjInput::Qobj(_) => "qobj",
            QobjInput::Rows(_) => "rows",
            QobjInput::Vector(_) => "vector",
            QobjInput::Dense(_) => "dense",
            QobjInput::DenseVector(_) => "dense-vector",
            QobjInput::Sparse(_) => "sparse",
            QobjInput::Scalar(_) => "scalar",
            QobjInput::Unsupported(_) => "unsupported",
        }
    }
}

fn real(x: f64) -> Complex64 {
    Complex64::new(x, 0.0)
}

impl From<f64> for QobjInput {
    fn from(x: f64) -> Self {
        QobjInput::Scalar(real(x))
    }
}

impl From<i32> for QobjInput {
    fn from(x: i32) -> Self {
        QobjInput::Scalar(real(x as f64))
    }
}

impl From<Complex64> for QobjInput {
    fn from(c: Complex64) -> Self {
        QobjInput::Scalar(c)
    }
}

impl From<Vec<Complex64>> for QobjInput {
    fn from(v: Vec<Complex64>) -> Self {
        QobjInput::Vector(v)
    }
}

impl From<Vec<f64>> for QobjInput {
    fn from(v: Vec<f64>) -> Self {
        QobjInput::Vector(v.into_iter().map(real).collect())
    }
}

impl From<Vec<Vec<Complex64>>> for QobjInput {
    fn from(rows: Vec<Vec<Complex64>>) -> Self {
        QobjInput::Rows(rows)
    }
}

impl From<Vec<Vec<f64>>> for QobjInput {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        QobjInput::Rows(
            rows.into_iter()
                .map(|r| r.into_iter().map(real).collect())
                .collect(),
        )
    }
}

impl From<Array2<Complex64>> for QobjInput {
    fn from(a: Array2<Complex64>) -> Self {
        QobjInput::Dense(a)
    }
}

impl From<Array2<f64>> for QobjInput {
    fn from(a: Array2<f64>) -> Self {
        QobjInput::Dense(a.mapv(real))
    }
}

impl From<Array1<Complex64>> for QobjInput {
    fn from(a: Array1<Complex64>) -> Self {
        QobjInput::DenseVector(a)
    }
}

impl From<CsrMatrix> for QobjInput {
    fn from(m: CsrMatrix) -> Self {
        QobjInput::Sparse(m)
    }
}

impl From<Qobj> for QobjInput {
    fn from(q: Qobj) -> Self {
        QobjInput::Qobj(q)
    }
}

impl From<&Qobj> for QobjInput {
    fn from(q: &Qobj) -> Self {
        QobjInput::Qobj(q.clone())
    }
}
