// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! The quantum object.
//!
//! A [`Qobj`] is a sparse complex matrix tagged with tensor dims. The dims
//! decide what the matrix represents (ket, bra, operator, vectorized
//! operator or superoperator); the matrix shape always equals the dims
//! products.
//!
//! Three predicates are memoized per object: the type derived from dims,
//! Hermiticity and unitarity. Every operation assigns them explicitly on its
//! result, either by propagating a known value or by leaving the cache empty
//! so the next query recomputes it.
//!
//! # Example
//!
//! ```ignore
//! use qubit_os_qobj::Qobj;
//!
//! let sx = Qobj::new(vec![vec![0.0, 1.0], vec![1.0, 0.0]])?;
//! let h = &(&sx * 0.5) + 1.0;
//! assert!(h.isherm());
//! let u = (&sx * Complex64::new(0.0, -0.3)).expm()?;
//! assert!(u.isunitary());
//! ```

mod arith;
mod format;
mod functions;
mod input;
mod spectral;

pub use format::LATEX_TRUNCATE;
pub use input::QobjInput;
pub use spectral::BasisInput;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::config::Settings;
use crate::dims::{DimSide, Dims, QobjType};
use crate::error::{Error, Result};
use crate::sparse::CsrMatrix;

/// Representation of a superoperator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuperRep {
    /// Liouville (column-stacking) form
    Super,
    /// Choi matrix
    Choi,
}

impl SuperRep {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SuperRep::Super => "super",
            SuperRep::Choi => "choi",
        }
    }
}

impl fmt::Display for SuperRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuperRep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "super" => Ok(SuperRep::Super),
            "choi" => Ok(SuperRep::Choi),
            other => Err(Error::InvalidArgument(format!(
                "unknown super representation '{}'",
                other
            ))),
        }
    }
}

/// Trace value: real for Hermitian objects, complex otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Real(f64),
    Complex(Complex64),
}

impl Scalar {
    /// Value as a complex number.
    pub fn to_complex(self) -> Complex64 {
        match self {
            Scalar::Real(x) => Complex64::new(x, 0.0),
            Scalar::Complex(c) => c,
        }
    }

    /// Real part.
    pub fn re(self) -> f64 {
        self.to_complex().re
    }
}

/// Diagonal entries: real for Hermitian objects with negligible imaginary
/// parts, complex otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagonal {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

impl Diagonal {
    /// Entries as complex numbers.
    pub fn to_complex(&self) -> Vec<Complex64> {
        match self {
            Diagonal::Real(v) => v.iter().map(|&x| Complex64::new(x, 0.0)).collect(),
            Diagonal::Complex(v) => v.clone(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Diagonal::Real(v) => v.len(),
            Diagonal::Complex(v) => v.len(),
        }
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Quantum object: a sparse matrix with tensor dims and cached predicates.
///
/// `Clone` shares the sparse buffer (copy-on-write); [`Qobj::copy`] makes a
/// deep copy.
#[derive(Debug, Clone)]
pub struct Qobj {
    data: Arc<CsrMatrix>,
    dims: Dims,
    superrep: Option<SuperRep>,
    settings: Settings,
    qtype: Cell<Option<QobjType>>,
    isherm: Cell<Option<bool>>,
    isunitary: Cell<Option<bool>>,
}

impl Default for Qobj {
    fn default() -> Self {
        Self::from_parts(CsrMatrix::zeros(1, 1), Dims::flat(1, 1), Settings::default())
    }
}

impl Qobj {
    /// Build a quantum object with inferred dims.
    pub fn new(input: impl Into<QobjInput>) -> Result<Self> {
        Self::builder(input).build()
    }

    /// Start a builder for finer control (dims, type, hints, settings).
    pub fn builder(input: impl Into<QobjInput>) -> QobjBuilder {
        QobjBuilder::new(input.into())
    }

    /// Zero object with the given dims.
    pub fn zeros(dims: Dims) -> Self {
        let (rows, cols) = dims.shape();
        Self::from_parts(CsrMatrix::zeros(rows, cols), dims, Settings::default())
    }

    /// Identity operator on a space with the given factors.
    pub fn identity(factors: &[usize]) -> Self {
        let n = factors.iter().product();
        let out = Self::from_parts(
            CsrMatrix::identity(n),
            Dims::oper(factors),
            Settings::default(),
        );
        out.isherm.set(Some(true));
        out.isunitary.set(Some(true));
        out
    }

    /// Assemble a result with empty caches and no representation tag.
    pub(crate) fn from_parts(data: CsrMatrix, dims: Dims, settings: Settings) -> Self {
        Self::from_shared(Arc::new(data), dims, settings)
    }

    pub(crate) fn from_shared(data: Arc<CsrMatrix>, dims: Dims, settings: Settings) -> Self {
        Self {
            data,
            dims,
            superrep: None,
            settings,
            qtype: Cell::new(None),
            isherm: Cell::new(None),
            isunitary: Cell::new(None),
        }
    }

    /// Run automatic tidy-up when the settings ask for it.
    pub(crate) fn finish(mut self) -> Self {
        if self.settings.auto_tidyup {
            let before = self.data.nnz();
            self.tidyup(None);
            if self.data.nnz() != before {
                trace!(
                    pruned = before - self.data.nnz(),
                    atol = self.settings.auto_tidyup_atol,
                    "auto tidy-up"
                );
            }
        }
        self
    }

    pub(crate) fn with_superrep(mut self, superrep: Option<SuperRep>) -> Self {
        self.superrep = superrep;
        self
    }

    pub(crate) fn with_isherm(self, isherm: Option<bool>) -> Self {
        self.isherm.set(isherm);
        self
    }

    pub(crate) fn with_isunitary(self, isunitary: Option<bool>) -> Self {
        self.isunitary.set(isunitary);
        self
    }

    /// Deep copy: new buffer, same dims, tags and cached predicates.
    pub fn copy(&self) -> Self {
        Self {
            data: Arc::new(self.data.as_ref().clone()),
            ..self.clone()
        }
    }

    /// Sparse data.
    pub fn data(&self) -> &CsrMatrix {
        &self.data
    }

    /// Mutable sparse data; detaches a shared buffer first.
    pub(crate) fn data_mut(&mut self) -> &mut CsrMatrix {
        Arc::make_mut(&mut self.data)
    }

    /// Whether two objects share one sparse buffer.
    pub fn shares_data_with(&self, other: &Qobj) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Tensor dims.
    pub fn dims(&self) -> &Dims {
        &self.dims
    }

    /// Replace dims; the products must match the data shape.
    pub fn set_dims(&mut self, dims: Dims) -> Result<()> {
        check_dims(&dims, self.data.shape())?;
        self.dims = dims;
        self.qtype.set(None);
        Ok(())
    }

    /// Matrix shape `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// Numeric settings carried by this object.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the numeric settings.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Type derived from dims (memoized).
    pub fn qtype(&self) -> QobjType {
        if let Some(t) = self.qtype.get() {
            return t;
        }
        let t = self.dims.qtype();
        self.qtype.set(Some(t));
        t
    }

    pub fn is_ket(&self) -> bool {
        self.qtype() == QobjType::Ket
    }

    pub fn is_bra(&self) -> bool {
        self.qtype() == QobjType::Bra
    }

    pub fn is_oper(&self) -> bool {
        self.qtype() == QobjType::Oper
    }

    pub fn is_super(&self) -> bool {
        self.qtype() == QobjType::Super
    }

    pub fn is_operket(&self) -> bool {
        self.qtype() == QobjType::OperatorKet
    }

    pub fn is_operbra(&self) -> bool {
        self.qtype() == QobjType::OperatorBra
    }

    /// Whether the object equals its adjoint within `settings.atol`
    /// (memoized).
    pub fn isherm(&self) -> bool {
        if let Some(h) = self.isherm.get() {
            return h;
        }
        let h = self.data.is_hermitian(self.settings.atol);
        self.isherm.set(Some(h));
        h
    }

    /// Cached Hermiticity without computing it.
    pub fn isherm_cached(&self) -> Option<bool> {
        self.isherm.get()
    }

    /// Override the Hermiticity cache.
    pub fn set_isherm(&self, isherm: Option<bool>) {
        self.isherm.set(isherm);
    }

    /// Drop the Hermiticity cache and recompute it.
    pub fn check_herm(&self) -> bool {
        self.isherm.set(None);
        self.isherm()
    }

    /// Whether `A·A† = I` and `A†·A = I` within `settings.atol` (memoized).
    ///
    /// Only square operators can be unitary.
    pub fn isunitary(&self) -> bool {
        if let Some(u) = self.isunitary.get() {
            return u;
        }
        let u = self.check_isunitary();
        self.isunitary.set(Some(u));
        u
    }

    /// Cached unitarity without computing it.
    pub fn isunitary_cached(&self) -> Option<bool> {
        self.isunitary.get()
    }

    /// Override the unitarity cache.
    pub fn set_isunitary(&self, isunitary: Option<bool>) {
        self.isunitary.set(isunitary);
    }

    fn check_isunitary(&self) -> bool {
        if !self.is_oper() || !self.data.is_square() {
            return false;
        }
        let adj = self.data.adjoint();
        let eye = CsrMatrix::identity(self.data.rows());
        let close_to_identity = |m: Result<CsrMatrix>| {
            m.and_then(|m| m.sub(&eye))
                .map(|d| d.max_abs() <= self.settings.atol)
                .unwrap_or(false)
        };
        close_to_identity(self.data.matmul(&adj)) && close_to_identity(adj.matmul(&self.data))
    }

    /// Superoperator representation; `Super` for untagged superoperators.
    pub fn superrep(&self) -> Option<SuperRep> {
        match self.superrep {
            Some(rep) => Some(rep),
            None if self.is_super() => Some(SuperRep::Super),
            None => None,
        }
    }

    /// Set the superoperator representation tag.
    pub fn set_superrep(&mut self, superrep: Option<SuperRep>) {
        self.superrep = superrep;
    }

    /// Raw tag, without the superoperator default.
    pub(crate) fn superrep_tag(&self) -> Option<SuperRep> {
        self.superrep
    }
}

fn check_dims(dims: &Dims, shape: (usize, usize)) -> Result<()> {
    if dims.shape() != shape {
        return Err(Error::DimensionMismatch(format!(
            "dims {} imply shape {:?} but data has shape {:?}",
            dims,
            dims.shape(),
            shape
        )));
    }
    Ok(())
}

/// Builder for [`Qobj`].
#[derive(Debug, Clone)]
pub struct QobjBuilder {
    input: QobjInput,
    dims: Option<Dims>,
    shape: Option<(usize, usize)>,
    qtype: Option<QobjType>,
    isherm: Option<bool>,
    isunitary: Option<bool>,
    superrep: Option<SuperRep>,
    settings: Option<Settings>,
}

impl QobjBuilder {
    fn new(input: QobjInput) -> Self {
        Self {
            input,
            dims: None,
            shape: None,
            qtype: None,
            isherm: None,
            isunitary: None,
            superrep: None,
            settings: None,
        }
    }

    /// Explicit tensor dims.
    pub fn dims(mut self, dims: Dims) -> Self {
        self.dims = Some(dims);
        self
    }

    /// Shape for an empty object without dims.
    pub fn shape(mut self, rows: usize, cols: usize) -> Self {
        self.shape = Some((rows, cols));
        self
    }

    /// Requested type. Only `Super` changes construction: without explicit
    /// dims, square data of side `s²` gets superoperator dims over `[s]`.
    pub fn qtype(mut self, qtype: QobjType) -> Self {
        self.qtype = Some(qtype);
        self
    }

    /// Hermiticity hint.
    pub fn isherm(mut self, isherm: bool) -> Self {
        self.isherm = Some(isherm);
        self
    }

    /// Unitarity hint.
    pub fn isunitary(mut self, isunitary: bool) -> Self {
        self.isunitary = Some(isunitary);
        self
    }

    /// Superoperator representation tag.
    pub fn superrep(mut self, superrep: SuperRep) -> Self {
        self.superrep = Some(superrep);
        self
    }

    /// Numeric settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the object.
    pub fn build(self) -> Result<Qobj> {
        let mut inherited_superrep = None;
        let mut inherited_isunitary = None;
        let mut inherited_settings = None;
        let explicit_dims = self.dims.is_some();

        let (data, dims) = match self.input {
            QobjInput::Empty => match (self.dims, self.shape) {
                (Some(dims), _) => {
                    let (rows, cols) = dims.shape();
                    (CsrMatrix::zeros(rows, cols), dims)
                }
                (None, Some((rows, cols))) => (CsrMatrix::zeros(rows, cols), Dims::flat(rows, cols)),
                (None, None) => (CsrMatrix::zeros(1, 1), Dims::flat(1, 1)),
            },
            QobjInput::Unsupported(description) => {
                warn!(
                    input = %description,
                    "Initializing quantum object from unsupported input"
                );
                (CsrMatrix::zeros(1, 1), Dims::flat(1, 1))
            }
            other => {
                let (data, inferred) = match other {
                    QobjInput::Qobj(q) => {
                        inherited_superrep = q.superrep;
                        inherited_isunitary = q.isunitary.get();
                        inherited_settings = Some(q.settings);
                        (q.data.as_ref().clone(), q.dims.clone())
                    }
                    QobjInput::Rows(rows) => {
                        let n_cols = rows.first().map_or(0, Vec::len);
                        if let Some(bad) = rows.iter().position(|r| r.len() != n_cols) {
                            return Err(Error::ShapeMismatch(format!(
                                "row {} has {} entries, expected {}",
                                bad,
                                rows[bad].len(),
                                n_cols
                            )));
                        }
                        let shape = (rows.len(), n_cols);
                        let triplets = rows.into_iter().enumerate().flat_map(|(i, row)| {
                            row.into_iter().enumerate().map(move |(j, v)| (i, j, v))
                        });
                        let data = CsrMatrix::from_triplets(shape, triplets);
                        (data, Dims::flat(shape.0, shape.1))
                    }
                    QobjInput::Vector(v) => column(v),
                    QobjInput::DenseVector(v) => column(v.to_vec()),
                    QobjInput::Dense(a) => {
                        let (rows, cols) = a.dim();
                        (CsrMatrix::from_dense(&a), Dims::flat(rows, cols))
                    }
                    QobjInput::Sparse(m) => {
                        let (rows, cols) = m.shape();
                        (m, Dims::flat(rows, cols))
                    }
                    QobjInput::Scalar(c) => (
                        CsrMatrix::from_triplets((1, 1), [(0, 0, c)]),
                        Dims::flat(1, 1),
                    ),
                    QobjInput::Empty | QobjInput::Unsupported(_) => {
                        (CsrMatrix::zeros(1, 1), Dims::flat(1, 1))
                    }
                };
                match self.dims {
                    Some(dims) => {
                        check_dims(&dims, data.shape())?;
                        (data, dims)
                    }
                    None => (data, inferred),
                }
            }
        };

        let dims = if self.qtype == Some(QobjType::Super) && !explicit_dims {
            super_dims_for(data.shape())?
        } else {
            dims
        };

        let settings = self
            .settings
            .or(inherited_settings)
            .unwrap_or_default();
        let mut out = Qobj::from_parts(data, dims, settings);
        out.superrep = self.superrep.or(inherited_superrep);
        if out.superrep.is_none() && out.is_super() {
            out.superrep = Some(SuperRep::Super);
        }
        out.isherm.set(self.isherm);
        out.isunitary.set(self.isunitary.or(inherited_isunitary));
        Ok(out)
    }
}

fn column(v: Vec<Complex64>) -> (CsrMatrix, Dims) {
    let n = v.len();
    let data = CsrMatrix::from_triplets((n, 1), v.into_iter().enumerate().map(|(i, x)| (i, 0, x)));
    (data, Dims::flat(n, 1))
}

/// Superoperator dims for square data of side `s²`.
fn super_dims_for(shape: (usize, usize)) -> Result<Dims> {
    let (rows, cols) = shape;
    if rows != cols {
        return Err(Error::InvalidShapeForSuper(format!(
            "data of shape {:?} is not square",
            shape
        )));
    }
    let side = (rows as f64).sqrt().round() as usize;
    if side * side != rows {
        return Err(Error::InvalidShapeForSuper(format!(
            "side length {} is not a perfect square",
            rows
        )));
    }
    Ok(Dims::new(
        DimSide::Nested(vec![vec![side], vec![side]]),
        DimSide::Nested(vec![vec![side], vec![side]]),
    ))
}
