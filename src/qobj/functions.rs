// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Matrix functions: adjoints, trace, norms, exponential and friends,
//! projectors, matrix elements and overlaps.

use ndarray::Array2;
use num_complex::Complex64;

use super::{Diagonal, Qobj, Scalar};
use crate::dims::{Dims, QobjType};
use crate::error::{Error, Result};
use crate::linalg::{self, EigenOptions};
use crate::sparse::{norms, CsrMatrix, MemoryOrder};

const I: Complex64 = Complex64::new(0.0, 1.0);

impl Qobj {
    /// Conjugate transpose. Keeps the Hermiticity flag and representation.
    pub fn dag(&self) -> Qobj {
        Qobj::from_parts(self.data.adjoint(), self.dims.swapped(), self.settings)
            .with_isherm(self.isherm.get())
            .with_superrep(self.superrep)
    }

    /// Transpose.
    pub fn trans(&self) -> Qobj {
        Qobj::from_parts(self.data.transpose(), self.dims.swapped(), self.settings)
    }

    /// Elementwise complex conjugate.
    pub fn conj(&self) -> Qobj {
        Qobj::from_parts(self.data.conj(), self.dims.clone(), self.settings)
    }

    /// Trace: real when the object is Hermitian, complex otherwise.
    pub fn tr(&self) -> Result<Scalar> {
        let t = self.data.trace()?;
        Ok(if self.isherm() {
            Scalar::Real(t.re)
        } else {
            Scalar::Complex(t)
        })
    }

    /// Default norm: trace norm for operators, L2 for vectors.
    pub fn norm(&self) -> Result<f64> {
        self.norm_with(None, &EigenOptions::default())
    }

    /// Named norm.
    ///
    /// Operators and superoperators accept `tr` (default), `fro`, `one` and
    /// `max`; vector-like objects accept `l2` (default) and `max`. The
    /// eigen options only affect the trace norm.
    pub fn norm_with(&self, name: Option<&str>, opts: &EigenOptions) -> Result<f64> {
        if self.qtype().is_operator_like() {
            match name.unwrap_or("tr") {
                "tr" => {
                    let aad = self.checked_mul(&self.dag())?;
                    let full = opts.eigvals(0);
                    let eig = linalg::eigs(aad.data(), aad.isherm(), &full, false)?;
                    Ok(eig.values.iter().map(|v| v.norm().sqrt()).sum())
                }
                "fro" => Ok(norms::frobenius(&self.data)),
                "one" => Ok(norms::one(&self.data)),
                "max" => Ok(norms::max(&self.data)),
                other => Err(Error::InvalidArgument(format!(
                    "operator norm must be 'tr', 'fro', 'one' or 'max', got '{}'",
                    other
                ))),
            }
        } else {
            match name.unwrap_or("l2") {
                "l2" => Ok(norms::l2(&self.data)),
                "max" => Ok(norms::max(&self.data)),
                other => Err(Error::InvalidArgument(format!(
                    "vector norm must be 'l2' or 'max', got '{}'",
                    other
                ))),
            }
        }
    }

    /// Diagonal entries.
    pub fn diag(&self) -> Diagonal {
        let d = self.data.diagonal();
        let atol = self.settings.atol;
        if d.iter().any(|v| v.im.abs() > atol) || !self.isherm() {
            Diagonal::Complex(d)
        } else {
            Diagonal::Real(d.into_iter().map(|v| v.re).collect())
        }
    }

    fn check_square_function(&self, what: &str) -> Result<()> {
        if !self.dims.left.leading_eq(&self.dims.right) || !self.data.is_square() {
            return Err(Error::ShapeMismatch(format!(
                "invalid operand for matrix {}: dims {}",
                what, self.dims
            )));
        }
        Ok(())
    }

    /// Matrix exponential (dense Padé).
    pub fn expm(&self) -> Result<Qobj> {
        self.expm_with("dense")
    }

    /// Matrix exponential with method `"dense"` or `"sparse"`.
    pub fn expm_with(&self, method: &str) -> Result<Qobj> {
        self.check_square_function("exponential")?;
        let data = match method {
            "dense" => CsrMatrix::from_dense(&linalg::matrix_exp(&self.data.to_dense())?),
            "sparse" => linalg::sparse_matrix_exp(&self.data)?,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "expm method must be 'dense' or 'sparse', got '{}'",
                    other
                )))
            }
        };
        Ok(Qobj::from_parts(data, self.dims.clone(), self.settings).finish())
    }

    /// Matrix square root via eigendecomposition.
    pub fn sqrtm(&self, opts: &EigenOptions) -> Result<Qobj> {
        self.check_square_function("square root")?;
        let isherm = self.isherm();
        let eig = linalg::eigs(&self.data, isherm, &opts.eigvals(0), true)?;
        let n = self.data.rows();

        let v = Array2::from_shape_fn((n, n), |(i, j)| eig.vectors[j][i]);
        let mut scaled = v.clone();
        for (j, lambda) in eig.values.iter().enumerate() {
            let root = lambda.sqrt();
            scaled.column_mut(j).mapv_inplace(|x| x * root);
        }
        let right = if isherm {
            v.t().mapv(|x| x.conj())
        } else {
            linalg::inverse(&v)?
        };
        let out = scaled.dot(&right);
        Ok(Qobj::from_parts(CsrMatrix::from_dense(&out), self.dims.clone(), self.settings).finish())
    }

    /// Matrix cosine `½(e^{iA} + e^{−iA})`.
    pub fn cosm(&self) -> Result<Qobj> {
        self.check_square_function("cosine")?;
        let plus = self.mul_scalar(I).expm()?;
        let minus = self.mul_scalar(-I).expm()?;
        Ok(&plus.checked_add(&minus)? * 0.5)
    }

    /// Matrix sine `−½i(e^{iA} − e^{−iA})`.
    pub fn sinm(&self) -> Result<Qobj> {
        self.check_square_function("sine")?;
        let plus = self.mul_scalar(I).expm()?;
        let minus = self.mul_scalar(-I).expm()?;
        Ok(&plus.checked_sub(&minus)? * Complex64::new(0.0, -0.5))
    }

    /// Projector `|ψ⟩⟨ψ|` from a ket or bra.
    pub fn proj(&self) -> Result<Qobj> {
        let (data, side) = match self.qtype() {
            QobjType::Ket => (self.data.matmul(&self.data.adjoint())?, &self.dims.left),
            QobjType::Bra => (self.data.adjoint().matmul(&self.data)?, &self.dims.right),
            other => {
                return Err(Error::Type(format!(
                    "projector needs a ket or bra, got {}",
                    other
                )))
            }
        };
        let dims = Dims {
            left: side.clone(),
            right: side.clone(),
        };
        Ok(Qobj::from_parts(data, dims, self.settings).finish())
    }

    /// Density matrix of a pure state: `|ψ⟩⟨ψ|` for kets, `⟨ψ|†⟨ψ|` for bras.
    pub fn ket2dm(&self) -> Result<Qobj> {
        match self.qtype() {
            QobjType::Ket => self.checked_mul(&self.dag()),
            QobjType::Bra => self.dag().checked_mul(self),
            other => Err(Error::Type(format!(
                "density matrix needs a ket or bra, got {}",
                other
            ))),
        }
    }

    /// Matrix element `⟨bra|A|ket⟩`; `bra` may also be given as a ket.
    pub fn matrix_element(&self, bra: &Qobj, ket: &Qobj) -> Result<Complex64> {
        if !self.is_oper() {
            return Err(Error::Type(format!(
                "matrix elements need an operator, got {}",
                self.qtype()
            )));
        }
        let row = match (bra.qtype(), ket.qtype()) {
            (QobjType::Bra, QobjType::Ket) => bra.data.as_ref().clone(),
            (QobjType::Ket, QobjType::Ket) => bra.data.adjoint(),
            (b, k) => {
                return Err(Error::Type(format!(
                    "matrix elements need bra/ket vectors, got {} and {}",
                    b, k
                )))
            }
        };
        let value = row.matmul(&self.data)?.matmul(&ket.data)?;
        Ok(value.get(0, 0))
    }

    /// Inner product, or Hilbert–Schmidt overlap `tr(ρ†·B)` when an
    /// operator is involved.
    pub fn overlap(&self, other: &Qobj) -> Result<Complex64> {
        use QobjType::{Bra, Ket, Oper};
        let (a, b) = (self.qtype(), other.qtype());
        if matches!(a, Bra | Ket) && matches!(b, Bra | Ket) && vector_len(self) != vector_len(other) {
            return Err(Error::DimensionMismatch(format!(
                "overlap of vectors with dims {} and {}",
                self.dims, other.dims
            )));
        }
        match (a, b) {
            (Bra, Ket) => Ok(inner(&self.data, &other.data, false)),
            (Bra, Bra) => Ok(inner(&self.data, &other.dag().data, false)),
            (Ket, Bra) => Ok(inner(&other.data, &self.data, false)),
            (Ket, Ket) => Ok(inner(&self.data, &other.data, true)),
            (Bra | Ket, Oper) => Ok(self.ket2dm()?.dag().checked_mul(other)?.tr()?.to_complex()),
            (Oper, Bra | Ket) => Ok(self.dag().checked_mul(&other.ket2dm()?)?.tr()?.to_complex()),
            (Oper, Oper) => Ok(self.dag().checked_mul(other)?.tr()?.to_complex()),
            _ => Err(Error::Type(format!(
                "overlap is defined for states and operators, got {} and {}",
                a, b
            ))),
        }
    }

    /// Normalized copy.
    pub fn unit(&self, norm: Option<&str>, opts: &EigenOptions) -> Result<Qobj> {
        let n = self.norm_with(norm, opts)?;
        Ok(self.div_scalar(Complex64::new(n, 0.0)))
    }

    /// Normalize in place.
    pub fn unit_inplace(&mut self, norm: Option<&str>, opts: &EigenOptions) -> Result<()> {
        let n = self.norm_with(norm, opts)?;
        self.data_mut().div_assign_scalar(Complex64::new(n, 0.0));
        self.isunitary.set(None);
        Ok(())
    }

    /// Dense row-major copy of the data.
    pub fn full(&self) -> Array2<Complex64> {
        self.data.to_dense()
    }

    /// Dense copy in the given memory order.
    pub fn full_with(&self, order: MemoryOrder) -> Array2<Complex64> {
        self.data.to_dense_with(order)
    }

    /// Element at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data.get(row, col)
    }

    /// Remove stored entries with magnitude at most `atol`
    /// (default `settings.auto_tidyup_atol`).
    pub fn tidyup(&mut self, atol: Option<f64>) -> &mut Self {
        let atol = atol.unwrap_or(self.settings.auto_tidyup_atol);
        if self.data.data().iter().any(|v| v.norm() <= atol) {
            self.data_mut().tidyup(atol);
        }
        self
    }
}

fn vector_len(q: &Qobj) -> usize {
    let (rows, cols) = q.shape();
    rows.max(cols)
}

/// Σ a_i b_i over two vectors, conjugating `a` when `conj_left`.
fn inner(a: &CsrMatrix, b: &CsrMatrix, conj_left: bool) -> Complex64 {
    let a = a.to_dense();
    let b = b.to_dense();
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| if conj_left { x.conj() * y } else { x * y })
        .sum()
}
