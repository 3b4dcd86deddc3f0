// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Spectral layer: eigenvalues, eigenstates, ground state and basis
//! transforms.

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use tracing::{debug, warn};

use super::Qobj;
use crate::dims::{DimSide, Dims, QobjType};
use crate::error::{Error, Result};
use crate::linalg::{self, EigenOptions, SortOrder};
use crate::sparse::{norms, CsrMatrix};

/// Floor for the degeneracy check when no solver tolerance is given.
const DEGENERACY_TOL_FLOOR: f64 = 1e-15;

/// Change of basis accepted by [`Qobj::transform`].
#[derive(Debug, Clone)]
pub enum BasisInput<'a> {
    /// Change-of-basis operator, used as is.
    Operator(&'a Qobj),
    /// New basis kets; stacked as conjugated rows.
    Kets(&'a [Qobj]),
    /// Raw matrix; conjugated before use.
    Dense(Array2<Complex64>),
}

impl Qobj {
    /// Eigenvalues, sorted per `opts.sort`.
    pub fn eigenenergies(&self, opts: &EigenOptions) -> Result<Vec<Complex64>> {
        let eig = linalg::eigs(&self.data, self.isherm(), opts, false)?;
        Ok(eig.values)
    }

    /// Eigenvalues with their normalized eigenkets.
    ///
    /// Each ket carries dims `[left, [1, …, 1]]` with one unit factor per
    /// left entry.
    pub fn eigenstates(&self, opts: &EigenOptions) -> Result<(Vec<Complex64>, Vec<Qobj>)> {
        let eig = linalg::eigs(&self.data, self.isherm(), opts, true)?;
        let kets = eig
            .vectors
            .iter()
            .map(|v| self.eigenket(v))
            .collect();
        Ok((eig.values, kets))
    }

    /// Lowest eigenvalue and its normalized eigenket.
    ///
    /// With `safe`, the two lowest eigenvalues are computed and a warning
    /// is logged when their gap is at most ten times the solver tolerance.
    pub fn groundstate(&self, opts: &EigenOptions, safe: bool) -> Result<(Complex64, Qobj)> {
        let n = self.data.rows();
        let wanted = if safe && n > 1 { 2 } else { 1 };
        let eig = linalg::eigs(
            &self.data,
            self.isherm(),
            &opts.eigvals(wanted).sort(SortOrder::Low),
            true,
        )?;
        let (ground, vector) = match (eig.values.first(), eig.vectors.first()) {
            (Some(&value), Some(vector)) => (value, vector),
            _ => {
                return Err(Error::Type(format!(
                    "ground state of an empty {:?} object",
                    self.shape()
                )))
            }
        };

        if wanted == 2 {
            let tol = if opts.tol == 0.0 {
                DEGENERACY_TOL_FLOOR
            } else {
                opts.tol
            };
            let gap = eig.values[1].re - ground.re;
            if gap <= 10.0 * tol {
                warn!(gap, tol, "Ground state may be degenerate; use eigenstates()");
            }
        }

        Ok((ground, self.eigenket(vector)))
    }

    fn eigenket(&self, vector: &Array1<Complex64>) -> Qobj {
        let n = vector.len();
        let mut data =
            CsrMatrix::from_triplets((n, 1), vector.iter().enumerate().map(|(i, &v)| (i, 0, v)));
        let norm = norms::l2(&data);
        if norm > 0.0 {
            data.div_assign_scalar(Complex64::new(norm, 0.0));
        }
        let dims = Dims::new(
            self.dims.left.clone(),
            DimSide::Flat(vec![1; self.dims.left.len()]),
        );
        Qobj::from_parts(data, dims, self.settings)
    }

    /// Basis transform.
    ///
    /// Forward: kets become `S·x`, bras `x·S†`, everything else `S·A·S†`.
    /// Inverse: `S†·x`, `x·S` and `S†·A·S`.
    pub fn transform(&self, basis: BasisInput<'_>, inverse: bool) -> Result<Qobj> {
        let s = self.basis_matrix(basis)?;
        let s_dag = s.adjoint();
        let x = self.data.as_ref();

        let data = match (self.qtype(), inverse) {
            (QobjType::Ket, false) => s.matmul(x)?,
            (QobjType::Ket, true) => s_dag.matmul(x)?,
            (QobjType::Bra, false) => x.matmul(&s_dag)?,
            (QobjType::Bra, true) => x.matmul(&s)?,
            (_, false) => s.matmul(x)?.matmul(&s_dag)?,
            (_, true) => s_dag.matmul(x)?.matmul(&s)?,
        };
        debug!(qtype = %self.qtype(), inverse, nnz = data.nnz(), "basis transform");

        Ok(Qobj::from_parts(data, self.dims.clone(), self.settings)
            .finish()
            .with_isherm(self.isherm.get())
            .with_superrep(self.superrep))
    }

    fn basis_matrix(&self, basis: BasisInput<'_>) -> Result<CsrMatrix> {
        match basis {
            BasisInput::Kets(kets) => {
                let (rows, cols) = self.shape();
                if kets.len() != rows.max(cols) {
                    return Err(Error::SizeMismatch(format!(
                        "basis has {} kets, object has shape {:?}",
                        kets.len(),
                        self.shape()
                    )));
                }
                let width = kets.first().map_or(0, |k| k.shape().0);
                let mut triplets = Vec::new();
                for (i, ket) in kets.iter().enumerate() {
                    if ket.shape() != (width, 1) {
                        return Err(Error::Type(format!(
                            "basis ket {} has shape {:?}, expected ({}, 1)",
                            i,
                            ket.shape(),
                            width
                        )));
                    }
                    triplets.extend(ket.data.iter().map(|(r, _, v)| (i, r, v.conj())));
                }
                Ok(CsrMatrix::from_triplets((kets.len(), width), triplets))
            }
            BasisInput::Operator(op) => {
                if !op.is_oper() {
                    return Err(Error::Type(format!(
                        "basis transform needs an operator, got {}",
                        op.qtype()
                    )));
                }
                Ok(op.data.as_ref().clone())
            }
            BasisInput::Dense(array) => Ok(CsrMatrix::from_dense(&array.mapv(|v| v.conj()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        assert_qobj_close, basis, capture_warnings, random_hermitian, sigma_x, sigma_z,
    };
    use approx::assert_relative_eq;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    // ==========================================================================
    // Eigenvalues
    // ==========================================================================

    #[test]
    fn test_eigenenergies_sorted() {
        let e = sigma_z().eigenenergies(&EigenOptions::default()).unwrap();
        assert_eq!(e, vec![c(-1.0, 0.0), c(1.0, 0.0)]);

        let top = sigma_z()
            .eigenenergies(&EigenOptions::default().eigvals(1).sort(SortOrder::High))
            .unwrap();
        assert_eq!(top, vec![c(1.0, 0.0)]);
    }

    #[test]
    fn test_eigenenergies_hermitian_are_real() {
        let h = random_hermitian(6, 4);
        for e in h.eigenenergies(&EigenOptions::default()).unwrap() {
            assert_eq!(e.im, 0.0);
        }
    }

    #[test]
    fn test_eigenenergies_rejects_bad_requests() {
        let err = sigma_x()
            .eigenenergies(&EigenOptions::default().eigvals(3))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = basis(3, 0)
            .eigenenergies(&EigenOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn test_eigenstates_reconstruct_operator() {
        let h = random_hermitian(6, 11);
        let (values, kets) = h.eigenstates(&EigenOptions::default()).unwrap();
        assert_eq!(kets.len(), 6);

        let mut sum = Qobj::zeros(Dims::oper(&[6]));
        for (lambda, ket) in values.iter().zip(&kets) {
            assert!(ket.is_ket());
            assert_relative_eq!(ket.norm().unwrap(), 1.0, epsilon = 1e-12);
            let term = ket.proj().unwrap().mul_scalar(*lambda);
            sum = sum.checked_add(&term).unwrap();
        }
        assert_qobj_close(&sum, &h, 1e-9);
    }

    #[test]
    fn test_eigenstates_tensor_dims() {
        let mut h = random_hermitian(4, 2);
        h.set_dims(Dims::oper(&[2, 2])).unwrap();
        let (_, kets) = h.eigenstates(&EigenOptions::default()).unwrap();
        assert_eq!(kets[0].dims(), &Dims::ket(&[2, 2]));
        assert_eq!(kets[0].dims().right, DimSide::Flat(vec![1, 1]));
        assert!(kets[0].is_ket());
    }

    // ==========================================================================
    // Ground state
    // ==========================================================================

    #[test]
    fn test_groundstate_of_sigma_z() {
        let ((e0, psi), warnings) =
            capture_warnings(|| sigma_z().groundstate(&EigenOptions::default(), true).unwrap());
        assert_relative_eq!(e0.re, -1.0, epsilon = 1e-12);
        assert_relative_eq!(psi.get(1, 0).norm(), 1.0, epsilon = 1e-12);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_groundstate_warns_on_degeneracy() {
        let id = Qobj::identity(&[3]);
        let ((e0, psi), warnings) =
            capture_warnings(|| id.groundstate(&EigenOptions::default(), true).unwrap());
        assert_relative_eq!(e0.re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(psi.norm().unwrap(), 1.0, epsilon = 1e-12);
        assert!(warnings.iter().any(|w| w.contains("degenerate")));

        // Unsafe mode skips the check
        let (_, warnings) =
            capture_warnings(|| id.groundstate(&EigenOptions::default(), false).unwrap());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_groundstate_sparse_matches_dense() {
        let h = random_hermitian(30, 5);
        let (dense, _) = h.groundstate(&EigenOptions::default(), true).unwrap();
        let (sparse, psi) = h
            .groundstate(&EigenOptions::default().sparse(true), true)
            .unwrap();
        assert_relative_eq!(dense.re, sparse.re, epsilon = 1e-8);

        // H|psi> = e0 |psi>
        let hpsi = h.checked_mul(&psi).unwrap();
        assert_qobj_close(&hpsi, &psi.mul_scalar(sparse), 1e-6);
    }

    // ==========================================================================
    // Basis transform
    // ==========================================================================

    #[test]
    fn test_transform_ket_by_identity() {
        let psi = Qobj::new(vec![c(0.6, 0.0), c(0.0, 0.8)]).unwrap();
        assert_eq!(psi.dims(), &Dims::ket(&[2]));
        let id = Qobj::identity(&[2]);
        let out = psi.transform(BasisInput::Operator(&id), false).unwrap();
        assert_qobj_close(&out, &psi, 1e-12);

        let kets = [basis(2, 0), basis(2, 1)];
        let out = psi.transform(BasisInput::Kets(&kets), false).unwrap();
        assert_qobj_close(&out, &psi, 1e-12);
    }

    #[test]
    fn test_transform_to_eigenbasis_diagonalizes() {
        let h = random_hermitian(4, 9);
        let (values, kets) = h.eigenstates(&EigenOptions::default()).unwrap();
        let d = h.transform(BasisInput::Kets(&kets), false).unwrap();
        assert_eq!(d.isherm_cached(), Some(true));
        for (i, lambda) in values.iter().enumerate() {
            assert_relative_eq!(d.get(i, i).re, lambda.re, epsilon = 1e-9);
        }
        assert_relative_eq!(d.get(0, 1).norm(), 0.0, epsilon = 1e-9);

        let back = d.transform(BasisInput::Kets(&kets), true).unwrap();
        assert_qobj_close(&back, &h, 1e-9);
    }

    #[test]
    fn test_transform_bra_and_dense_basis() {
        // Hadamard basis
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let hadamard = Array2::from_shape_vec(
            (2, 2),
            vec![c(s, 0.0), c(s, 0.0), c(s, 0.0), c(-s, 0.0)],
        )
        .unwrap();
        let x = sigma_x();
        let z = x.transform(BasisInput::Dense(hadamard.clone()), false).unwrap();
        assert_qobj_close(&z, &sigma_z(), 1e-12);

        let bra = basis(2, 0).dag();
        let out = bra.transform(BasisInput::Dense(hadamard), false).unwrap();
        assert!(out.is_bra());
        assert_relative_eq!(out.get(0, 0).re, s, epsilon = 1e-12);
        assert_relative_eq!(out.get(0, 1).re, s, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_errors() {
        let psi = basis(3, 0);
        let kets = [basis(3, 0), basis(3, 1)];
        assert!(matches!(
            psi.transform(BasisInput::Kets(&kets), false).unwrap_err(),
            Error::SizeMismatch(_)
        ));
        assert!(matches!(
            psi.transform(BasisInput::Operator(&psi), false).unwrap_err(),
            Error::Type(_)
        ));
    }
}
