// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Matrix exponential for dense and sparse storage.
//!
//! The dense path is scaling-and-squaring with a Padé(13) approximant:
//!   Higham (2005), "The Scaling and Squaring Method for the Matrix
//!   Exponential Revisited", SIAM J. Matrix Anal. Appl. 26(4), 1179.
//!
//! The sparse path stays in CSR: a truncated Taylor series on the scaled
//! matrix followed by repeated squaring. Fill-in is pruned below machine
//! precision after every step so sparse generators stay sparse.

use ndarray::{s, Array2};
use num_complex::Complex64;
use tracing::trace;

use crate::error::{Error, Result};
use crate::sparse::{norms, CsrMatrix};

/// theta_13 from Higham Table 10.2.
const THETA_13: f64 = 5.37;

/// Padé(13,13) coefficients b_k / b_0, Higham (2005) eq. (10.33).
const PADE_COEFFS: [f64; 14] = [
    1.0,
    0.5,
    0.12,
    1.833_333_333_333_333_4e-2,
    1.992_753_623_188_405_8e-3,
    1.630_434_782_608_696e-4,
    1.035_196_687_401_6e-5,
    5.175_983_437_008_01e-7,
    2.043_151_356_652_5e-8,
    6.306_022_705_717_593e-10,
    1.483_770_048_404_14e-11,
    2.529_153_491_597_966e-13,
    2.810_170_546_219_962_4e-15,
    1.544_049_750_670_309e-17,
];

/// Upper bound on Taylor terms for the sparse kernel.
const MAX_TAYLOR_TERMS: usize = 40;

/// Scaled norm target for the sparse kernel.
const SPARSE_SCALE_TARGET: f64 = 0.5;

/// Dense matrix exponential exp(A).
pub fn matrix_exp(a: &Array2<Complex64>) -> Result<Array2<Complex64>> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(Error::ShapeMismatch(format!(
            "matrix exponential of non-square {:?} matrix",
            a.dim()
        )));
    }

    if n == 0 {
        return Ok(Array2::zeros((0, 0)));
    }
    if n == 1 {
        return Ok(Array2::from_elem((1, 1), a[[0, 0]].exp()));
    }

    let norm = dense_1_norm(a);
    let s = if norm > THETA_13 {
        (norm / THETA_13).log2().ceil() as i32
    } else {
        0
    };
    trace!(n, norm, squarings = s, "dense expm");

    let a_scaled = a * c(0.5f64.powi(s));
    let approx = pade13(&a_scaled)?;

    Ok(square_repeatedly(approx, s))
}

/// Sparse matrix exponential exp(A), staying in CSR storage.
pub fn sparse_matrix_exp(a: &CsrMatrix) -> Result<CsrMatrix> {
    if !a.is_square() {
        return Err(Error::ShapeMismatch(format!(
            "matrix exponential of non-square {:?} matrix",
            a.shape()
        )));
    }
    let n = a.rows();
    let norm = norms::one(a);
    let s = if norm > SPARSE_SCALE_TARGET {
        (norm / SPARSE_SCALE_TARGET).log2().ceil() as i32
    } else {
        0
    };
    trace!(n, norm, squarings = s, nnz = a.nnz(), "sparse expm");

    let a_scaled = a.scale(c(0.5f64.powi(s)));

    // exp(X) ≈ Σ X^k / k!
    let mut result = CsrMatrix::identity(n);
    let mut term = CsrMatrix::identity(n);
    for k in 1..=MAX_TAYLOR_TERMS {
        term = term.matmul(&a_scaled)?;
        term.div_assign_scalar(c(k as f64));
        term.tidyup(f64::EPSILON * 1e-3);
        if term.nnz() == 0 {
            break;
        }
        result = result.add(&term)?;
        if norms::max(&term) <= f64::EPSILON * norms::max(&result) {
            break;
        }
    }

    for _ in 0..s {
        result = result.matmul(&result)?;
        let floor = f64::EPSILON * 1e-3 * norms::max(&result);
        result.tidyup(floor);
    }
    Ok(result)
}

/// Compute Padé(13,13) approximation of exp(A).
fn pade13(a: &Array2<Complex64>) -> Result<Array2<Complex64>> {
    let n = a.nrows();
    let eye = Array2::from_diag_elem(n, c(1.0));

    let a2 = a.dot(a);
    let a4 = a2.dot(&a2);
    let a6 = a2.dot(&a4);

    // U = A * [A6 (b13 A6 + b11 A4 + b9 A2) + b7 A6 + b5 A4 + b3 A2 + b1 I]
    let w1 = &a6 * c(PADE_COEFFS[13]) + &a4 * c(PADE_COEFFS[11]) + &a2 * c(PADE_COEFFS[9]);
    let w2 = w1.dot(&a6)
        + &a6 * c(PADE_COEFFS[7])
        + &a4 * c(PADE_COEFFS[5])
        + &a2 * c(PADE_COEFFS[3])
        + &eye * c(PADE_COEFFS[1]);
    let u = a.dot(&w2);

    // V = A6 (b12 A6 + b10 A4 + b8 A2) + b6 A6 + b4 A4 + b2 A2 + b0 I
    let v1 = &a6 * c(PADE_COEFFS[12]) + &a4 * c(PADE_COEFFS[10]) + &a2 * c(PADE_COEFFS[8]);
    let v = v1.dot(&a6)
        + &a6 * c(PADE_COEFFS[6])
        + &a4 * c(PADE_COEFFS[4])
        + &a2 * c(PADE_COEFFS[2])
        + &eye * c(PADE_COEFFS[0]);

    // exp(A) ≈ (V - U)^{-1} (V + U)
    solve_linear(&v - &u, &v + &u)
}

#[inline]
fn c(x: f64) -> Complex64 {
    Complex64::new(x, 0.0)
}

/// Solve A X = B by Gaussian elimination with partial pivoting.
pub fn solve_linear(a: Array2<Complex64>, b: Array2<Complex64>) -> Result<Array2<Complex64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.nrows() {
        return Err(Error::IncompatibleShape(format!(
            "cannot solve {:?} system with {:?} right-hand side",
            a.dim(),
            b.dim()
        )));
    }
    let m = b.ncols();

    // Augmented matrix [A | B]
    let mut aug = Array2::zeros((n, n + m));
    aug.slice_mut(s![.., ..n]).assign(&a);
    aug.slice_mut(s![.., n..]).assign(&b);

    for col in 0..n {
        let mut max_val = 0.0;
        let mut max_row = col;
        for row in col..n {
            let val = aug[[row, col]].norm();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..(n + m) {
                aug.swap([col, j], [max_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        if pivot.norm() < 1e-15 {
            return Err(Error::UnsupportedOperation(format!(
                "matrix is singular (pivot {} in column {})",
                pivot.norm(),
                col
            )));
        }

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / pivot;
            for j in col..(n + m) {
                let val = aug[[col, j]];
                aug[[row, j]] -= factor * val;
            }
        }
    }

    let mut x = Array2::<Complex64>::zeros((n, m));
    for col in (0..n).rev() {
        let pivot = aug[[col, col]];
        for j in 0..m {
            let mut sum = aug[[col, n + j]];
            for k in (col + 1)..n {
                sum -= aug[[col, k]] * x[[k, j]];
            }
            x[[col, j]] = sum / pivot;
        }
    }
    Ok(x)
}

/// Inverse of a square matrix.
pub fn inverse(a: &Array2<Complex64>) -> Result<Array2<Complex64>> {
    let n = a.nrows();
    solve_linear(a.clone(), Array2::from_diag_elem(n, c(1.0)))
}

/// M^(2^s)
fn square_repeatedly(mut m: Array2<Complex64>, s: i32) -> Array2<Complex64> {
    for _ in 0..s {
        m = m.dot(&m);
    }
    m
}

fn dense_1_norm(a: &Array2<Complex64>) -> f64 {
    a.columns()
        .into_iter()
        .map(|col| col.iter().map(|v| v.norm()).sum::<f64>())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn assert_matrix_close(a: &Array2<Complex64>, b: &Array2<Complex64>, tol: f64) {
        assert_eq!(a.shape(), b.shape());
        for ((i, j), val) in a.indexed_iter() {
            let diff = (val - b[[i, j]]).norm();
            assert!(
                diff < tol,
                "Mismatch at ({}, {}): {:?} vs {:?} (diff={})",
                i,
                j,
                val,
                b[[i, j]],
                diff
            );
        }
    }

    fn rotation_generator(theta: f64) -> Array2<Complex64> {
        // -i θ/2 σ_x
        let mut a = Array2::zeros((2, 2));
        let factor = Complex64::new(0.0, -theta / 2.0);
        a[[0, 1]] = factor;
        a[[1, 0]] = factor;
        a
    }

    #[test]
    fn test_expm_zero_is_identity() {
        let result = matrix_exp(&Array2::zeros((4, 4))).unwrap();
        assert_matrix_close(&result, &Array2::from_diag_elem(4, c(1.0)), 1e-14);
    }

    #[test]
    fn test_expm_rejects_non_square() {
        let err = matrix_exp(&Array2::zeros((2, 3))).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
        let err = sparse_matrix_exp(&CsrMatrix::zeros(3, 2)).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn test_expm_diagonal() {
        let mut a = Array2::zeros((2, 2));
        a[[0, 0]] = c(1.0);
        a[[1, 1]] = c(2.0);
        let result = matrix_exp(&a).unwrap();
        assert!((result[[0, 0]] - c(1f64.exp())).norm() < 1e-12);
        assert!((result[[1, 1]] - c(2f64.exp())).norm() < 1e-12);
        assert!(result[[0, 1]].norm() < 1e-14);
    }

    #[test]
    fn test_expm_pauli_x_produces_rotation() {
        let theta = PI / 2.0;
        let result = matrix_exp(&rotation_generator(theta)).unwrap();
        let (cs, sn) = ((theta / 2.0).cos(), (theta / 2.0).sin());
        assert!((result[[0, 0]] - c(cs)).norm() < 1e-12);
        assert!((result[[0, 1]] - Complex64::new(0.0, -sn)).norm() < 1e-12);
        assert!((result[[1, 1]] - c(cs)).norm() < 1e-12);
    }

    #[test]
    fn test_expm_large_norm_needs_scaling() {
        let mut a = Array2::zeros((2, 2));
        a[[0, 0]] = c(100.0);
        a[[1, 1]] = c(-100.0);
        let result = matrix_exp(&a).unwrap();
        let e100 = 100f64.exp();
        assert!((result[[0, 0]].re - e100).abs() / e100 < 1e-10);
        assert!(result[[1, 1]].re.abs() < 1e-30);
    }

    #[test]
    fn test_expm_scalar() {
        let a = Array2::from_elem((1, 1), Complex64::new(3.0, 1.0));
        let result = matrix_exp(&a).unwrap();
        assert!((result[[0, 0]] - Complex64::new(3.0, 1.0).exp()).norm() < 1e-12);
    }

    #[test]
    fn test_sparse_expm_matches_dense() {
        let gen = rotation_generator(2.3);
        let dense = matrix_exp(&gen).unwrap();
        let sparse = sparse_matrix_exp(&CsrMatrix::from_dense(&gen)).unwrap();
        assert_matrix_close(&sparse.to_dense(), &dense, 1e-12);
    }

    #[test]
    fn test_sparse_expm_scaled_generator() {
        // Norm well above the scaling target forces several squarings
        let mut a = Array2::zeros((3, 3));
        a[[0, 1]] = c(4.0);
        a[[1, 0]] = c(4.0);
        a[[2, 2]] = Complex64::new(0.0, 3.0);
        let dense = matrix_exp(&a).unwrap();
        let sparse = sparse_matrix_exp(&CsrMatrix::from_dense(&a)).unwrap();
        let scale = dense.iter().map(|v| v.norm()).fold(0.0, f64::max);
        assert_matrix_close(&sparse.to_dense(), &dense, 1e-11 * scale);
    }

    #[test]
    fn test_sparse_expm_keeps_block_structure() {
        let a = CsrMatrix::from_diag(&[c(1.0), c(-1.0), c(0.0), c(2.0)]);
        let e = sparse_matrix_exp(&a).unwrap();
        assert_eq!(e.nnz(), 4);
    }

    #[test]
    fn test_inverse_and_singular() {
        let mut a = Array2::zeros((2, 2));
        a[[0, 0]] = c(2.0);
        a[[0, 1]] = c(1.0);
        a[[1, 1]] = Complex64::new(0.0, 1.0);
        let inv = inverse(&a).unwrap();
        assert_matrix_close(&a.dot(&inv), &Array2::from_diag_elem(2, c(1.0)), 1e-14);

        let singular = Array2::from_elem((2, 2), c(1.0));
        assert!(matches!(
            inverse(&singular).unwrap_err(),
            Error::UnsupportedOperation(_)
        ));
    }
}
