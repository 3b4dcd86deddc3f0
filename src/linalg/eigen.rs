// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Eigen-solver front end.
//!
//! Dense problems go through nalgebra: `SymmetricEigen` for Hermitian
//! matrices and a complex Schur form plus triangular back-substitution for
//! everything else. Sparse Hermitian problems asking for a strict subset of
//! the spectrum use [`lanczos`](super::lanczos::lanczos).

use nalgebra::{DMatrix, Schur, SymmetricEigen};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use tracing::debug;

use super::lanczos::lanczos;
use crate::error::{Error, Result};
use crate::sparse::CsrMatrix;

/// Which end of the spectrum to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Lowest eigenvalues, ascending
    #[default]
    Low,
    /// Highest eigenvalues, descending
    High,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(SortOrder::Low),
            "high" => Ok(SortOrder::High),
            other => Err(Error::InvalidArgument(format!(
                "sort must be 'low' or 'high', got '{}'",
                other
            ))),
        }
    }
}

/// Options accepted by every spectral operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenOptions {
    /// Prefer the iterative sparse solver
    pub sparse: bool,
    /// End of the spectrum to return
    pub sort: SortOrder,
    /// Number of eigenpairs (0 = all)
    pub eigvals: usize,
    /// Convergence tolerance for the iterative solver (0 = machine precision)
    pub tol: f64,
    /// Iteration cap for the iterative solver
    pub maxiter: usize,
}

impl Default for EigenOptions {
    fn default() -> Self {
        Self {
            sparse: false,
            sort: SortOrder::Low,
            eigvals: 0,
            tol: 0.0,
            maxiter: 100_000,
        }
    }
}

impl EigenOptions {
    /// Use the sparse solver.
    pub fn sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    /// Keep the low or high end of the spectrum.
    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Number of eigenpairs to return.
    pub fn eigvals(mut self, eigvals: usize) -> Self {
        self.eigvals = eigvals;
        self
    }

    /// Iterative solver tolerance.
    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Iterative solver iteration cap.
    pub fn maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }
}

/// Eigenvalues with (optionally) their normalized eigenvectors.
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues in the requested order
    pub values: Vec<Complex64>,
    /// Eigenvectors matching `values`; empty when not requested
    pub vectors: Vec<Array1<Complex64>>,
}

/// Solve the eigenproblem of a square sparse matrix.
///
/// Eigenvalues are sorted ascending by real part, then imaginary part.
/// With `eigvals = k < N`, `Low` keeps the k lowest and `High` the k
/// highest; `High` results are returned in descending order.
pub fn eigs(
    m: &CsrMatrix,
    hermitian: bool,
    opts: &EigenOptions,
    want_vectors: bool,
) -> Result<EigenDecomposition> {
    if !m.is_square() {
        return Err(Error::Type(format!(
            "eigenproblem needs a square matrix, got {:?}",
            m.shape()
        )));
    }
    let n = m.rows();
    if opts.eigvals > n {
        return Err(Error::InvalidArgument(format!(
            "requested {} eigenvalues of a {}-dimensional matrix",
            opts.eigvals, n
        )));
    }
    let k = if opts.eigvals == 0 { n } else { opts.eigvals };
    if n == 0 {
        return Ok(EigenDecomposition {
            values: Vec::new(),
            vectors: Vec::new(),
        });
    }

    let (values, vectors) = if opts.sparse && hermitian && k < n {
        let (vals, vecs) = lanczos(m, k, opts.sort, opts.tol, opts.maxiter)?;
        let vals = vals.into_iter().map(|v| Complex64::new(v, 0.0)).collect();
        (vals, vecs)
    } else {
        if opts.sparse {
            debug!(n, k, hermitian, "sparse eigen-solver falls back to dense");
        }
        let dense = m.to_dense();
        if hermitian {
            let (vals, vecs) = dense_hermitian(&dense, want_vectors)?;
            (vals.into_iter().map(|v| Complex64::new(v, 0.0)).collect(), vecs)
        } else {
            dense_general(&dense, want_vectors)?
        }
    };

    Ok(select(values, vectors, k, opts.sort))
}

/// Sort ascending, keep `k` from the requested end.
fn select(
    values: Vec<Complex64>,
    vectors: Vec<Array1<Complex64>>,
    k: usize,
    sort: SortOrder,
) -> EigenDecomposition {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| cmp_complex(&values[i], &values[j]));

    let take = k.min(order.len());
    let chosen: Vec<usize> = match sort {
        SortOrder::Low => order[..take].to_vec(),
        SortOrder::High => order[order.len() - take..].iter().rev().copied().collect(),
    };

    let has_vectors = !vectors.is_empty();
    let mut vectors: Vec<Option<Array1<Complex64>>> = vectors.into_iter().map(Some).collect();
    EigenDecomposition {
        values: chosen.iter().map(|&i| values[i]).collect(),
        vectors: if has_vectors {
            chosen.iter().filter_map(|&i| vectors[i].take()).collect()
        } else {
            Vec::new()
        },
    }
}

fn cmp_complex(a: &Complex64, b: &Complex64) -> Ordering {
    a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im))
}

fn to_nalgebra(a: &Array2<Complex64>) -> DMatrix<Complex64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Full eigendecomposition of a dense Hermitian matrix.
///
/// Eigenvalues come back in solver order; callers sort.
pub fn dense_hermitian(
    a: &Array2<Complex64>,
    want_vectors: bool,
) -> Result<(Vec<f64>, Vec<Array1<Complex64>>)> {
    let eig = SymmetricEigen::try_new(to_nalgebra(a), f64::EPSILON, 0).ok_or_else(|| {
        Error::NoConvergence("Hermitian eigensolver did not converge".into())
    })?;
    let values: Vec<f64> = eig.eigenvalues.iter().copied().collect();
    let vectors = if want_vectors {
        eig.eigenvectors
            .column_iter()
            .map(|col| col.iter().copied().collect::<Array1<Complex64>>())
            .collect()
    } else {
        Vec::new()
    };
    Ok((values, vectors))
}

/// Full eigendecomposition of a dense general matrix via its Schur form.
pub fn dense_general(
    a: &Array2<Complex64>,
    want_vectors: bool,
) -> Result<(Vec<Complex64>, Vec<Array1<Complex64>>)> {
    let n = a.nrows();
    let schur = Schur::try_new(to_nalgebra(a), f64::EPSILON, 0)
        .ok_or_else(|| Error::NoConvergence("Schur iteration did not converge".into()))?;
    let (q, t) = schur.unpack();
    let values: Vec<Complex64> = (0..n).map(|i| t[(i, i)]).collect();
    if !want_vectors {
        return Ok((values, Vec::new()));
    }

    let scale = t.iter().map(|v| v.norm()).fold(0.0, f64::max).max(1.0);
    let small = f64::EPSILON * scale;

    // Back-substitution on (T - λ_k I) x = 0 with x_k = 1.
    let mut vectors = Vec::with_capacity(n);
    for k in 0..n {
        let lambda = t[(k, k)];
        let mut x = vec![Complex64::new(0.0, 0.0); n];
        x[k] = Complex64::new(1.0, 0.0);
        for j in (0..k).rev() {
            let mut sum = Complex64::new(0.0, 0.0);
            for (l, xl) in x.iter().enumerate().take(k + 1).skip(j + 1) {
                sum += t[(j, l)] * xl;
            }
            let mut denom = t[(j, j)] - lambda;
            if denom.norm() < small {
                denom = Complex64::new(small, 0.0);
            }
            x[j] = -sum / denom;
        }

        let mut v: Array1<Complex64> = (0..n)
            .map(|i| (0..=k).map(|j| q[(i, j)] * x[j]).sum())
            .collect();
        let nrm = v.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
        v.mapv_inplace(|z| z / nrm);
        vectors.push(v);
    }
    Ok((values, vectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn hermitian_3x3() -> CsrMatrix {
        CsrMatrix::from_dense(&array![
            [c(2.0, 0.0), c(0.0, -1.0), c(0.0, 0.0)],
            [c(0.0, 1.0), c(2.0, 0.0), c(0.0, 0.0)],
            [c(0.0, 0.0), c(0.0, 0.0), c(5.0, 0.0)],
        ])
    }

    fn residual(m: &CsrMatrix, value: Complex64, v: &Array1<Complex64>) -> f64 {
        let av = m.matvec(&v.to_vec()).unwrap();
        av.iter()
            .zip(v.iter())
            .map(|(x, y)| (x - y * value).norm_sqr())
            .sum::<f64>()
            .sqrt()
    }

    #[test]
    fn test_hermitian_sorted_low() {
        let m = hermitian_3x3();
        let eig = eigs(&m, true, &EigenOptions::default(), true).unwrap();
        let re: Vec<f64> = eig.values.iter().map(|v| v.re).collect();
        assert!((re[0] - 1.0).abs() < 1e-12);
        assert!((re[1] - 3.0).abs() < 1e-12);
        assert!((re[2] - 5.0).abs() < 1e-12);
        assert!(eig.values.iter().all(|v| v.im == 0.0));
        for (val, vec) in eig.values.iter().zip(&eig.vectors) {
            assert!(residual(&m, *val, vec) < 1e-12);
        }
    }

    #[test]
    fn test_high_order_is_descending() {
        let m = hermitian_3x3();
        let opts = EigenOptions::default().sort(SortOrder::High).eigvals(2);
        let eig = eigs(&m, true, &opts, false).unwrap();
        assert_eq!(eig.values.len(), 2);
        assert!((eig.values[0].re - 5.0).abs() < 1e-12);
        assert!((eig.values[1].re - 3.0).abs() < 1e-12);
        assert!(eig.vectors.is_empty());
    }

    #[test]
    fn test_eigvals_equal_to_dimension_means_all() {
        let m = hermitian_3x3();
        let eig = eigs(&m, true, &EigenOptions::default().eigvals(3), false).unwrap();
        assert_eq!(eig.values.len(), 3);
    }

    #[test]
    fn test_too_many_eigvals_is_rejected() {
        let err = eigs(&hermitian_3x3(), true, &EigenOptions::default().eigvals(4), false)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_non_square_is_type_error() {
        let err = eigs(&CsrMatrix::zeros(2, 3), false, &EigenOptions::default(), false)
            .unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn test_general_matrix_eigenpairs() {
        // Upper triangular, non-normal
        let m = CsrMatrix::from_dense(&array![
            [c(1.0, 0.0), c(2.0, 0.0), c(0.0, 1.0)],
            [c(0.0, 0.0), c(3.0, 0.0), c(1.0, 0.0)],
            [c(0.0, 0.0), c(0.0, 0.0), c(-2.0, 0.0)],
        ]);
        let eig = eigs(&m, false, &EigenOptions::default(), true).unwrap();
        let re: Vec<f64> = eig.values.iter().map(|v| v.re).collect();
        assert!((re[0] + 2.0).abs() < 1e-10);
        assert!((re[1] - 1.0).abs() < 1e-10);
        assert!((re[2] - 3.0).abs() < 1e-10);
        for (val, vec) in eig.values.iter().zip(&eig.vectors) {
            assert!(residual(&m, *val, vec) < 1e-9);
        }
    }

    #[test]
    fn test_general_complex_spectrum() {
        // Rotation generator: eigenvalues ±i
        let m = CsrMatrix::from_dense(&array![[c(0.0, 0.0), c(-1.0, 0.0)], [c(1.0, 0.0), c(0.0, 0.0)]]);
        let eig = eigs(&m, false, &EigenOptions::default(), true).unwrap();
        for target in [c(0.0, -1.0), c(0.0, 1.0)] {
            assert!(eig.values.iter().any(|v| (v - target).norm() < 1e-10));
        }
        for (val, vec) in eig.values.iter().zip(&eig.vectors) {
            assert!(residual(&m, *val, vec) < 1e-9);
        }
    }

    #[test]
    fn test_sparse_path_matches_dense() {
        let n = 30;
        let mut triplets = Vec::new();
        for i in 0..n {
            triplets.push((i, i, c((i % 7) as f64, 0.0)));
            if i + 1 < n {
                triplets.push((i, i + 1, c(0.0, 0.5)));
                triplets.push((i + 1, i, c(0.0, -0.5)));
            }
        }
        let m = CsrMatrix::from_triplets((n, n), triplets);
        let opts = EigenOptions::default().eigvals(4);
        let dense = eigs(&m, true, &opts, false).unwrap();
        let sparse = eigs(&m, true, &opts.sparse(true), true).unwrap();
        for (a, b) in dense.values.iter().zip(&sparse.values) {
            assert!((a - b).norm() < 1e-9);
        }
        assert_eq!(sparse.vectors.len(), 4);
    }

    #[test]
    fn test_sort_order_from_str() {
        assert_eq!("low".parse::<SortOrder>().unwrap(), SortOrder::Low);
        assert_eq!("high".parse::<SortOrder>().unwrap(), SortOrder::High);
        assert!(matches!(
            "middle".parse::<SortOrder>().unwrap_err(),
            Error::InvalidArgument(_)
        ));
    }
}
