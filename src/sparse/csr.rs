// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Compressed sparse row (CSR) complex matrix.
//!
//! Storage is three arrays:
//! - `data`: stored values in row-major order
//! - `indices`: column index of each stored value
//! - `indptr`: offsets where each row starts (length = rows + 1)
//!
//! Every constructor leaves the matrix canonical: column indices are
//! strictly increasing within each row (duplicates summed). Kernels that
//! produce new matrices drop exact zeros; small-but-nonzero values are only
//! removed by [`CsrMatrix::tidyup`].

use ndarray::{Array2, ShapeBuilder};
use num_complex::Complex64;

use crate::error::{Error, Result};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Memory layout for dense conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryOrder {
    /// Row-major (C order)
    #[default]
    RowMajor,
    /// Column-major (Fortran order)
    ColumnMajor,
}

/// Canonical CSR matrix over `Complex64`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    data: Vec<Complex64>,
    indices: Vec<usize>,
    indptr: Vec<usize>,
    shape: (usize, usize),
}

impl CsrMatrix {
    /// Create a matrix from raw CSR arrays.
    ///
    /// Rows may list columns in any order and may repeat a column; the
    /// result is sorted and duplicates are summed.
    pub fn new(
        data: Vec<Complex64>,
        indices: Vec<usize>,
        indptr: Vec<usize>,
        shape: (usize, usize),
    ) -> Result<Self> {
        if data.len() != indices.len() {
            return Err(Error::ShapeMismatch(format!(
                "data has {} values but indices has {}",
                data.len(),
                indices.len()
            )));
        }
        if indptr.len() != shape.0 + 1 {
            return Err(Error::ShapeMismatch(format!(
                "indptr length {} must be rows + 1 = {}",
                indptr.len(),
                shape.0 + 1
            )));
        }
        if indptr.first() != Some(&0) || indptr.last() != Some(&data.len()) {
            return Err(Error::ShapeMismatch(
                "indptr must start at 0 and end at the number of stored values".into(),
            ));
        }
        if indptr.windows(2).any(|w| w[1] < w[0]) {
            return Err(Error::ShapeMismatch("indptr must be non-decreasing".into()));
        }
        if let Some(&max_col) = indices.iter().max() {
            if max_col >= shape.1 {
                return Err(Error::ShapeMismatch(format!(
                    "column index {} exceeds {} columns",
                    max_col, shape.1
                )));
            }
        }

        let mut triplets = Vec::with_capacity(data.len());
        for row in 0..shape.0 {
            for k in indptr[row]..indptr[row + 1] {
                triplets.push((row, indices[k], data[k]));
            }
        }
        Ok(Self::from_triplets(shape, triplets))
    }

    /// All-zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: Vec::new(),
            indices: Vec::new(),
            indptr: vec![0; rows + 1],
            shape: (rows, cols),
        }
    }

    /// `n × n` identity.
    pub fn identity(n: usize) -> Self {
        Self::from_diag(&vec![ONE; n])
    }

    /// Square matrix with `diag` on the main diagonal.
    pub fn from_diag(diag: &[Complex64]) -> Self {
        let n = diag.len();
        Self::from_triplets((n, n), diag.iter().enumerate().map(|(i, &v)| (i, i, v)))
    }

    /// Build from `(row, col, value)` triplets; duplicates are summed and
    /// exact zeros dropped. Out-of-range triplets are ignored.
    pub fn from_triplets<I>(shape: (usize, usize), triplets: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, Complex64)>,
    {
        let mut rows: Vec<Vec<(usize, Complex64)>> = vec![Vec::new(); shape.0];
        for (r, c, v) in triplets {
            if r < shape.0 && c < shape.1 {
                rows[r].push((c, v));
            }
        }

        let mut data = Vec::new();
        let mut indices = Vec::new();
        let mut indptr = Vec::with_capacity(shape.0 + 1);
        indptr.push(0);

        for mut row in rows {
            row.sort_by_key(|&(c, _)| c);
            let mut iter = row.into_iter().peekable();
            while let Some((c, mut v)) = iter.next() {
                while let Some(&(c2, v2)) = iter.peek() {
                    if c2 != c {
                        break;
                    }
                    v += v2;
                    iter.next();
                }
                if v != ZERO {
                    indices.push(c);
                    data.push(v);
                }
            }
            indptr.push(data.len());
        }

        Self {
            data,
            indices,
            indptr,
            shape,
        }
    }

    /// Build from a dense array, skipping zeros.
    pub fn from_dense(dense: &Array2<Complex64>) -> Self {
        let shape = dense.dim();
        Self::from_triplets(
            shape,
            dense
                .indexed_iter()
                .filter(|(_, v)| **v != ZERO)
                .map(|((i, j), &v)| (i, j, v)),
        )
    }

    /// Dense row-major copy.
    pub fn to_dense(&self) -> Array2<Complex64> {
        let mut out = Array2::zeros(self.shape);
        for (i, j, v) in self.iter() {
            out[[i, j]] = v;
        }
        out
    }

    /// Dense copy in the requested memory order.
    pub fn to_dense_with(&self, order: MemoryOrder) -> Array2<Complex64> {
        match order {
            MemoryOrder::RowMajor => self.to_dense(),
            MemoryOrder::ColumnMajor => {
                let mut out = Array2::zeros(self.shape.f());
                for (i, j, v) in self.iter() {
                    out[[i, j]] = v;
                }
                out
            }
        }
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.shape.0
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.shape.1
    }

    /// Number of stored values.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Stored values.
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    /// Column index of each stored value.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Row offsets.
    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    /// Whether the matrix is square.
    pub fn is_square(&self) -> bool {
        self.shape.0 == self.shape.1
    }

    /// Column indices and values of one row.
    pub fn row(&self, row: usize) -> (&[usize], &[Complex64]) {
        let start = self.indptr[row];
        let end = self.indptr[row + 1];
        (&self.indices[start..end], &self.data[start..end])
    }

    /// Element at `(row, col)`; zero when out of range or not stored.
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        if row >= self.shape.0 || col >= self.shape.1 {
            return ZERO;
        }
        let (cols, vals) = self.row(row);
        match cols.binary_search(&col) {
            Ok(pos) => vals[pos],
            Err(_) => ZERO,
        }
    }

    /// Iterate stored `(row, col, value)` triplets in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Complex64)> + '_ {
        (0..self.shape.0).flat_map(move |r| {
            (self.indptr[r]..self.indptr[r + 1]).map(move |k| (r, self.indices[k], self.data[k]))
        })
    }

    /// Elementwise sum.
    pub fn add(&self, other: &CsrMatrix) -> Result<CsrMatrix> {
        if self.shape != other.shape {
            return Err(Error::ShapeMismatch(format!(
                "cannot add {:?} and {:?} matrices",
                self.shape, other.shape
            )));
        }

        let mut data = Vec::with_capacity(self.nnz() + other.nnz());
        let mut indices = Vec::with_capacity(self.nnz() + other.nnz());
        let mut indptr = Vec::with_capacity(self.shape.0 + 1);
        indptr.push(0);

        for r in 0..self.shape.0 {
            let (ac, av) = self.row(r);
            let (bc, bv) = other.row(r);
            let (mut i, mut j) = (0, 0);
            while i < ac.len() || j < bc.len() {
                let (c, v) = if j >= bc.len() || (i < ac.len() && ac[i] < bc[j]) {
                    i += 1;
                    (ac[i - 1], av[i - 1])
                } else if i >= ac.len() || bc[j] < ac[i] {
                    j += 1;
                    (bc[j - 1], bv[j - 1])
                } else {
                    i += 1;
                    j += 1;
                    (ac[i - 1], av[i - 1] + bv[j - 1])
                };
                if v != ZERO {
                    indices.push(c);
                    data.push(v);
                }
            }
            indptr.push(data.len());
        }

        Ok(Self {
            data,
            indices,
            indptr,
            shape: self.shape,
        })
    }

    /// Elementwise difference.
    pub fn sub(&self, other: &CsrMatrix) -> Result<CsrMatrix> {
        self.add(&other.scale(-ONE))
    }

    /// Multiply every value by `c`.
    pub fn scale(&self, c: Complex64) -> CsrMatrix {
        if c == ZERO {
            return Self::zeros(self.shape.0, self.shape.1);
        }
        Self {
            data: self.data.iter().map(|&v| v * c).collect(),
            indices: self.indices.clone(),
            indptr: self.indptr.clone(),
            shape: self.shape,
        }
    }

    /// Add `c` to every stored value; structural zeros stay zero.
    pub fn add_to_stored(&self, c: Complex64) -> CsrMatrix {
        let mut out = self.clone();
        for v in &mut out.data {
            *v += c;
        }
        out.eliminate_zeros();
        out
    }

    /// `self + c·I`, with the identity truncated to the leading square block.
    pub fn add_diagonal(&self, c: Complex64) -> CsrMatrix {
        let n = self.shape.0.min(self.shape.1);
        let shift = Self::from_triplets(self.shape, (0..n).map(|i| (i, i, c)));
        // Shapes agree by construction.
        match self.add(&shift) {
            Ok(m) => m,
            Err(_) => self.clone(),
        }
    }

    /// Sparse matrix product (row-wise Gustavson accumulation).
    pub fn matmul(&self, other: &CsrMatrix) -> Result<CsrMatrix> {
        if self.shape.1 != other.shape.0 {
            return Err(Error::IncompatibleShape(format!(
                "cannot multiply {:?} by {:?}",
                self.shape, other.shape
            )));
        }

        let n_cols = other.shape.1;
        let mut acc = vec![ZERO; n_cols];
        let mut mark = vec![usize::MAX; n_cols];
        let mut touched: Vec<usize> = Vec::new();

        let mut data = Vec::new();
        let mut indices = Vec::new();
        let mut indptr = Vec::with_capacity(self.shape.0 + 1);
        indptr.push(0);

        for r in 0..self.shape.0 {
            touched.clear();
            let (ac, av) = self.row(r);
            for (&k, &a) in ac.iter().zip(av) {
                let (bc, bv) = other.row(k);
                for (&c, &b) in bc.iter().zip(bv) {
                    if mark[c] != r {
                        mark[c] = r;
                        acc[c] = ZERO;
                        touched.push(c);
                    }
                    acc[c] += a * b;
                }
            }
            touched.sort_unstable();
            for &c in &touched {
                if acc[c] != ZERO {
                    indices.push(c);
                    data.push(acc[c]);
                }
            }
            indptr.push(data.len());
        }

        Ok(Self {
            data,
            indices,
            indptr,
            shape: (self.shape.0, n_cols),
        })
    }

    /// Sparse × dense product.
    pub fn mul_dense(&self, dense: &Array2<Complex64>) -> Result<Array2<Complex64>> {
        if self.shape.1 != dense.nrows() {
            return Err(Error::IncompatibleShape(format!(
                "cannot multiply {:?} by {:?}",
                self.shape,
                dense.dim()
            )));
        }
        let mut out = Array2::zeros((self.shape.0, dense.ncols()));
        for (i, k, a) in self.iter() {
            for j in 0..dense.ncols() {
                out[[i, j]] += a * dense[[k, j]];
            }
        }
        Ok(out)
    }

    /// Matrix-vector product.
    pub fn matvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        if x.len() != self.shape.1 {
            return Err(Error::IncompatibleShape(format!(
                "vector of length {} for {:?} matrix",
                x.len(),
                self.shape
            )));
        }
        Ok((0..self.shape.0)
            .map(|r| {
                let (cols, vals) = self.row(r);
                cols.iter().zip(vals).map(|(&c, &v)| v * x[c]).sum()
            })
            .collect())
    }

    /// Transpose (counting sort by column keeps indices canonical).
    pub fn transpose(&self) -> CsrMatrix {
        self.transpose_map(|v| v)
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> CsrMatrix {
        self.transpose_map(|v| v.conj())
    }

    fn transpose_map<F: Fn(Complex64) -> Complex64>(&self, f: F) -> CsrMatrix {
        let (rows, cols) = self.shape;
        let mut counts = vec![0usize; cols + 1];
        for &c in &self.indices {
            counts[c + 1] += 1;
        }
        for c in 0..cols {
            counts[c + 1] += counts[c];
        }
        let indptr = counts.clone();
        let mut next = counts;
        let mut data = vec![ZERO; self.nnz()];
        let mut indices = vec![0usize; self.nnz()];
        for r in 0..rows {
            let (rc, rv) = self.row(r);
            for (&c, &v) in rc.iter().zip(rv) {
                let dest = next[c];
                data[dest] = f(v);
                indices[dest] = r;
                next[c] += 1;
            }
        }
        Self {
            data,
            indices,
            indptr,
            shape: (cols, rows),
        }
    }

    /// Elementwise complex conjugate.
    pub fn conj(&self) -> CsrMatrix {
        Self {
            data: self.data.iter().map(|v| v.conj()).collect(),
            indices: self.indices.clone(),
            indptr: self.indptr.clone(),
            shape: self.shape,
        }
    }

    /// Sum of diagonal entries; only defined for square matrices.
    pub fn trace(&self) -> Result<Complex64> {
        if !self.is_square() {
            return Err(Error::ShapeMismatch(format!(
                "trace of non-square {:?} matrix",
                self.shape
            )));
        }
        Ok(self.diagonal().into_iter().sum())
    }

    /// Main diagonal (length `min(rows, cols)`).
    pub fn diagonal(&self) -> Vec<Complex64> {
        (0..self.shape.0.min(self.shape.1))
            .map(|i| self.get(i, i))
            .collect()
    }

    /// Integer power of a square matrix; `0` gives the identity.
    pub fn powi(&self, n: u32) -> Result<CsrMatrix> {
        if !self.is_square() {
            return Err(Error::Type(format!(
                "matrix power of non-square {:?} matrix",
                self.shape
            )));
        }
        let mut result = Self::identity(self.shape.0);
        let mut base = self.clone();
        let mut n = n;
        while n > 0 {
            if n & 1 == 1 {
                result = result.matmul(&base)?;
            }
            n >>= 1;
            if n > 0 {
                base = base.matmul(&base)?;
            }
        }
        Ok(result)
    }

    /// Whether `self` equals its conjugate transpose within `tol`.
    pub fn is_hermitian(&self, tol: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        self.iter()
            .all(|(i, j, v)| (v - self.get(j, i).conj()).norm() <= tol)
    }

    /// Largest entry magnitude (0 for an empty matrix).
    pub fn max_abs(&self) -> f64 {
        self.data.iter().map(|v| v.norm()).fold(0.0, f64::max)
    }

    /// Remove stored values with magnitude `<= atol`.
    ///
    /// Returns whether anything was removed.
    pub fn tidyup(&mut self, atol: f64) -> bool {
        if self.data.is_empty() {
            return false;
        }
        let mut removed = false;
        for v in &mut self.data {
            if v.norm() <= atol {
                *v = ZERO;
                removed = true;
            }
        }
        if removed {
            self.eliminate_zeros();
        }
        removed
    }

    /// Compact storage by dropping stored exact zeros.
    pub fn eliminate_zeros(&mut self) {
        let mut data = Vec::with_capacity(self.data.len());
        let mut indices = Vec::with_capacity(self.indices.len());
        let mut indptr = Vec::with_capacity(self.indptr.len());
        indptr.push(0);
        for r in 0..self.shape.0 {
            for k in self.indptr[r]..self.indptr[r + 1] {
                if self.data[k] != ZERO {
                    data.push(self.data[k]);
                    indices.push(self.indices[k]);
                }
            }
            indptr.push(data.len());
        }
        self.data = data;
        self.indices = indices;
        self.indptr = indptr;
    }

    /// Divide every stored value by `c` in place.
    pub(crate) fn div_assign_scalar(&mut self, c: Complex64) {
        for v in &mut self.data {
            *v /= c;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn sample() -> CsrMatrix {
        // [[1, 0, 2],
        //  [0, 0, 3i],
        //  [4, 5, 0]]
        CsrMatrix::from_dense(&array![
            [c(1.0, 0.0), c(0.0, 0.0), c(2.0, 0.0)],
            [c(0.0, 0.0), c(0.0, 0.0), c(0.0, 3.0)],
            [c(4.0, 0.0), c(5.0, 0.0), c(0.0, 0.0)],
        ])
    }

    #[test]
    fn test_new_sorts_and_sums_duplicates() {
        let m = CsrMatrix::new(
            vec![c(1.0, 0.0), c(2.0, 0.0), c(3.0, 0.0)],
            vec![2, 0, 2],
            vec![0, 3, 3],
            (2, 3),
        )
        .unwrap();
        assert_eq!(m.indices(), &[0, 2]);
        assert_eq!(m.get(0, 2), c(4.0, 0.0));
        assert_eq!(m.get(0, 0), c(2.0, 0.0));
        assert_eq!(m.nnz(), 2);
    }

    #[test]
    fn test_new_rejects_bad_arrays() {
        assert!(CsrMatrix::new(vec![c(1.0, 0.0)], vec![], vec![0, 1], (1, 1)).is_err());
        assert!(CsrMatrix::new(vec![c(1.0, 0.0)], vec![5], vec![0, 1], (1, 2)).is_err());
        assert!(CsrMatrix::new(vec![], vec![], vec![0], (2, 2)).is_err());
    }

    #[test]
    fn test_dense_round_trip_and_order() {
        let m = sample();
        let dense = m.to_dense();
        assert_eq!(CsrMatrix::from_dense(&dense), m);
        let f = m.to_dense_with(MemoryOrder::ColumnMajor);
        assert_eq!(f, dense);
        assert!(f.t().is_standard_layout());
    }

    #[test]
    fn test_add_and_cancellation() {
        let m = sample();
        let sum = m.add(&m).unwrap();
        assert_eq!(sum.get(2, 1), c(10.0, 0.0));
        let zero = m.sub(&m).unwrap();
        assert_eq!(zero.nnz(), 0);
        assert!(m.add(&CsrMatrix::zeros(2, 2)).is_err());
    }

    #[test]
    fn test_matmul_matches_dense() {
        let m = sample();
        let p = m.matmul(&m).unwrap().to_dense();
        let d = m.to_dense();
        let expected = d.dot(&d);
        for ((i, j), v) in expected.indexed_iter() {
            assert_relative_eq!(p[[i, j]].re, v.re, epsilon = 1e-14);
            assert_relative_eq!(p[[i, j]].im, v.im, epsilon = 1e-14);
        }
        assert!(m.matmul(&CsrMatrix::zeros(2, 2)).is_err());
    }

    #[test]
    fn test_transpose_and_adjoint() {
        let m = sample();
        let t = m.transpose();
        assert_eq!(t.get(2, 1), c(0.0, 3.0));
        assert_eq!(t.get(1, 2), c(5.0, 0.0));
        let a = m.adjoint();
        assert_eq!(a.get(2, 1), c(0.0, -3.0));
        assert_eq!(a.adjoint(), m);
        // Rectangular
        let r = CsrMatrix::from_triplets((2, 3), vec![(0, 2, c(1.0, 1.0))]);
        assert_eq!(r.transpose().shape(), (3, 2));
        assert_eq!(r.transpose().get(2, 0), c(1.0, 1.0));
    }

    #[test]
    fn test_trace_and_diagonal() {
        let m = sample();
        assert_eq!(m.trace().unwrap(), c(1.0, 0.0));
        assert_eq!(m.diagonal(), vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)]);
        assert!(CsrMatrix::zeros(2, 3).trace().is_err());
    }

    #[test]
    fn test_identity_power() {
        let m = sample();
        assert_eq!(m.powi(0).unwrap(), CsrMatrix::identity(3));
        let cube = m.powi(3).unwrap();
        let direct = m.matmul(&m).unwrap().matmul(&m).unwrap();
        assert_eq!(cube, direct);
    }

    #[test]
    fn test_is_hermitian() {
        let h = CsrMatrix::from_dense(&array![
            [c(1.0, 0.0), c(0.0, -1.0)],
            [c(0.0, 1.0), c(2.0, 0.0)]
        ]);
        assert!(h.is_hermitian(1e-12));
        assert!(!sample().is_hermitian(1e-12));
        assert!(!CsrMatrix::zeros(2, 3).is_hermitian(1e-12));
    }

    #[test]
    fn test_tidyup_removes_small_values() {
        let mut m = CsrMatrix::from_triplets(
            (2, 2),
            vec![(0, 0, c(1e-14, 0.0)), (1, 1, c(1.0, 0.0)), (0, 1, c(0.0, 1e-13))],
        );
        assert_eq!(m.nnz(), 3);
        assert!(m.tidyup(1e-12));
        assert_eq!(m.nnz(), 1);
        assert!(!m.tidyup(1e-12));
        assert_eq!(m.get(1, 1), c(1.0, 0.0));
    }

    #[test]
    fn test_add_to_stored_and_diagonal() {
        let v = CsrMatrix::from_triplets((3, 1), vec![(0, 0, c(1.0, 0.0))]);
        let shifted = v.add_to_stored(c(2.0, 0.0));
        assert_eq!(shifted.get(0, 0), c(3.0, 0.0));
        assert_eq!(shifted.get(1, 0), c(0.0, 0.0));

        let d = CsrMatrix::zeros(2, 2).add_diagonal(c(5.0, 0.0));
        assert_eq!(d, CsrMatrix::identity(2).scale(c(5.0, 0.0)));
    }

    #[test]
    fn test_matvec_and_mul_dense() {
        let m = sample();
        let x = vec![c(1.0, 0.0), c(1.0, 0.0), c(1.0, 0.0)];
        let y = m.matvec(&x).unwrap();
        assert_eq!(y, vec![c(3.0, 0.0), c(0.0, 3.0), c(9.0, 0.0)]);
        let dense = m.mul_dense(&Array2::from_elem((3, 1), c(1.0, 0.0))).unwrap();
        assert_eq!(dense[[2, 0]], c(9.0, 0.0));
    }
}
