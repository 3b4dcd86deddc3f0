// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Entrywise and induced norms of sparse matrices.

use super::CsrMatrix;

/// Frobenius norm: `sqrt(Σ |a_ij|²)`.
pub fn frobenius(m: &CsrMatrix) -> f64 {
    m.data().iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt()
}

/// Induced 1-norm: largest absolute column sum.
pub fn one(m: &CsrMatrix) -> f64 {
    let mut sums = vec![0.0; m.cols()];
    for (&c, v) in m.indices().iter().zip(m.data()) {
        sums[c] += v.norm();
    }
    sums.into_iter().fold(0.0, f64::max)
}

/// Largest entry magnitude.
pub fn max(m: &CsrMatrix) -> f64 {
    m.max_abs()
}

/// Euclidean norm of a row or column vector.
pub fn l2(m: &CsrMatrix) -> f64 {
    frobenius(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    fn matrix() -> CsrMatrix {
        // [[1, -2],
        //  [3i, 4]]
        CsrMatrix::from_triplets(
            (2, 2),
            vec![
                (0, 0, Complex64::new(1.0, 0.0)),
                (0, 1, Complex64::new(-2.0, 0.0)),
                (1, 0, Complex64::new(0.0, 3.0)),
                (1, 1, Complex64::new(4.0, 0.0)),
            ],
        )
    }

    #[test]
    fn test_frobenius() {
        assert_relative_eq!(frobenius(&matrix()), 30f64.sqrt(), epsilon = 1e-14);
    }

    #[test]
    fn test_one_norm_is_max_column_sum() {
        assert_relative_eq!(one(&matrix()), 6.0, epsilon = 1e-14);
    }

    #[test]
    fn test_max_norm() {
        assert_relative_eq!(max(&matrix()), 4.0, epsilon = 1e-14);
        assert_eq!(max(&CsrMatrix::zeros(3, 3)), 0.0);
    }

    #[test]
    fn test_l2_of_vector() {
        let v = CsrMatrix::from_triplets(
            (2, 1),
            vec![
                (0, 0, Complex64::new(3.0, 0.0)),
                (1, 0, Complex64::new(0.0, 4.0)),
            ],
        );
        assert_relative_eq!(l2(&v), 5.0, epsilon = 1e-14);
    }
}
