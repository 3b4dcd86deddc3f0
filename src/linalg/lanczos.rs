// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lanczos iteration for a few extremal eigenpairs of a sparse Hermitian
//! matrix.
//!
//! The Krylov basis is fully reorthogonalized at every step, so the
//! tridiagonal projection stays faithful without selective restarts. When
//! the Ritz pairs have not converged the basis is grown (doubling) until it
//! spans the whole space, at which point the projection is exact.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::Array1;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use super::eigen::SortOrder;
use crate::error::{Error, Result};
use crate::sparse::{norms, CsrMatrix};

const SEED: u64 = 0x51_0b_ce_ed;
const DEFAULT_TOL: f64 = 1e-10;
const MIN_BASIS: usize = 20;

/// Extremal eigenpairs of a Hermitian matrix.
///
/// Returns `k` Ritz values in ascending order with their normalized Ritz
/// vectors, taken from the low or high end of the spectrum.
pub fn lanczos(
    a: &CsrMatrix,
    k: usize,
    which: SortOrder,
    tol: f64,
    maxiter: usize,
) -> Result<(Vec<f64>, Vec<Array1<Complex64>>)> {
    let n = a.rows();
    if k == 0 || n == 0 {
        return Ok((Vec::new(), Vec::new()));
    }
    let tol = if tol > 0.0 { tol } else { DEFAULT_TOL };
    let breakdown = 1e-12 * norms::frobenius(a).max(1.0);

    let mut rng = StdRng::seed_from_u64(SEED);
    let mut basis: Vec<Array1<Complex64>> = Vec::new();
    let mut alphas: Vec<f64> = Vec::new();
    let mut betas: Vec<f64> = Vec::new();
    let mut pending: Option<(Array1<Complex64>, f64)> = None;
    let mut matvecs = 0usize;
    let mut target = n.min((2 * k + 1).max(MIN_BASIS));

    loop {
        while basis.len() < target {
            let v = match pending.take() {
                None => random_unit(n, &basis, &mut rng)?,
                Some((w, beta)) if beta > breakdown => {
                    betas.push(beta);
                    w.mapv(|x| x / beta)
                }
                Some(_) => {
                    trace!(step = basis.len(), "invariant subspace found, restarting");
                    betas.push(0.0);
                    random_unit(n, &basis, &mut rng)?
                }
            };

            let mut w = Array1::from(a.matvec(&v.to_vec())?);
            matvecs += 1;
            if matvecs > maxiter {
                return Err(Error::NoConvergence(format!(
                    "Lanczos exceeded {} matrix-vector products",
                    maxiter
                )));
            }

            let alpha = dot(&v, &w).re;
            basis.push(v);
            orthogonalize(&mut w, &basis);
            let beta = norm(&w);
            alphas.push(alpha);
            pending = Some((w, beta));
        }

        let m = basis.len();
        let residual_beta = pending.as_ref().map_or(0.0, |(_, b)| *b);

        let tri = DMatrix::from_fn(m, m, |i, j| {
            if i == j {
                alphas[i]
            } else if i + 1 == j {
                betas[i]
            } else if j + 1 == i {
                betas[j]
            } else {
                0.0
            }
        });
        let eig = SymmetricEigen::try_new(tri, f64::EPSILON, 0).ok_or_else(|| {
            Error::NoConvergence("tridiagonal eigensolver did not converge".into())
        })?;

        let mut order: Vec<usize> = (0..m).collect();
        order.sort_by(|&i, &j| eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]));
        let take = k.min(m);
        let chosen: Vec<usize> = match which {
            SortOrder::Low => order[..take].to_vec(),
            SortOrder::High => order[m - take..].to_vec(),
        };

        let converged = chosen.iter().all(|&idx| {
            let theta = eig.eigenvalues[idx];
            let last = eig.eigenvectors[(m - 1, idx)].abs();
            residual_beta * last <= tol * theta.abs().max(1.0)
        });

        if converged || m == n {
            debug!(n, k, basis = m, matvecs, "Lanczos converged");
            let values = chosen.iter().map(|&idx| eig.eigenvalues[idx]).collect();
            let vectors = chosen
                .iter()
                .map(|&idx| {
                    let mut x = Array1::<Complex64>::zeros(n);
                    for (j, b) in basis.iter().enumerate() {
                        let y = eig.eigenvectors[(j, idx)];
                        x.scaled_add(Complex64::new(y, 0.0), b);
                    }
                    let nrm = norm(&x);
                    x.mapv(|z| z / nrm)
                })
                .collect();
            return Ok((values, vectors));
        }

        target = n.min(2 * target);
        trace!(basis = m, next = target, "growing Krylov basis");
    }
}

fn dot(a: &Array1<Complex64>, b: &Array1<Complex64>) -> Complex64 {
    a.iter().zip(b.iter()).map(|(x, y)| x.conj() * y).sum()
}

fn norm(a: &Array1<Complex64>) -> f64 {
    a.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt()
}

/// Two passes of classical Gram-Schmidt against the basis.
fn orthogonalize(w: &mut Array1<Complex64>, basis: &[Array1<Complex64>]) {
    for _ in 0..2 {
        for b in basis {
            let h = dot(b, w);
            w.scaled_add(-h, b);
        }
    }
}

fn random_unit(
    n: usize,
    basis: &[Array1<Complex64>],
    rng: &mut StdRng,
) -> Result<Array1<Complex64>> {
    let mut v: Array1<Complex64> =
        Array1::from_shape_fn(n, |_| Complex64::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5));
    orthogonalize(&mut v, basis);
    let nrm = norm(&v);
    if nrm <= f64::EPSILON {
        return Err(Error::NoConvergence(
            "could not extend the Krylov basis".into(),
        ));
    }
    Ok(v.mapv(|z| z / nrm))
}
