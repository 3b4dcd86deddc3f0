// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Operator algebra: sums, products, scalar arithmetic, powers, equality.
//!
//! Object-object operators are fallible and return `Result<Qobj>`, so
//! `(&a + &b)?` is the usual form. Operators with a plain number on either
//! side cannot fail and return `Qobj` directly.

use ndarray::Array2;
use num_complex::Complex64;
use std::ops::{Add, Div, Mul, Neg, Sub};
use tracing::warn;

use super::{Qobj, SuperRep};
use crate::dims::{collapse_unit_factors, DimSide, Dims, QobjType};
use crate::error::{Error, Result};
use crate::sparse::CsrMatrix;

fn is_unit(q: &Qobj) -> bool {
    q.data.shape() == (1, 1)
}

/// Left tag wins; a mismatch is reported.
fn merge_superrep(left: Option<SuperRep>, right: Option<SuperRep>, op: &str) -> Option<SuperRep> {
    match (left, right) {
        (Some(l), Some(r)) => {
            if l != r {
                warn!(
                    left = %l,
                    right = %r,
                    "{} superoperators with different representations",
                    op
                );
            }
            Some(l)
        }
        _ => None,
    }
}

impl Qobj {
    /// Sum of two quantum objects.
    ///
    /// A 1×1 operand acts as a scalar: operators get it added to the
    /// diagonal, other types get it added to every stored entry. Otherwise
    /// dims and shapes must match.
    pub fn checked_add(&self, other: &Qobj) -> Result<Qobj> {
        if is_unit(other) && !is_unit(self) {
            return Ok(self.shift(other.data.get(0, 0)));
        }
        if is_unit(self) && !is_unit(other) {
            let mut out = other.shift(self.data.get(0, 0));
            if !out.shares_data_with(other) {
                out.settings = self.settings;
            }
            return Ok(out);
        }
        if self.dims != other.dims {
            return Err(Error::DimensionMismatch(format!(
                "cannot add objects with dims {} and {}",
                self.dims, other.dims
            )));
        }
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch(format!(
                "cannot add objects with shapes {:?} and {:?}",
                self.shape(),
                other.shape()
            )));
        }

        let data = self.data.add(&other.data)?;
        let isherm = if self.qtype().is_vector_like() {
            Some(false)
        } else {
            match (self.isherm.get(), other.isherm.get()) {
                (Some(a), Some(b)) if a || b => Some(a && b),
                _ => None,
            }
        };
        let superrep = merge_superrep(self.superrep, other.superrep, "Adding");

        Ok(Qobj::from_parts(data, self.dims.clone(), self.settings)
            .finish()
            .with_isherm(isherm)
            .with_superrep(superrep))
    }

    /// Add a number to this object.
    ///
    /// Zero returns a clone sharing this object's buffer. A real number keeps
    /// the Hermiticity flag; a complex one leaves it to be recomputed.
    pub fn shift(&self, c: Complex64) -> Qobj {
        if c == Complex64::new(0.0, 0.0) {
            return self.clone();
        }
        let data = if self.qtype().is_operator_like() {
            self.data.add_diagonal(c)
        } else {
            self.data.add_to_stored(c)
        };
        let isherm = if c.im == 0.0 { self.isherm.get() } else { None };
        Qobj::from_parts(data, self.dims.clone(), self.settings)
            .finish()
            .with_isherm(isherm)
            .with_superrep(self.superrep)
    }

    /// Difference `self − other`.
    pub fn checked_sub(&self, other: &Qobj) -> Result<Qobj> {
        self.checked_add(&-other)
    }

    /// Product of two quantum objects.
    pub fn checked_mul(&self, other: &Qobj) -> Result<Qobj> {
        if self.dims.right == other.dims.left {
            let data = self.data.matmul(&other.data)?;
            let mut dims = Dims {
                left: self.dims.left.clone(),
                right: other.dims.right.clone(),
            };
            if self.settings.auto_tidyup_dims {
                if let (DimSide::Flat(l), DimSide::Flat(r)) = (&dims.left, &dims.right) {
                    let (l, r) = collapse_unit_factors(l, r);
                    dims = Dims::new(l, r);
                }
            }
            let superrep = merge_superrep(self.superrep, other.superrep, "Multiplying");
            return Ok(Qobj::from_parts(data, dims, self.settings)
                .finish()
                .with_superrep(superrep));
        }
        if is_unit(self) {
            return Ok(other.scaled(self.data.get(0, 0), self));
        }
        if is_unit(other) {
            return Ok(self.scaled(other.data.get(0, 0), self));
        }
        Err(Error::IncompatibleShape(format!(
            "cannot multiply {} ({:?}) by {} ({:?})",
            self.dims,
            self.shape(),
            other.dims,
            other.shape()
        )))
    }

    /// Copy of `self` scaled by a 1×1 operand's value, with `lhs` settings.
    fn scaled(&self, c: Complex64, lhs: &Qobj) -> Qobj {
        Qobj::from_parts(self.data.scale(c), self.dims.clone(), lhs.settings)
            .finish()
            .with_superrep(self.superrep)
    }

    /// Division by a quantum object is not defined.
    pub fn checked_div(&self, _other: &Qobj) -> Result<Qobj> {
        Err(Error::UnsupportedOperation(
            "division by a quantum object; divide by a number instead".into(),
        ))
    }

    /// Multiply by a number.
    pub fn mul_scalar(&self, c: Complex64) -> Qobj {
        let isherm = if c.im == 0.0 { self.isherm.get() } else { None };
        Qobj::from_parts(self.data.scale(c), self.dims.clone(), self.settings)
            .finish()
            .with_isherm(isherm)
            .with_superrep(self.superrep)
    }

    /// Divide by a number.
    pub fn div_scalar(&self, c: Complex64) -> Qobj {
        let mut data = self.data.as_ref().clone();
        data.div_assign_scalar(c);
        let isherm = if c.im == 0.0 { self.isherm.get() } else { None };
        Qobj::from_parts(data, self.dims.clone(), self.settings)
            .finish()
            .with_isherm(isherm)
            .with_superrep(self.superrep)
    }

    /// `self · item` for every item.
    pub fn mul_each(&self, items: &[Qobj]) -> Result<Vec<Qobj>> {
        items.iter().map(|q| self.checked_mul(q)).collect()
    }

    /// `item · self` for every item.
    pub fn rmul_each(&self, items: &[Qobj]) -> Result<Vec<Qobj>> {
        items.iter().map(|q| q.checked_mul(self)).collect()
    }

    /// `self · c` for every number.
    pub fn mul_scalars(&self, scalars: &[Complex64]) -> Vec<Qobj> {
        scalars.iter().map(|&c| self.mul_scalar(c)).collect()
    }

    /// Raw data times a dense array.
    pub fn mul_dense(&self, dense: &Array2<Complex64>) -> Result<Array2<Complex64>> {
        self.data.mul_dense(dense)
    }

    fn check_power_operand(&self) -> Result<()> {
        if !self.qtype().is_operator_like() {
            return Err(Error::Type(format!(
                "powers are defined for operators and superoperators, not {}",
                self.qtype()
            )));
        }
        if !self.data.is_square() {
            return Err(Error::Type(format!(
                "powers need square data, got {:?}",
                self.shape()
            )));
        }
        Ok(())
    }

    /// Integer matrix power; `0` gives the identity.
    pub fn pow(&self, n: i32) -> Result<Qobj> {
        self.check_power_operand()?;
        if n < 0 {
            return Err(Error::InvalidExponent(format!(
                "negative exponent {}",
                n
            )));
        }
        let data = self.data.powi(n as u32)?;
        Ok(Qobj::from_parts(data, self.dims.clone(), self.settings)
            .finish()
            .with_superrep(self.superrep))
    }

    /// Matrix power with a floating exponent; it must be a non-negative
    /// integer value.
    pub fn powf(&self, x: f64) -> Result<Qobj> {
        self.check_power_operand()?;
        if !x.is_finite() || x.fract() != 0.0 || x < 0.0 || x > i32::MAX as f64 {
            return Err(Error::InvalidExponent(format!(
                "exponent {} is not a non-negative integer",
                x
            )));
        }
        self.pow(x as i32)
    }

    /// Modular power is not supported.
    pub fn pow_mod(&self, _n: i32, _m: i32) -> Result<Qobj> {
        self.check_power_operand()?;
        Err(Error::UnsupportedOperation(
            "modular exponentiation of a quantum object".into(),
        ))
    }

    /// Act an operator on a ket.
    pub fn apply(&self, other: &Qobj) -> Result<Qobj> {
        if self.qtype() == QobjType::Oper && other.qtype() == QobjType::Ket {
            self.checked_mul(other)
        } else {
            Err(Error::Type(format!(
                "can only act an operator on a ket, got {} on {}",
                self.qtype(),
                other.qtype()
            )))
        }
    }

    /// Largest entry of `self − other`, or `None` when not comparable.
    fn max_abs_diff(&self, other: &Qobj) -> Option<f64> {
        if self.dims != other.dims {
            return None;
        }
        self.data.sub(&other.data).ok().map(|d| d.max_abs())
    }
}

impl PartialEq for Qobj {
    /// Equal dims and every entry of the difference within the left
    /// operand's `atol`.
    fn eq(&self, other: &Qobj) -> bool {
        self.max_abs_diff(other)
            .is_some_and(|d| d <= self.settings.atol)
    }
}

impl Neg for &Qobj {
    type Output = Qobj;

    fn neg(self) -> Qobj {
        Qobj::from_parts(
            self.data.scale(Complex64::new(-1.0, 0.0)),
            self.dims.clone(),
            self.settings,
        )
        .finish()
        .with_isherm(self.isherm.get())
        .with_isunitary(self.isunitary.get())
        .with_superrep(self.superrep)
    }
}

impl Neg for Qobj {
    type Output = Qobj;

    fn neg(self) -> Qobj {
        -&self
    }
}

impl Add<&Qobj> for &Qobj {
    type Output = Result<Qobj>;

    fn add(self, rhs: &Qobj) -> Result<Qobj> {
        self.checked_add(rhs)
    }
}

impl Sub<&Qobj> for &Qobj {
    type Output = Result<Qobj>;

    fn sub(self, rhs: &Qobj) -> Result<Qobj> {
        self.checked_sub(rhs)
    }
}

impl Mul<&Qobj> for &Qobj {
    type Output = Result<Qobj>;

    fn mul(self, rhs: &Qobj) -> Result<Qobj> {
        self.checked_mul(rhs)
    }
}

impl Div<&Qobj> for &Qobj {
    type Output = Result<Qobj>;

    fn div(self, rhs: &Qobj) -> Result<Qobj> {
        self.checked_div(rhs)
    }
}

impl Mul<&[Qobj]> for &Qobj {
    type Output = Result<Vec<Qobj>>;

    fn mul(self, rhs: &[Qobj]) -> Result<Vec<Qobj>> {
        self.mul_each(rhs)
    }
}

/// Scalar operators on both sides for one number type.
macro_rules! scalar_ops {
    ($t:ty, $to_c:expr) => {
        impl Add<$t> for &Qobj {
            type Output = Qobj;

            fn add(self, rhs: $t) -> Qobj {
                self.shift($to_c(rhs))
            }
        }

        impl Sub<$t> for &Qobj {
            type Output = Qobj;

            fn sub(self, rhs: $t) -> Qobj {
                self.shift(-$to_c(rhs))
            }
        }

        impl Mul<$t> for &Qobj {
            type Output = Qobj;

            fn mul(self, rhs: $t) -> Qobj {
                self.mul_scalar($to_c(rhs))
            }
        }

        impl Div<$t> for &Qobj {
            type Output = Qobj;

            fn div(self, rhs: $t) -> Qobj {
                self.div_scalar($to_c(rhs))
            }
        }

        impl Add<&Qobj> for $t {
            type Output = Qobj;

            fn add(self, rhs: &Qobj) -> Qobj {
                rhs.shift($to_c(self))
            }
        }

        impl Sub<&Qobj> for $t {
            type Output = Qobj;

            fn sub(self, rhs: &Qobj) -> Qobj {
                (-rhs).shift($to_c(self))
            }
        }

        impl Mul<&Qobj> for $t {
            type Output = Qobj;

            fn mul(self, rhs: &Qobj) -> Qobj {
                rhs.mul_scalar($to_c(self))
            }
        }
    };
}

scalar_ops!(f64, |x: f64| Complex64::new(x, 0.0));
scalar_ops!(Complex64, |c: Complex64| c);

impl From<Qobj> for CsrMatrix {
    fn from(q: Qobj) -> Self {
        match std::sync::Arc::try_unwrap(q.data) {
            Ok(m) => m,
            Err(shared) => shared.as_ref().clone(),
        }
    }
}
