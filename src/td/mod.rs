// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Time-dependent composition.
//!
//! A time-dependent object is written as a list of terms: bare objects,
//! and `[object, coefficient]` pairs where the coefficient is a closure of
//! `(t, args)` or a textual expression (see [`expr`]). Evaluating the list
//! at a time gives the sum of every object scaled by its coefficient.
//!
//! ```ignore
//! let h = TdElement::List(vec![
//!     h0.into(),
//!     TdElement::term(h1, TdElement::Expression("A * sin(w * t)".into())),
//! ]);
//! let h_t = td::evaluate(&h, 0.5, &args)?;
//! ```

pub mod expr;

use num_complex::Complex64;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use crate::error::{Error, Result};
use crate::qobj::Qobj;

/// Named parameters passed to coefficients.
pub type TdArgs = HashMap<String, f64>;

/// Coefficient closure of time and parameters.
pub type CoeffFn = Arc<dyn Fn(f64, &TdArgs) -> Complex64 + Send + Sync>;

/// Node of a time-dependent description.
#[derive(Clone)]
pub enum TdElement {
    Qobj(Qobj),
    Function(CoeffFn),
    Expression(String),
    /// Plain number. Not accepted as a coefficient: scale the object instead.
    Number(Complex64),
    List(Vec<TdElement>),
}

impl TdElement {
    /// Wrap a coefficient closure.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(f64, &TdArgs) -> Complex64 + Send + Sync + 'static,
    {
        TdElement::Function(Arc::new(f))
    }

    /// `[object, coefficient]` pair.
    pub fn term(q: Qobj, coefficient: TdElement) -> Self {
        TdElement::List(vec![TdElement::Qobj(q), coefficient])
    }

    fn kind(&self) -> &'static str {
        match self {
            TdElement::Qobj(_) => "qobj",
            TdElement::Function(_) => "function",
            TdElement::Expression(_) => "expression",
            TdElement::Number(_) => "number",
            TdElement::List(_) => "list",
        }
    }
}

impl fmt::Debug for TdElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TdElement::Qobj(q) => write!(f, "Qobj({}, {:?})", q.dims(), q.shape()),
            TdElement::Function(_) => f.write_str("Function(..)"),
            TdElement::Expression(s) => write!(f, "Expression({:?})", s),
            TdElement::Number(c) => write!(f, "Number({})", c),
            TdElement::List(items) => f.debug_list().entries(items).finish(),
        }
    }
}

impl From<Qobj> for TdElement {
    fn from(q: Qobj) -> Self {
        TdElement::Qobj(q)
    }
}

impl From<Vec<TdElement>> for TdElement {
    fn from(items: Vec<TdElement>) -> Self {
        TdElement::List(items)
    }
}

/// Evaluate a time-dependent description at time `t`.
pub fn evaluate(desc: &TdElement, t: f64, args: &TdArgs) -> Result<Qobj> {
    let items = match desc {
        TdElement::Qobj(q) => return Ok(q.clone()),
        TdElement::List(items) => items,
        other => {
            return Err(Error::Format(format!(
                "time-dependent object must be a Qobj or a list, got {}",
                other.kind()
            )))
        }
    };

    let mut sum: Option<Qobj> = None;
    for item in items {
        let term = evaluate_term(item, t, args)?;
        sum = Some(match sum {
            Some(acc) => acc.checked_add(&term)?,
            None => term,
        });
    }
    trace!(t, terms = items.len(), "evaluated time-dependent object");
    sum.ok_or_else(|| Error::Format("time-dependent list is empty".into()))
}

fn evaluate_term(item: &TdElement, t: f64, args: &TdArgs) -> Result<Qobj> {
    match item {
        TdElement::Qobj(q) => Ok(q.clone()),
        TdElement::List(pair) => match pair.as_slice() {
            [TdElement::Qobj(q), coefficient] => {
                let c = match coefficient {
                    TdElement::Function(f) => f(t, args),
                    TdElement::Expression(src) => Complex64::new(expr::evaluate(src, t, args)?, 0.0),
                    other => {
                        return Err(Error::Format(format!(
                            "coefficient must be a function or an expression, got {}",
                            other.kind()
                        )))
                    }
                };
                Ok(q.mul_scalar(c))
            }
            [first, _] => Err(Error::Format(format!(
                "first element of a term must be a Qobj, got {}",
                first.kind()
            ))),
            _ => Err(Error::Format(format!(
                "a term must be [Qobj, coefficient], got {} elements",
                pair.len()
            ))),
        },
        other => Err(Error::Format(format!(
            "list entries must be a Qobj or a [Qobj, coefficient] pair, got {}",
            other.kind()
        ))),
    }
}

impl Qobj {
    /// Evaluate a time-dependent description; see [`evaluate`].
    pub fn evaluate(desc: &TdElement, t: f64, args: &TdArgs) -> Result<Qobj> {
        evaluate(desc, t, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_qobj_close, basis, sigma_x, sigma_z};
    use approx::assert_relative_eq;

    fn args(pairs: &[(&str, f64)]) -> TdArgs {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_bare_qobj_evaluates_to_itself() {
        let out = evaluate(&sigma_z().into(), 1.0, &TdArgs::new()).unwrap();
        assert_eq!(out, sigma_z());
    }

    #[test]
    fn test_function_coefficient() {
        let desc = TdElement::List(vec![
            sigma_z().into(),
            TdElement::term(sigma_x(), TdElement::function(|t, a| Complex64::new(a["w"] * t, 0.0))),
        ]);
        let out = Qobj::evaluate(&desc, 2.0, &args(&[("w", 0.25)])).unwrap();
        let expected = (&sigma_z() + &(&sigma_x() * 0.5)).unwrap();
        assert_qobj_close(&out, &expected, 1e-14);
    }

    #[test]
    fn test_complex_function_coefficient() {
        let desc = TdElement::List(vec![TdElement::term(
            sigma_x(),
            TdElement::function(|t, _| Complex64::new(0.0, t)),
        )]);
        let out = evaluate(&desc, 3.0, &TdArgs::new()).unwrap();
        assert_eq!(out.get(0, 1), Complex64::new(0.0, 3.0));
    }

    #[test]
    fn test_expression_coefficient() {
        let desc = TdElement::List(vec![
            sigma_z().into(),
            TdElement::term(sigma_x(), TdElement::Expression("A * sin(w * t)".into())),
        ]);
        let a = args(&[("A", 2.0), ("w", std::f64::consts::PI)]);
        let out = evaluate(&desc, 0.5, &a).unwrap();
        assert_relative_eq!(out.get(0, 1).re, 2.0, epsilon = 1e-12);
        assert_relative_eq!(out.get(0, 0).re, 1.0, epsilon = 1e-12);

        // sin(pi) leaves only rounding noise on the off-diagonal
        let out = evaluate(&desc, 1.0, &a).unwrap();
        assert_qobj_close(&out, &sigma_z(), 1e-12);
    }

    #[test]
    fn test_malformed_lists_are_format_errors() {
        let bad = [
            TdElement::List(vec![]),
            TdElement::Expression("t".into()),
            TdElement::Number(Complex64::new(1.0, 0.0)),
            TdElement::List(vec![TdElement::List(vec![sigma_x().into()])]),
            TdElement::List(vec![TdElement::List(vec![
                sigma_x().into(),
                TdElement::Expression("t".into()),
                TdElement::Expression("t".into()),
            ])]),
            TdElement::List(vec![TdElement::List(vec![
                TdElement::Expression("t".into()),
                sigma_x().into(),
            ])]),
            TdElement::List(vec![TdElement::term(
                sigma_x(),
                TdElement::Number(Complex64::new(2.0, 0.0)),
            )]),
            TdElement::List(vec![TdElement::Expression("t".into())]),
        ];
        for desc in &bad {
            let err = evaluate(desc, 0.0, &TdArgs::new()).unwrap_err();
            assert!(matches!(err, Error::Format(_)), "{:?} gave {:?}", desc, err);
        }
    }

    #[test]
    fn test_expression_errors_propagate() {
        let desc = TdElement::List(vec![TdElement::term(
            sigma_x(),
            TdElement::Expression("omega * t".into()),
        )]);
        let err = evaluate(&desc, 0.0, &TdArgs::new()).unwrap_err();
        assert!(matches!(err, Error::Expression(_)));
    }

    #[test]
    fn test_mismatched_terms_fail() {
        let desc = TdElement::List(vec![sigma_x().into(), basis(3, 0).into()]);
        let err = evaluate(&desc, 0.0, &TdArgs::new()).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch(_)));
    }

    #[test]
    fn test_debug_does_not_need_closure_debug() {
        let desc = TdElement::term(sigma_x(), TdElement::function(|_, _| Complex64::new(1.0, 0.0)));
        let s = format!("{:?}", desc);
        assert!(s.contains("Function(..)"));
        assert!(s.contains("[[2], [2]]"));
    }
}
