// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Text and LaTeX rendering.

use num_complex::Complex64;
use std::fmt::{self, Write as _};
use std::iter;

use super::{Qobj, SuperRep};

/// Rows or columns beyond which LaTeX output is truncated.
pub const LATEX_TRUNCATE: usize = 10;

/// Largest dimension printed as a dense matrix by `Display`.
const DENSE_DISPLAY_LIMIT: usize = 10_000;

impl Qobj {
    fn header(&self) -> String {
        let (rows, cols) = self.shape();
        let qtype = self.qtype();
        let mut s = format!(
            "Quantum object: dims = {}, shape = ({}, {}), type = {}",
            self.dims, rows, cols, qtype
        );
        if qtype.is_operator_like() {
            let _ = write!(s, ", isherm = {}", self.isherm());
            if self.is_super() {
                if let Some(rep) = self.superrep().filter(|r| *r != SuperRep::Super) {
                    let _ = write!(s, ", superrep = {}", rep);
                }
            }
        }
        s
    }

    /// LaTeX rendering: the text header followed by a matrix, truncated to
    /// the first and last five rows/columns beyond [`LATEX_TRUNCATE`].
    pub fn to_latex(&self) -> String {
        let (rows, cols) = self.shape();
        let atol = self.settings.atol;
        let mut s = self.header();
        s.push_str(r"\begin{equation*}\left(\begin{array}{*{11}c}");

        let col_axis = latex_axis(cols);
        for r in latex_axis(rows) {
            let cells = col_axis.iter().map(|&c| match (r, c) {
                (Some(r), Some(c)) => latex_element(self.data.get(r, c), atol),
                (Some(_), None) => r"\cdots".to_string(),
                (None, Some(_)) => r"\vdots".to_string(),
                (None, None) => r"\ddots".to_string(),
            });
            s.push_str(&cells.collect::<Vec<_>>().join(" & "));
            s.push_str(r"\\");
        }

        s.push_str(r"\end{array}\right)\end{equation*}");
        s
    }
}

impl fmt::Display for Qobj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        writeln!(f, "Qobj data =")?;

        let (rows, cols) = self.shape();
        if rows > DENSE_DISPLAY_LIMIT || cols > DENSE_DISPLAY_LIMIT {
            write!(
                f,
                "<{}x{} sparse matrix with {} stored elements>",
                rows,
                cols,
                self.data.nnz()
            )?;
            for (r, c, v) in self.data.iter() {
                write!(f, "\n  ({}, {})\t{}", r, c, text_complex(v))?;
            }
            return Ok(());
        }

        let real = self.data.data().iter().all(|v| v.im == 0.0);
        let dense = self.data.to_dense();
        write!(f, "[")?;
        for (i, row) in dense.rows().into_iter().enumerate() {
            if i > 0 {
                write!(f, ",\n ")?;
            }
            let cells: Vec<String> = row
                .iter()
                .map(|&v| {
                    if real {
                        format!("{:?}", v.re)
                    } else {
                        text_complex(v)
                    }
                })
                .collect();
            write!(f, "[{}]", cells.join(", "))?;
        }
        write!(f, "]")
    }
}

fn text_complex(v: Complex64) -> String {
    if v.im < 0.0 {
        format!("({:?}-{:?}j)", v.re, -v.im)
    } else {
        format!("({:?}+{:?}j)", v.re, v.im)
    }
}

/// Indices to show along one axis; `None` marks the ellipsis.
fn latex_axis(n: usize) -> Vec<Option<usize>> {
    let half = LATEX_TRUNCATE / 2;
    if n > LATEX_TRUNCATE {
        (0..half)
            .map(Some)
            .chain(iter::once(None))
            .chain((n - half..n).map(Some))
            .collect()
    } else {
        (0..n).map(Some).collect()
    }
}

fn latex_element(v: Complex64, atol: f64) -> String {
    if v.im.abs() < atol {
        latex_float(v.re)
    } else if v.re.abs() < atol {
        format!("{}j", latex_float(v.im))
    } else if v.im > 0.0 {
        format!("({}+{}j)", latex_float(v.re), latex_float(v.im))
    } else {
        format!("({}{}j)", latex_float(v.re), latex_float(v.im))
    }
}

fn latex_float(x: f64) -> String {
    if x == 0.0 {
        "0.0".to_string()
    } else if x.abs() > 1000.0 || x.abs() < 0.001 {
        let sci = format!("{:.3e}", x);
        match sci.split_once('e') {
            Some((mantissa, exp)) => {
                let exp: i32 = exp.parse().unwrap_or(0);
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}\\times10^{{{}{:02}}}", mantissa, sign, exp.abs())
            }
            None => sci,
        }
    } else if (x - x.trunc()).abs() < 0.001 {
        format!("{:.1}", x)
    } else {
        format!("{:.3}", x)
    }
}
