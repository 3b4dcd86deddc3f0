// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tensor-dimension descriptors and the quantum object type classifier.
//!
//! A [`Dims`] value records the tensor-factor structure of a matrix's
//! row space (`left`) and column space (`right`). Ordinary state spaces
//! use flat factor lists; superoperator spaces nest one level deeper, one
//! inner list per vectorized operator index.
//!
//! ```text
//! ket on C2 ⊗ C3         [[2, 3], [1, 1]]
//! operator on C2         [[2], [2]]
//! superoperator on C2    [[[2], [2]], [[2], [2]]]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// One side (row space or column space) of a dimension descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimSide {
    /// Ordered tensor factor dimensions.
    Flat(Vec<usize>),
    /// Factor lists of a vectorized operator space.
    Nested(Vec<Vec<usize>>),
}

impl DimSide {
    /// Product of every factor on this side.
    pub fn product(&self) -> usize {
        match self {
            DimSide::Flat(f) => f.iter().product(),
            DimSide::Nested(n) => n.iter().map(|f| f.iter().product::<usize>()).product(),
        }
    }

    /// Whether this side is a flat factor list.
    pub fn is_flat(&self) -> bool {
        matches!(self, DimSide::Flat(_))
    }

    /// Whether the side describes a one-dimensional space.
    pub fn is_scalar(&self) -> bool {
        self.product() == 1
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        match self {
            DimSide::Flat(f) => f.len(),
            DimSide::Nested(n) => n.len(),
        }
    }

    /// Whether the side has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All factors in order, nested lists concatenated.
    pub fn flatten(&self) -> Vec<usize> {
        match self {
            DimSide::Flat(f) => f.clone(),
            DimSide::Nested(n) => n.iter().flatten().copied().collect(),
        }
    }

    /// Whether the leading entries of two sides agree.
    pub(crate) fn leading_eq(&self, other: &DimSide) -> bool {
        match (self, other) {
            (DimSide::Flat(a), DimSide::Flat(b)) => a.first() == b.first(),
            (DimSide::Nested(a), DimSide::Nested(b)) => a.first() == b.first(),
            _ => false,
        }
    }
}

impl From<Vec<usize>> for DimSide {
    fn from(f: Vec<usize>) -> Self {
        DimSide::Flat(f)
    }
}

impl From<Vec<Vec<usize>>> for DimSide {
    fn from(n: Vec<Vec<usize>>) -> Self {
        DimSide::Nested(n)
    }
}

impl fmt::Display for DimSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, v: &[usize]) -> fmt::Result {
            write!(f, "[")?;
            for (i, d) in v.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", d)?;
            }
            write!(f, "]")
        }
        match self {
            DimSide::Flat(v) => list(f, v),
            DimSide::Nested(n) => {
                write!(f, "[")?;
                for (i, v) in n.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    list(f, v)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Dimension descriptor `[left, right]` of a quantum object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dims {
    /// Row-space factors.
    pub left: DimSide,
    /// Column-space factors.
    pub right: DimSide,
}

impl Dims {
    /// Create a descriptor from its two sides.
    pub fn new(left: impl Into<DimSide>, right: impl Into<DimSide>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// `[[rows], [cols]]`.
    pub fn flat(rows: usize, cols: usize) -> Self {
        Self::new(vec![rows], vec![cols])
    }

    /// Operator dims `[factors, factors]`.
    pub fn oper(factors: &[usize]) -> Self {
        Self::new(factors.to_vec(), factors.to_vec())
    }

    /// Ket dims `[factors, [1, ...]]`.
    pub fn ket(factors: &[usize]) -> Self {
        Self::new(factors.to_vec(), vec![1; factors.len()])
    }

    /// Bra dims `[[1, ...], factors]`.
    pub fn bra(factors: &[usize]) -> Self {
        Self::new(vec![1; factors.len()], factors.to_vec())
    }

    /// Superoperator dims over a space whose operators have `factors`.
    pub fn super_oper(factors: &[usize]) -> Self {
        let side = DimSide::Nested(vec![factors.to_vec(), factors.to_vec()]);
        Self {
            left: side.clone(),
            right: side,
        }
    }

    /// Matrix shape implied by the descriptor.
    pub fn shape(&self) -> (usize, usize) {
        (self.left.product(), self.right.product())
    }

    /// Descriptor with the two sides exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            left: self.right.clone(),
            right: self.left.clone(),
        }
    }

    /// Semantic type of an object with these dims.
    pub fn qtype(&self) -> QobjType {
        type_from_dims(self)
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.left, self.right)
    }
}

/// Semantic kind of a quantum object, derived from its dims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QobjType {
    /// Column state vector
    Ket,
    /// Row state vector
    Bra,
    /// Operator on a state space
    Oper,
    /// Vectorized operator in column form
    OperatorKet,
    /// Vectorized operator in row form
    OperatorBra,
    /// Superoperator acting on operators
    Super,
}

impl QobjType {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            QobjType::Ket => "ket",
            QobjType::Bra => "bra",
            QobjType::Oper => "oper",
            QobjType::OperatorKet => "operator-ket",
            QobjType::OperatorBra => "operator-bra",
            QobjType::Super => "super",
        }
    }

    /// Whether the type is a vector-like shape (ket, bra or vectorized operator).
    pub fn is_vector_like(&self) -> bool {
        matches!(
            self,
            QobjType::Ket | QobjType::Bra | QobjType::OperatorKet | QobjType::OperatorBra
        )
    }

    /// Whether the type is an operator or superoperator.
    pub fn is_operator_like(&self) -> bool {
        matches!(self, QobjType::Oper | QobjType::Super)
    }
}

impl fmt::Display for QobjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QobjType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ket" => Ok(QobjType::Ket),
            "bra" => Ok(QobjType::Bra),
            "oper" => Ok(QobjType::Oper),
            "operator-ket" => Ok(QobjType::OperatorKet),
            "operator-bra" => Ok(QobjType::OperatorBra),
            "super" => Ok(QobjType::Super),
            other => Err(Error::InvalidArgument(format!(
                "unknown quantum object type '{}'",
                other
            ))),
        }
    }
}

/// Classify a dimension descriptor.
///
/// A side whose factors multiply to 1 is scalar-like. A scalar-like left
/// side gives a bra (or operator-bra when the right side is nested);
/// otherwise a scalar-like right side gives a ket (or operator-ket);
/// otherwise the object is an operator, or a superoperator when the left
/// side is nested. `[[1], [1]]` therefore classifies as a bra.
pub fn type_from_dims(dims: &Dims) -> QobjType {
    if dims.left.is_scalar() {
        return if dims.right.is_flat() {
            QobjType::Bra
        } else {
            QobjType::OperatorBra
        };
    }
    if dims.right.is_scalar() {
        return if dims.left.is_flat() {
            QobjType::Ket
        } else {
            QobjType::OperatorKet
        };
    }
    if dims.left.is_flat() {
        QobjType::Oper
    } else {
        QobjType::Super
    }
}

/// Collapse a superoperator descriptor to flat sides.
///
/// Each nested factor list is replaced by its product, so
/// `[[[2, 3], [2, 3]], [[2, 3], [2, 3]]]` becomes `[[6, 6], [6, 6]]`.
/// Flat sides are returned unchanged.
pub fn collapse_dims_super(dims: &Dims) -> Dims {
    fn collapse(side: &DimSide) -> DimSide {
        match side {
            DimSide::Flat(f) => DimSide::Flat(f.clone()),
            DimSide::Nested(n) => DimSide::Flat(n.iter().map(|f| f.iter().product()).collect()),
        }
    }
    Dims {
        left: collapse(&dims.left),
        right: collapse(&dims.right),
    }
}

/// Enumerate the flattened factors of a side, keeping the nesting.
///
/// Returns, for every entry of the side, the running indices its factors
/// occupy in [`DimSide::flatten`]: `[[2], [3, 4]]` → `[[0], [1, 2]]`.
pub fn enumerate_flat(side: &DimSide) -> Vec<Vec<usize>> {
    match side {
        DimSide::Flat(f) => (0..f.len()).map(|i| vec![i]).collect(),
        DimSide::Nested(n) => {
            let mut next = 0;
            n.iter()
                .map(|f| {
                    let idx: Vec<usize> = (next..next + f.len()).collect();
                    next += f.len();
                    idx
                })
                .collect()
        }
    }
}

/// Drop positions where both product factors are 1.
///
/// The shorter list is padded with a sentinel that never equals 1, and a
/// side that would become empty keeps a single factor of 1.
pub(crate) fn collapse_unit_factors(left: &[usize], right: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let n = left.len().max(right.len());
    let mask: Vec<bool> = (0..n)
        .map(|i| left.get(i) == Some(&1) && right.get(i) == Some(&1))
        .collect();
    let keep = |side: &[usize]| -> Vec<usize> {
        let kept: Vec<usize> = side
            .iter()
            .zip(&mask)
            .filter(|(_, m)| !**m)
            .map(|(&d, _)| d)
            .collect();
        if kept.is_empty() {
            vec![1]
        } else {
            kept
        }
    };
    (keep(left), keep(right))
}
