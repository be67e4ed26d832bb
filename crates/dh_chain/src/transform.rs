//! Homogeneous transforms in numeric or exact form

use std::fmt;
use std::ops::Mul;

use nalgebra::Matrix4;

use crate::expr::{Expr, Substitutions};
use crate::{Error, Result};

/// A 4x4 matrix of symbolic expressions
#[derive(Clone, Debug, PartialEq)]
pub struct ExprMatrix {
    entries: [[Expr; 4]; 4],
}

impl ExprMatrix {
    pub fn identity() -> Self {
        Self {
            entries: std::array::from_fn(|row| {
                std::array::from_fn(|col| if row == col { Expr::one() } else { Expr::zero() })
            }),
        }
    }

    pub fn from_rows(entries: [[Expr; 4]; 4]) -> Self {
        Self { entries }
    }

    /// Lift a numeric matrix into constant expressions
    pub fn from_numeric(matrix: &Matrix4<f64>) -> Self {
        Self {
            entries: std::array::from_fn(|row| {
                // `+ 0.0` turns -0 into 0
                std::array::from_fn(|col| Expr::Const(matrix[(row, col)] + 0.0))
            }),
        }
    }

    pub fn get(&self, row: usize, col: usize) -> &Expr {
        &self.entries[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Expr) {
        self.entries[row][col] = value;
    }

    /// Evaluate every entry, binding free symbols from `subs`.
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] if any entry cannot be evaluated to a
    /// finite number.
    pub fn evaluate(&self, subs: &Substitutions) -> Result<Matrix4<f64>> {
        let mut out = Matrix4::zeros();
        for (row, entries) in self.entries.iter().enumerate() {
            for (col, entry) in entries.iter().enumerate() {
                out[(row, col)] = entry.evaluate(subs)?;
            }
        }
        Ok(out)
    }

    pub fn substitute(&self, subs: &Substitutions) -> Self {
        Self {
            entries: std::array::from_fn(|row| {
                std::array::from_fn(|col| self.entries[row][col].substitute(subs))
            }),
        }
    }

    /// Entry-wise [`Expr::reduce`]
    pub fn reduce(&self, subs: &Substitutions) -> Self {
        Self {
            entries: std::array::from_fn(|row| {
                std::array::from_fn(|col| self.entries[row][col].reduce(subs))
            }),
        }
    }

    pub fn free_symbols(&self) -> std::collections::BTreeSet<String> {
        self.entries
            .iter()
            .flatten()
            .flat_map(|e| e.free_symbols())
            .collect()
    }

    /// LaTeX `matrix` environment wrapped in brackets
    pub fn to_latex(&self) -> String {
        let rows = self
            .entries
            .iter()
            .map(|row| {
                row.iter()
                    .map(Expr::to_latex)
                    .collect::<Vec<_>>()
                    .join(" & ")
            })
            .collect::<Vec<_>>()
            .join("\\\\");
        format!("\\left[\\begin{{matrix}}{rows}\\end{{matrix}}\\right]")
    }
}

impl Mul<&ExprMatrix> for &ExprMatrix {
    type Output = ExprMatrix;

    fn mul(self, rhs: &ExprMatrix) -> ExprMatrix {
        ExprMatrix {
            entries: std::array::from_fn(|row| {
                std::array::from_fn(|col| {
                    Expr::sum((0..4).map(|k| {
                        self.entries[row][k].clone() * rhs.entries[k][col].clone()
                    }))
                })
            }),
        }
    }
}

impl fmt::Display for ExprMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{}, {}, {}, {}]", row[0], row[1], row[2], row[3])?;
        }
        Ok(())
    }
}

/// A homogeneous transform, either evaluated or kept in analytic form.
///
/// Numeric is the default working representation; `Exact` is produced only
/// when a caller asks for a symbolic expression (for display, or to bind
/// free parameters later). [`Transform::evaluate`] forces either variant
/// down to a numeric matrix.
#[derive(Clone, Debug, PartialEq)]
pub enum Transform {
    Numeric(Matrix4<f64>),
    Exact(ExprMatrix),
}

impl Transform {
    pub fn identity() -> Self {
        Transform::Numeric(Matrix4::identity())
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Transform::Exact(_))
    }

    /// Reduce to a numeric matrix with free symbols bound from `subs`.
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] on unbound symbols or non-finite entries.
    pub fn evaluate(&self, subs: &Substitutions) -> Result<Matrix4<f64>> {
        match self {
            Transform::Numeric(m) => {
                if m.iter().all(|v| v.is_finite()) {
                    Ok(*m)
                } else {
                    Err(Error::InvalidParameter {
                        name: "transform".to_string(),
                        reason: "matrix contains non-finite entries".to_string(),
                    })
                }
            }
            Transform::Exact(m) => m.evaluate(subs),
        }
    }

    /// Numeric matrix of a transform without free symbols
    pub fn numeric(&self) -> Result<Matrix4<f64>> {
        self.evaluate(&Substitutions::new())
    }

    /// Exact form; numeric transforms are lifted entry by entry
    pub fn to_exact(&self) -> ExprMatrix {
        match self {
            Transform::Numeric(m) => ExprMatrix::from_numeric(m),
            Transform::Exact(m) => m.clone(),
        }
    }

    pub fn substitute(&self, subs: &Substitutions) -> Self {
        match self {
            Transform::Numeric(m) => Transform::Numeric(*m),
            Transform::Exact(m) => Transform::Exact(m.substitute(subs)),
        }
    }

    /// Bind `subs` and fold constant trigonometric terms to numbers.
    ///
    /// An exact transform left without free symbols becomes numeric.
    pub fn reduce(&self, subs: &Substitutions) -> Self {
        match self {
            Transform::Numeric(m) => Transform::Numeric(*m),
            Transform::Exact(m) => {
                let reduced = m.reduce(subs);
                if reduced.free_symbols().is_empty() {
                    match reduced.evaluate(subs) {
                        Ok(numeric) => Transform::Numeric(numeric),
                        Err(_) => Transform::Exact(reduced),
                    }
                } else {
                    Transform::Exact(reduced)
                }
            }
        }
    }

    pub fn to_latex(&self) -> String {
        self.to_exact().to_latex()
    }

    /// Entry-wise comparison after numeric evaluation.
    ///
    /// Transforms that fail to evaluate never compare equal.
    pub fn approx_eq(&self, other: &Transform, tolerance: f64) -> bool {
        match (self.numeric(), other.numeric()) {
            (Ok(a), Ok(b)) => a
                .iter()
                .zip(b.iter())
                .all(|(x, y)| (x - y).abs() <= tolerance),
            _ => false,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Matrix4<f64>> for Transform {
    fn from(matrix: Matrix4<f64>) -> Self {
        Transform::Numeric(matrix)
    }
}

impl From<ExprMatrix> for Transform {
    fn from(matrix: ExprMatrix) -> Self {
        Transform::Exact(matrix)
    }
}

impl Mul<&Transform> for &Transform {
    type Output = Transform;

    fn mul(self, rhs: &Transform) -> Transform {
        match (self, rhs) {
            (Transform::Numeric(a), Transform::Numeric(b)) => Transform::Numeric(a * b),
            (a, b) => Transform::Exact(&a.to_exact() * &b.to_exact()),
        }
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        &self * &rhs
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Numeric(m) => write!(f, "{m}"),
            Transform::Exact(m) => write!(f, "{m}"),
        }
    }
}
