//! Validated small matrices.
//!
//! Every matrix handed to the engine goes through one of the constructors
//! here, so downstream code can assume the right shape and finite entries.

use crate::error::{CoreError, CoreResult};
use nalgebra::{Matrix2 as NaMatrix2, Matrix3 as NaMatrix3, Vector2};
use serde::{Deserialize, Serialize};

/// A 2×2 real matrix, row-major, all entries finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Matrix2 {
    rows: [[f64; 2]; 2],
}

impl Matrix2 {
    pub fn new(rows: [[f64; 2]; 2]) -> CoreResult<Self> {
        check_finite(rows.iter().map(|r| r.as_slice()))?;
        Ok(Self { rows })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> CoreResult<Self> {
        check_shape(rows, 2)?;
        Self::new([[rows[0][0], rows[0][1]], [rows[1][0], rows[1][1]]])
    }

    /// Row-major `[a, b, c, d]`.
    pub fn from_slice(entries: &[f64]) -> CoreResult<Self> {
        if entries.len() != 4 {
            return Err(CoreError::invalid_matrix(format!(
                "expected 4 entries for a 2x2 matrix, got {}",
                entries.len()
            )));
        }
        Self::new([[entries[0], entries[1]], [entries[2], entries[3]]])
    }

    pub fn identity() -> Self {
        Self {
            rows: [[1.0, 0.0], [0.0, 1.0]],
        }
    }

    pub fn rows(&self) -> [[f64; 2]; 2] {
        self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    pub fn a(&self) -> f64 {
        self.rows[0][0]
    }

    pub fn b(&self) -> f64 {
        self.rows[0][1]
    }

    pub fn c(&self) -> f64 {
        self.rows[1][0]
    }

    pub fn d(&self) -> f64 {
        self.rows[1][1]
    }

    /// Image of the j-th standard basis vector.
    pub fn column(&self, j: usize) -> Vector2<f64> {
        Vector2::new(self.rows[0][j], self.rows[1][j])
    }

    pub fn apply(&self, v: Vector2<f64>) -> Vector2<f64> {
        self.to_nalgebra() * v
    }

    pub fn determinant(&self) -> f64 {
        self.a() * self.d() - self.b() * self.c()
    }

    pub fn trace(&self) -> f64 {
        self.a() + self.d()
    }

    /// Entry-wise interpolation `self + t (other - self)`.
    pub fn lerp(&self, other: &Matrix2, t: f64) -> Matrix2 {
        let mut rows = self.rows;
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value += t * (other.rows[i][j] - *value);
            }
        }
        Matrix2 { rows }
    }

    pub fn to_nalgebra(&self) -> NaMatrix2<f64> {
        NaMatrix2::new(self.a(), self.b(), self.c(), self.d())
    }

    pub fn from_nalgebra(m: &NaMatrix2<f64>) -> CoreResult<Self> {
        Self::new([[m[(0, 0)], m[(0, 1)]], [m[(1, 0)], m[(1, 1)]]])
    }

    /// For matrices derived from an already validated one (factors,
    /// products, interpolations).
    pub(crate) fn from_trusted(m: &NaMatrix2<f64>) -> Self {
        Self {
            rows: [[m[(0, 0)], m[(0, 1)]], [m[(1, 0)], m[(1, 1)]]],
        }
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix2 {
    type Error = CoreError;

    fn try_from(rows: Vec<Vec<f64>>) -> CoreResult<Self> {
        Self::from_rows(&rows)
    }
}

impl From<Matrix2> for Vec<Vec<f64>> {
    fn from(m: Matrix2) -> Self {
        m.rows.iter().map(|r| r.to_vec()).collect()
    }
}

/// A 3×3 real matrix, row-major, all entries finite. Only analysed
/// numerically; it is never animated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Matrix3 {
    rows: [[f64; 3]; 3],
}

impl Matrix3 {
    pub fn new(rows: [[f64; 3]; 3]) -> CoreResult<Self> {
        check_finite(rows.iter().map(|r| r.as_slice()))?;
        Ok(Self { rows })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> CoreResult<Self> {
        check_shape(rows, 3)?;
        let mut out = [[0.0; 3]; 3];
        for (i, row) in rows.iter().enumerate() {
            out[i].copy_from_slice(row);
        }
        Self::new(out)
    }

    pub fn identity() -> Self {
        Self {
            rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub fn rows(&self) -> [[f64; 3]; 3] {
        self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    pub fn trace(&self) -> f64 {
        self.rows[0][0] + self.rows[1][1] + self.rows[2][2]
    }

    pub fn to_nalgebra(&self) -> NaMatrix3<f64> {
        NaMatrix3::from_fn(|i, j| self.rows[i][j])
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix3 {
    type Error = CoreError;

    fn try_from(rows: Vec<Vec<f64>>) -> CoreResult<Self> {
        Self::from_rows(&rows)
    }
}

impl From<Matrix3> for Vec<Vec<f64>> {
    fn from(m: Matrix3) -> Self {
        m.rows.iter().map(|r| r.to_vec()).collect()
    }
}

/// Either supported size, chosen from the shape of the input rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SquareMatrix {
    Two(Matrix2),
    Three(Matrix3),
}

impl SquareMatrix {
    pub fn from_rows(rows: &[Vec<f64>]) -> CoreResult<Self> {
        match rows.len() {
            2 => Matrix2::from_rows(rows).map(SquareMatrix::Two),
            3 => Matrix3::from_rows(rows).map(SquareMatrix::Three),
            n => Err(CoreError::invalid_matrix(format!(
                "only 2x2 and 3x3 matrices are supported, got {n} rows"
            ))),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            SquareMatrix::Two(_) => 2,
            SquareMatrix::Three(_) => 3,
        }
    }
}

fn check_shape(rows: &[Vec<f64>], n: usize) -> CoreResult<()> {
    if rows.len() != n {
        return Err(CoreError::invalid_matrix(format!(
            "expected {n} rows, got {}",
            rows.len()
        )));
    }
    for (i, row) in rows.iter().enumerate() {
        if row.len() != n {
            return Err(CoreError::invalid_matrix(format!(
                "row {i} has {} columns, expected {n}",
                row.len()
            )));
        }
    }
    Ok(())
}

fn check_finite<'a>(rows: impl Iterator<Item = &'a [f64]>) -> CoreResult<()> {
    for (i, row) in rows.enumerate() {
        for (j, value) in row.iter().enumerate() {
            if !value.is_finite() {
                return Err(CoreError::invalid_matrix(format!(
                    "entry ({i}, {j}) is not finite ({value})"
                )));
            }
        }
    }
    Ok(())
}
