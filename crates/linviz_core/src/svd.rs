//! Rotate–scale–rotate factorisation.
//!
//! `M = U·Σ·Vᵀ` with `U` and `Vᵀ` proper rotations. nalgebra's SVD may return
//! reflections in either orthogonal factor; those are folded into the sign of
//! `σ₂` so that each animation stage is a pure rotation or a pure scaling.

use crate::matrix::{Matrix2, SquareMatrix};
use nalgebra::linalg::SVD;
use nalgebra::{DMatrix, Matrix2 as NaMatrix2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Svd2 {
    pub u: Matrix2,
    /// `|σ₁| ≥ |σ₂|`, `σ₁ ≥ 0`. `σ₂ < 0` iff `det M < 0`.
    pub sigma: [f64; 2],
    pub v_t: Matrix2,
}

impl Svd2 {
    pub fn decompose(m: &Matrix2) -> Self {
        let svd = SVD::new(m.to_nalgebra(), true, true);
        let mut u = svd.u.unwrap_or_else(NaMatrix2::identity);
        let mut v_t = svd.v_t.unwrap_or_else(NaMatrix2::identity);
        let mut sigma = [svd.singular_values[0], svd.singular_values[1]];

        if u.determinant() < 0.0 {
            u.column_mut(1).neg_mut();
            sigma[1] = -sigma[1];
        }
        if v_t.determinant() < 0.0 {
            v_t.row_mut(1).neg_mut();
            sigma[1] = -sigma[1];
        }

        Self {
            u: Matrix2::from_trusted(&u),
            sigma,
            v_t: Matrix2::from_trusted(&v_t),
        }
    }

    pub fn sigma_matrix(&self) -> Matrix2 {
        Matrix2::from_trusted(&NaMatrix2::new(self.sigma[0], 0.0, 0.0, self.sigma[1]))
    }

    /// Angle of `U` in radians, in `(-π, π]`.
    pub fn u_angle(&self) -> f64 {
        self.u.c().atan2(self.u.a())
    }

    /// Angle of `Vᵀ` in radians, in `(-π, π]`.
    pub fn v_t_angle(&self) -> f64 {
        self.v_t.c().atan2(self.v_t.a())
    }

    /// `U·Σ`.
    pub fn u_sigma(&self) -> Matrix2 {
        Matrix2::from_trusted(&(self.u.to_nalgebra() * self.sigma_matrix().to_nalgebra()))
    }

    /// `U·Σ·Vᵀ`, equal to the decomposed matrix up to rounding.
    pub fn product(&self) -> Matrix2 {
        Matrix2::from_trusted(&(self.u_sigma().to_nalgebra() * self.v_t.to_nalgebra()))
    }
}

/// SVD in the `{U, S, V}` shape the compute service returns,
/// with `A = U·diag(S)·Vᵀ` and `S` descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvdResult {
    #[serde(rename = "U")]
    pub u: Vec<Vec<f64>>,
    #[serde(rename = "S")]
    pub s: Vec<f64>,
    #[serde(rename = "V")]
    pub v: Vec<Vec<f64>>,
}

pub fn svd_result(m: &SquareMatrix) -> SvdResult {
    let (n, data) = match m {
        SquareMatrix::Two(m) => (2, m.rows().iter().flatten().copied().collect::<Vec<_>>()),
        SquareMatrix::Three(m) => (3, m.rows().iter().flatten().copied().collect::<Vec<_>>()),
    };
    let matrix = DMatrix::from_row_slice(n, n, &data);
    let svd = SVD::new(matrix, true, true);
    let u = svd.u.unwrap_or_else(|| DMatrix::identity(n, n));
    let v = svd
        .v_t
        .map(|v_t| v_t.transpose())
        .unwrap_or_else(|| DMatrix::identity(n, n));

    SvdResult {
        u: to_rows(&u),
        s: svd.singular_values.iter().copied().collect(),
        v: to_rows(&v),
    }
}

fn to_rows(m: &DMatrix<f64>) -> Vec<Vec<f64>> {
    m.row_iter().map(|row| row.iter().copied().collect()).collect()
}
