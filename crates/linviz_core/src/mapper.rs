//! Math-space geometry of a 2×2 linear map.
//!
//! A matrix is fully described by where it sends the basis vectors: its
//! columns. Everything here follows from that. All outputs are in math space
//! (y up, unit = 1); screen placement is [`crate::viewport`]'s job.

use crate::eigen::EigenResult;
use crate::error::{CoreError, CoreResult};
use crate::matrix::Matrix2;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// `|det|` at or below this renders as a collapsed square.
pub const DEGENERACY_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasisMapping {
    pub i_original: Vector2<f64>,
    pub j_original: Vector2<f64>,
    pub i_transformed: Vector2<f64>,
    pub j_transformed: Vector2<f64>,
}

pub fn map_basis(m: &Matrix2) -> BasisMapping {
    BasisMapping {
        i_original: Vector2::new(1.0, 0.0),
        j_original: Vector2::new(0.0, 1.0),
        i_transformed: m.column(0),
        j_transformed: m.column(1),
    }
}

/// Four vertices in winding order. May be non-convex or collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub vertices: [Vector2<f64>; 4],
}

impl Quad {
    /// Shoelace formula; negative when the winding is clockwise.
    pub fn signed_area(&self) -> f64 {
        let v = &self.vertices;
        let mut twice = 0.0;
        for k in 0..4 {
            let (p, q) = (v[k], v[(k + 1) % 4]);
            twice += p.x * q.y - q.x * p.y;
        }
        twice / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn is_degenerate(&self) -> bool {
        self.area() <= DEGENERACY_TOLERANCE
    }
}

pub fn unit_square() -> Quad {
    map_unit_square(&Matrix2::identity())
}

/// `(0,0), M·e₁, M·e₁ + M·e₂, M·e₂`.
pub fn map_unit_square(m: &Matrix2) -> Quad {
    let i = m.column(0);
    let j = m.column(1);
    Quad {
        vertices: [Vector2::zeros(), i, i + j, j],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EigenRay {
    /// 0 for λ₁, 1 for λ₂.
    pub index: usize,
    pub eigenvalue: f64,
    pub direction: Vector2<f64>,
    /// `direction · ray_length`.
    pub tip: Vector2<f64>,
}

impl EigenRay {
    /// `λ1 = 2.00`.
    pub fn label(&self) -> String {
        format!("λ{} = {:.2}", self.index + 1, self.eigenvalue)
    }
}

/// One ray per real eigenvector; none for a complex pair.
pub fn map_eigenrays(eigen: &EigenResult, ray_length: f64) -> CoreResult<Vec<EigenRay>> {
    if !ray_length.is_finite() || ray_length <= 0.0 {
        return Err(CoreError::invalid_setting(
            "ray_length",
            ray_length,
            "must be positive and finite",
        ));
    }
    Ok(eigen
        .real_pairs()
        .into_iter()
        .enumerate()
        .map(|(index, (eigenvalue, direction))| EigenRay {
            index,
            eigenvalue,
            direction,
            tip: direction * ray_length,
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    pub from: Vector2<f64>,
    pub to: Vector2<f64>,
    /// True for the images of the two coordinate axes.
    pub axis: bool,
}

/// Largest half-width of the transformed grid, in math units.
pub const MAX_GRID_EXTENT: u32 = 50;

/// Images of the integer grid lines `x = k` and `y = k`, `|k| ≤ extent`,
/// each clipped to `[-extent, extent]` before mapping. `extent` is capped at
/// [`MAX_GRID_EXTENT`].
pub fn map_grid(m: &Matrix2, extent: u32) -> Vec<GridLine> {
    let extent = extent.min(MAX_GRID_EXTENT);
    let e = extent as f64;
    let mut lines = Vec::with_capacity(2 * (2 * extent as usize + 1));
    for k in -(extent as i64)..=(extent as i64) {
        let k = k as f64;
        lines.push(GridLine {
            from: m.apply(Vector2::new(k, -e)),
            to: m.apply(Vector2::new(k, e)),
            axis: k == 0.0,
        });
        lines.push(GridLine {
            from: m.apply(Vector2::new(-e, k)),
            to: m.apply(Vector2::new(e, k)),
            axis: k == 0.0,
        });
    }
    lines
}
