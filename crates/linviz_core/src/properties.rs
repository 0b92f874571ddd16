use crate::matrix::{Matrix2, Matrix3};
use serde::{Deserialize, Serialize};

/// Display invariants of a matrix. Recomputed from the matrix every time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixProperties {
    pub determinant: f64,
    pub trace: f64,
    /// `|det|`: area scale in 2D, volume scale in 3D.
    pub area_scale: f64,
    /// `det > 0`. Display only.
    pub orientation_preserved: bool,
}

impl MatrixProperties {
    fn from_invariants(determinant: f64, trace: f64) -> Self {
        Self {
            determinant,
            trace,
            area_scale: determinant.abs(),
            orientation_preserved: determinant > 0.0,
        }
    }

    pub fn orientation_label(&self) -> &'static str {
        if self.orientation_preserved {
            "Preserved"
        } else {
            "Reversed"
        }
    }
}

pub fn analyze(m: &Matrix2) -> MatrixProperties {
    MatrixProperties::from_invariants(m.determinant(), m.trace())
}

pub fn analyze3(m: &Matrix3) -> MatrixProperties {
    MatrixProperties::from_invariants(determinant3(m), m.trace())
}

/// Cofactor expansion along the first row.
pub fn determinant3(m: &Matrix3) -> f64 {
    let r = m.rows();
    r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
        - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
        + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0])
}

#[cfg(test)]
mod tests {
    use super::{analyze, analyze3, determinant3};
    use crate::matrix::{Matrix2, Matrix3};

    #[test]
    fn scaling_matrix_properties() {
        let m = Matrix2::new([[2.0, 0.0], [0.0, 0.5]]).unwrap();
        let props = analyze(&m);
        assert_eq!(props.determinant, 1.0);
        assert_eq!(props.trace, 2.5);
        assert_eq!(props.area_scale, 1.0);
        assert!(props.orientation_preserved);
        assert_eq!(props.orientation_label(), "Preserved");
    }

    #[test]
    fn reflection_reverses_orientation() {
        let m = Matrix2::new([[0.0, 1.0], [1.0, 0.0]]).unwrap();
        let props = analyze(&m);
        assert_eq!(props.determinant, -1.0);
        assert_eq!(props.area_scale, 1.0);
        assert!(!props.orientation_preserved);
        assert_eq!(props.orientation_label(), "Reversed");
    }

    #[test]
    fn singular_matrix_is_not_orientation_preserving() {
        let m = Matrix2::new([[1.0, 2.0], [2.0, 4.0]]).unwrap();
        let props = analyze(&m);
        assert_eq!(props.determinant, 0.0);
        assert!(!props.orientation_preserved);
    }

    #[test]
    fn determinant3_matches_nalgebra() {
        let m = Matrix3::new([[2.0, -3.0, 1.0], [2.0, 0.0, -1.0], [1.0, 4.0, 5.0]]).unwrap();
        assert_eq!(determinant3(&m), 49.0);
        assert!((determinant3(&m) - m.to_nalgebra().determinant()).abs() < 1e-12);

        let props = analyze3(&m);
        assert_eq!(props.trace, 7.0);
        assert_eq!(props.area_scale, 49.0);
        assert!(props.orientation_preserved);
    }
}
