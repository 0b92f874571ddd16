//! Eigen-decomposition for 2×2 (closed form) and 3×3 (numerical) matrices.
//!
//! The 2×2 solver works straight from the characteristic polynomial
//! `λ² − tr·λ + det = 0`. A negative discriminant is reported as
//! [`EigenResult::ComplexPair`] without computing the complex values; the
//! visualiser has nothing real to draw in that case.
//!
//! The 3×3 path uses nalgebra's Schur-based `complex_eigenvalues` and finds
//! each eigenvector as the null direction of `A − λI` through a complex SVD.

use crate::matrix::{Matrix2, Matrix3};
use anyhow::{anyhow, bail, Result};
use nalgebra::linalg::SVD;
use nalgebra::Vector2;
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Discriminants in `[-DISCRIMINANT_TOLERANCE, 0)` are treated as zero.
pub const DISCRIMINANT_TOLERANCE: f64 = 1e-10;
/// Off-diagonal entries below this magnitude are treated as zero.
pub const EIGEN_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EigenResult {
    /// Two real eigenpairs with `lambda1 >= lambda2` and unit eigenvectors.
    RealPair {
        lambda1: f64,
        lambda2: f64,
        v1: Vector2<f64>,
        v2: Vector2<f64>,
    },
    ComplexPair,
}

impl EigenResult {
    pub fn is_complex(&self) -> bool {
        matches!(self, EigenResult::ComplexPair)
    }

    /// Real eigenpairs in index order, empty for a complex pair.
    pub fn real_pairs(&self) -> Vec<(f64, Vector2<f64>)> {
        match *self {
            EigenResult::RealPair {
                lambda1,
                lambda2,
                v1,
                v2,
            } => vec![(lambda1, v1), (lambda2, v2)],
            EigenResult::ComplexPair => Vec::new(),
        }
    }
}

/// `tr² − 4·det`.
pub fn discriminant(m: &Matrix2) -> f64 {
    let trace = m.trace();
    trace * trace - 4.0 * m.determinant()
}

/// Closed-form eigen-decomposition of a 2×2 matrix.
///
/// A repeated eigenvalue yields the same direction twice; no generalized
/// eigenvector is searched for in the defective case.
pub fn solve(m: &Matrix2) -> EigenResult {
    let disc = discriminant(m);
    if disc < -DISCRIMINANT_TOLERANCE {
        return EigenResult::ComplexPair;
    }

    let root = disc.max(0.0).sqrt();
    let trace = m.trace();
    let lambda1 = (trace + root) / 2.0;
    let lambda2 = (trace - root) / 2.0;

    EigenResult::RealPair {
        lambda1,
        lambda2,
        v1: eigenvector(m, lambda1),
        v2: eigenvector(m, lambda2),
    }
}

fn eigenvector(m: &Matrix2, lambda: f64) -> Vector2<f64> {
    let (a, b, c, d) = (m.a(), m.b(), m.c(), m.d());
    let v = if b.abs() > EIGEN_EPSILON {
        Vector2::new(1.0, (lambda - a) / b)
    } else if c.abs() > EIGEN_EPSILON {
        Vector2::new((lambda - d) / c, 1.0)
    } else if (lambda - a).abs() <= (lambda - d).abs() {
        // Diagonal: the axis whose diagonal entry is this eigenvalue.
        Vector2::new(1.0, 0.0)
    } else {
        Vector2::new(0.0, 1.0)
    };
    v / v.norm()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexNumber {
    pub re: f64,
    pub im: f64,
}

impl ComplexNumber {
    pub fn is_real(&self) -> bool {
        self.im.abs() <= EIGEN_EPSILON
    }
}

impl From<Complex<f64>> for ComplexNumber {
    fn from(value: Complex<f64>) -> Self {
        Self {
            re: value.re,
            im: value.im,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EigenPair {
    pub value: ComplexNumber,
    pub vector: Vec<ComplexNumber>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralEigenResult {
    /// Real eigenvalues first (descending), then complex ones by real part.
    pub eigenpairs: Vec<EigenPair>,
}

impl GeneralEigenResult {
    pub fn has_complex(&self) -> bool {
        self.eigenpairs.iter().any(|p| !p.value.is_real())
    }
}

/// Eigen-decomposition of a 3×3 matrix.
pub fn solve_general(m: &Matrix3) -> Result<GeneralEigenResult> {
    let matrix = m.to_nalgebra();
    let mut eigenvalues: Vec<Complex<f64>> = matrix.complex_eigenvalues().iter().copied().collect();
    eigenvalues.sort_by(compare_eigenvalues);

    let complex_matrix = matrix.map(|v| Complex::new(v, 0.0));
    let eigenpairs = eigenvalues
        .into_iter()
        .enumerate()
        .map(|(idx, lambda)| {
            let mut shifted = complex_matrix;
            for i in 0..3 {
                shifted[(i, i)] -= lambda;
            }
            let vector = null_direction(shifted, idx)?;
            Ok(EigenPair {
                value: ComplexNumber::from(lambda),
                vector: vector.into_iter().map(ComplexNumber::from).collect(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GeneralEigenResult { eigenpairs })
}

fn compare_eigenvalues(x: &Complex<f64>, y: &Complex<f64>) -> Ordering {
    let x_real = x.im.abs() <= EIGEN_EPSILON;
    let y_real = y.im.abs() <= EIGEN_EPSILON;
    match (x_real, y_real) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => y
            .re
            .partial_cmp(&x.re)
            .unwrap_or(Ordering::Equal)
            .then(y.im.partial_cmp(&x.im).unwrap_or(Ordering::Equal)),
    }
}

/// Right singular vector of the smallest singular value, unit-normalised.
fn null_direction(
    shifted: nalgebra::Matrix3<Complex<f64>>,
    idx: usize,
) -> Result<Vec<Complex<f64>>> {
    let svd = SVD::new(shifted, false, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| anyhow!("Failed to compute eigenvector for eigenvalue index {}", idx))?;
    let mut vector: Vec<Complex<f64>> = v_t.row(2).iter().map(|c| c.conj()).collect();
    let norm = vector.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt();
    if !norm.is_finite() || norm == 0.0 {
        bail!("Eigenvector for eigenvalue index {} has zero length", idx);
    }
    for entry in &mut vector {
        *entry /= norm;
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::{discriminant, solve, solve_general, EigenResult};
    use crate::matrix::{Matrix2, Matrix3};
    use nalgebra::Vector2;
    use num_complex::Complex;

    fn m2(a: f64, b: f64, c: f64, d: f64) -> Matrix2 {
        Matrix2::new([[a, b], [c, d]]).expect("finite matrix")
    }

    fn assert_eigenpair(m: &Matrix2, lambda: f64, v: Vector2<f64>) {
        let lhs = m.apply(v);
        let rhs = v * lambda;
        assert!(
            (lhs - rhs).norm() < 1e-6,
            "M·v = {lhs:?} but λ·v = {rhs:?} for λ = {lambda}"
        );
        assert!((v.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn diagonal_matrix_uses_axis_eigenvectors() {
        let m = m2(2.0, 0.0, 0.0, 0.5);
        assert_eq!(
            solve(&m),
            EigenResult::RealPair {
                lambda1: 2.0,
                lambda2: 0.5,
                v1: Vector2::new(1.0, 0.0),
                v2: Vector2::new(0.0, 1.0),
            }
        );
    }

    #[test]
    fn diagonal_matrix_orders_eigenvalues_descending() {
        let m = m2(0.5, 0.0, 0.0, 2.0);
        match solve(&m) {
            EigenResult::RealPair { lambda1, lambda2, v1, v2 } => {
                assert_eq!((lambda1, lambda2), (2.0, 0.5));
                assert_eq!(v1, Vector2::new(0.0, 1.0));
                assert_eq!(v2, Vector2::new(1.0, 0.0));
            }
            other => panic!("expected real pair, got {other:?}"),
        }
    }

    #[test]
    fn rotation_has_complex_eigenvalues() {
        let m = m2(0.0, -1.0, 1.0, 0.0);
        assert_eq!(discriminant(&m), -4.0);
        assert!(solve(&m).is_complex());
        assert!(solve(&m).real_pairs().is_empty());
    }

    #[test]
    fn general_real_matrices_satisfy_eigen_equation() {
        let cases = [
            m2(2.0, 1.0, 1.0, 2.0),
            m2(1.0, 2.0, 3.0, 4.0),
            m2(4.0, 0.0, 3.0, -1.0),
            m2(0.0, 1.0, 0.0, 0.0),
            m2(-3.0, 7.5, 0.25, 1.0),
            m2(1.0, 1e-12, 2.0, 3.0),
        ];
        for m in cases {
            match solve(&m) {
                EigenResult::RealPair { lambda1, lambda2, v1, v2 } => {
                    assert!(lambda1 >= lambda2);
                    assert_eigenpair(&m, lambda1, v1);
                    assert_eigenpair(&m, lambda2, v2);
                }
                EigenResult::ComplexPair => panic!("expected real eigenvalues for {m:?}"),
            }
        }
    }

    #[test]
    fn tiny_negative_discriminant_is_absorbed() {
        // Shear with rounding noise: tr² − 4det is about −4e-12.
        let m = m2(1.0, 1.0, -1e-12, 1.0);
        assert!(discriminant(&m) < 0.0);
        match solve(&m) {
            EigenResult::RealPair { lambda1, lambda2, v1, v2 } => {
                assert_eq!(lambda1, lambda2);
                assert_eq!(v1, v2);
            }
            other => panic!("expected repeated real eigenvalue, got {other:?}"),
        }
    }

    #[test]
    fn repeated_eigenvalue_returns_same_direction_twice() {
        let m = m2(3.0, 0.0, 0.0, 3.0);
        match solve(&m) {
            EigenResult::RealPair { lambda1, lambda2, v1, v2 } => {
                assert_eq!((lambda1, lambda2), (3.0, 3.0));
                assert_eq!(v1, v2);
            }
            other => panic!("expected real pair, got {other:?}"),
        }
    }

    #[test]
    fn solve_is_deterministic() {
        let m = m2(0.3, -1.7, 2.9, 4.1);
        let first = solve(&m);
        let second = solve(&m);
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    #[test]
    fn general_solver_handles_diagonal_3x3() {
        let m = Matrix3::new([[1.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, -2.0]]).unwrap();
        let result = solve_general(&m).unwrap();
        assert!(!result.has_complex());
        let values: Vec<f64> = result.eigenpairs.iter().map(|p| p.value.re).collect();
        for (got, want) in values.iter().zip([5.0, 1.0, -2.0]) {
            assert!((got - want).abs() < 1e-9, "got {values:?}");
        }
        let v = &result.eigenpairs[0].vector;
        assert!((v[1].re.abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn general_solver_handles_defective_3x3() {
        // Single Jordan block: one eigenvalue, one eigen-direction.
        let m = Matrix3::new([[2.0, 1.0, 0.0], [0.0, 2.0, 1.0], [0.0, 0.0, 2.0]]).unwrap();
        let result = solve_general(&m).unwrap();
        assert_eq!(result.eigenpairs.len(), 3);
        for pair in &result.eigenpairs {
            let norm: f64 = pair.vector.iter().map(|c| c.re * c.re + c.im * c.im).sum();
            assert!((norm - 1.0).abs() < 1e-9);
            let first = pair.vector[0];
            let modulus = (first.re * first.re + first.im * first.im).sqrt();
            assert!(modulus > 0.99, "got {:?}", pair.vector);
        }
    }

    #[test]
    fn general_solver_vectors_satisfy_eigen_equation() {
        let m = Matrix3::new([[2.0, -1.0, 0.0], [1.0, 2.0, 0.0], [0.0, 0.0, 3.0]]).unwrap();
        let result = solve_general(&m).unwrap();
        assert!(result.has_complex());
        assert!(result.eigenpairs[0].value.is_real());
        assert!((result.eigenpairs[0].value.re - 3.0).abs() < 1e-9);

        let a = m.to_nalgebra().map(|v| Complex::new(v, 0.0));
        for pair in &result.eigenpairs {
            let lambda = Complex::new(pair.value.re, pair.value.im);
            let v = nalgebra::Vector3::from_iterator(
                pair.vector.iter().map(|c| Complex::new(c.re, c.im)),
            );
            let residual = a * v - v * lambda;
            assert!(residual.norm() < 1e-8, "residual {residual:?} for λ = {lambda}");
            assert!((v.norm() - 1.0).abs() < 1e-9);
        }
    }
}
