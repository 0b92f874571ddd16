//! Per-frame primitive sets for the decomposition animation.
//!
//! A frame is a pure function of the matrix, the step index and (optionally)
//! the progress into that step, so jumping to any step never replays the
//! animation.

use crate::eigen;
use crate::error::{CoreError, CoreResult};
use crate::mapper::{
    map_basis, map_eigenrays, map_grid, map_unit_square, unit_square, BasisMapping, EigenRay,
    GridLine, Quad, DEGENERACY_TOLERANCE, MAX_GRID_EXTENT,
};
use crate::matrix::Matrix2;
use crate::svd::Svd2;
use log::debug;
use serde::{Deserialize, Serialize};

pub const STAGE_COUNT: usize = 5;
pub const FINAL_STEP: usize = STAGE_COUNT - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationStage {
    Original,
    RotationU,
    ScalingSigma,
    RotationVt,
    Final,
}

impl AnimationStage {
    pub const ALL: [AnimationStage; STAGE_COUNT] = [
        AnimationStage::Original,
        AnimationStage::RotationU,
        AnimationStage::ScalingSigma,
        AnimationStage::RotationVt,
        AnimationStage::Final,
    ];

    pub fn from_index(step: usize) -> CoreResult<Self> {
        Self::ALL.get(step).copied().ok_or_else(|| {
            CoreError::invalid_setting(
                "step_index",
                step as f64,
                format!("must be in [0, {FINAL_STEP}]"),
            )
        })
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            AnimationStage::Original => "Original Matrix",
            AnimationStage::RotationU => "U Rotation",
            AnimationStage::ScalingSigma => "Σ Scaling",
            AnimationStage::RotationVt => "Vᵀ Rotation",
            AnimationStage::Final => "Final Transform",
        }
    }
}

/// Reportable conditions that do not stop a frame from rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameNotice {
    /// Eigenvalues are complex; eigen-rays are omitted.
    ComplexEigenvalues,
    /// The frame's matrix is singular; the square collapses.
    DegenerateTransform,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameOptions {
    /// Length of eigen-rays in math units.
    pub ray_length: f64,
    pub include_eigenrays: bool,
    /// Half-width of the transformed integer grid, in math units.
    pub grid_extent: u32,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            ray_length: 2.0,
            include_eigenrays: true,
            grid_extent: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformSnapshot {
    pub stage: AnimationStage,
    pub step_index: usize,
    /// Fraction of the way from the previous stage to this one.
    pub progress: f64,
    /// The linear map drawn in this frame.
    pub frame_matrix: Matrix2,
    pub basis: BasisMapping,
    pub original_square: Quad,
    pub transformed_square: Quad,
    pub grid: Vec<GridLine>,
    /// Eigen-rays of the input matrix. Empty for a complex pair.
    pub eigenrays: Vec<EigenRay>,
    pub notices: Vec<FrameNotice>,
}

/// Cumulative factor product shown at `stage`: `I`, `U`, `U·Σ`, `U·Σ·Vᵀ`, `M`.
pub fn stage_matrix(m: &Matrix2, svd: &Svd2, stage: AnimationStage) -> Matrix2 {
    match stage {
        AnimationStage::Original => Matrix2::identity(),
        AnimationStage::RotationU => svd.u,
        AnimationStage::ScalingSigma => svd.u_sigma(),
        AnimationStage::RotationVt => svd.product(),
        AnimationStage::Final => *m,
    }
}

pub fn compute_frame(m: &Matrix2, step: usize) -> CoreResult<TransformSnapshot> {
    compute_frame_with(m, step, 1.0, &FrameOptions::default())
}

pub fn compute_frame_at(m: &Matrix2, step: usize, progress: f64) -> CoreResult<TransformSnapshot> {
    compute_frame_with(m, step, progress, &FrameOptions::default())
}

pub fn compute_frame_with(
    m: &Matrix2,
    step: usize,
    progress: f64,
    options: &FrameOptions,
) -> CoreResult<TransformSnapshot> {
    let stage = AnimationStage::from_index(step)?;
    if !(0.0..=1.0).contains(&progress) {
        return Err(CoreError::invalid_setting(
            "progress",
            progress,
            "must be in [0, 1]",
        ));
    }

    if options.grid_extent > MAX_GRID_EXTENT {
        return Err(CoreError::invalid_setting(
            "grid_extent",
            options.grid_extent as f64,
            format!("must be at most {MAX_GRID_EXTENT}"),
        ));
    }

    let svd = Svd2::decompose(m);
    let target = stage_matrix(m, &svd, stage);
    let frame_matrix = match step.checked_sub(1) {
        Some(prev) if progress < 1.0 => {
            stage_matrix(m, &svd, AnimationStage::ALL[prev]).lerp(&target, progress)
        }
        _ => target,
    };

    let eigen = eigen::solve(m);
    let mut notices = Vec::new();
    if eigen.is_complex() {
        notices.push(FrameNotice::ComplexEigenvalues);
    }
    if frame_matrix.determinant().abs() <= DEGENERACY_TOLERANCE {
        notices.push(FrameNotice::DegenerateTransform);
    }

    let eigenrays = if options.include_eigenrays {
        map_eigenrays(&eigen, options.ray_length)?
    } else {
        Vec::new()
    };

    debug!(
        "frame step={} ({}) progress={:.3} notices={:?}",
        step,
        stage.label(),
        progress,
        notices
    );

    Ok(TransformSnapshot {
        stage,
        step_index: step,
        progress,
        frame_matrix,
        basis: map_basis(&frame_matrix),
        original_square: unit_square(),
        transformed_square: map_unit_square(&frame_matrix),
        grid: map_grid(&frame_matrix, options.grid_extent),
        eigenrays,
        notices,
    })
}

impl TransformSnapshot {
    pub fn has_notice(&self, notice: FrameNotice) -> bool {
        self.notices.contains(&notice)
    }

    /// False when the eigenvalues are complex and no rays can be drawn.
    pub fn eigen_renderable(&self) -> bool {
        !self.has_notice(FrameNotice::ComplexEigenvalues)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        compute_frame, compute_frame_at, compute_frame_with, AnimationStage, FrameNotice,
        FrameOptions,
    };
    use crate::error::CoreError;
    use crate::matrix::Matrix2;
    use nalgebra::Vector2;

    fn m2(rows: [[f64; 2]; 2]) -> Matrix2 {
        Matrix2::new(rows).expect("finite matrix")
    }

    fn assert_vec_close(a: Vector2<f64>, b: Vector2<f64>) {
        assert!((a - b).norm() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn stage_labels_and_indices() {
        for (i, stage) in AnimationStage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
            assert_eq!(AnimationStage::from_index(i).unwrap(), *stage);
        }
        assert_eq!(AnimationStage::ScalingSigma.label(), "Σ Scaling");
        assert!(matches!(
            AnimationStage::from_index(5),
            Err(CoreError::InvalidSetting { name: "step_index", .. })
        ));
    }

    #[test]
    fn first_frame_is_the_identity() {
        let frame = compute_frame(&m2([[1.0, 2.0], [3.0, 4.0]]), 0).unwrap();
        assert_eq!(frame.frame_matrix, Matrix2::identity());
        assert_eq!(frame.transformed_square, frame.original_square);
    }

    #[test]
    fn final_frame_shows_the_matrix() {
        let m = m2([[2.0, 0.0], [0.0, 3.0]]);
        let frame = compute_frame(&m, 4).unwrap();
        assert_eq!(frame.stage, AnimationStage::Final);
        assert_eq!(frame.basis.i_transformed, Vector2::new(2.0, 0.0));
        assert_eq!(frame.basis.j_transformed, Vector2::new(0.0, 3.0));
        assert_eq!(frame.transformed_square.area(), 6.0);
        assert!(frame.notices.is_empty());
        assert_eq!(frame.eigenrays.len(), 2);
    }

    #[test]
    fn rotation_vt_stage_reaches_the_matrix() {
        let m = m2([[1.0, 2.0], [-0.5, 1.5]]);
        let frame = compute_frame(&m, 3).unwrap();
        assert_vec_close(frame.basis.i_transformed, m.column(0));
        assert_vec_close(frame.basis.j_transformed, m.column(1));
    }

    #[test]
    fn rotation_stage_preserves_area() {
        let m = m2([[3.0, 1.0], [1.0, 2.0]]);
        let frame = compute_frame(&m, 1).unwrap();
        assert!((frame.transformed_square.signed_area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn partial_progress_interpolates_between_stages() {
        let m = m2([[2.0, 0.0], [0.0, 3.0]]);
        let start = compute_frame_at(&m, 4, 0.0).unwrap();
        let half = compute_frame_at(&m, 4, 0.5).unwrap();
        let end = compute_frame_at(&m, 4, 1.0).unwrap();
        let expected_mid = (start.basis.i_transformed + end.basis.i_transformed) / 2.0;
        assert_vec_close(half.basis.i_transformed, expected_mid);
        assert_eq!(end.frame_matrix, m);
    }

    #[test]
    fn rotation_reports_complex_eigenvalues_without_rays() {
        let frame = compute_frame(&m2([[0.0, -1.0], [1.0, 0.0]]), 4).unwrap();
        assert!(frame.eigenrays.is_empty());
        assert!(frame.has_notice(FrameNotice::ComplexEigenvalues));
        assert!(!frame.eigen_renderable());
    }

    #[test]
    fn singular_matrix_renders_degenerate_square() {
        let frame = compute_frame(&m2([[1.0, 2.0], [2.0, 4.0]]), 4).unwrap();
        assert!(frame.has_notice(FrameNotice::DegenerateTransform));
        assert!(frame.transformed_square.is_degenerate());
    }

    #[test]
    fn options_control_rays_and_grid() {
        let options = FrameOptions {
            ray_length: 1.0,
            include_eigenrays: false,
            grid_extent: 1,
        };
        let frame = compute_frame_with(&m2([[2.0, 0.0], [0.0, 1.0]]), 4, 1.0, &options).unwrap();
        assert!(frame.eigenrays.is_empty());
        assert_eq!(frame.grid.len(), 6);
    }

    #[test]
    fn rejects_oversized_grid() {
        let options = FrameOptions {
            grid_extent: 1_000_000,
            ..FrameOptions::default()
        };
        assert!(matches!(
            compute_frame_with(&Matrix2::identity(), 4, 1.0, &options),
            Err(CoreError::InvalidSetting { name: "grid_extent", .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        let m = Matrix2::identity();
        assert!(compute_frame(&m, 5).is_err());
        assert!(compute_frame_at(&m, 2, 1.5).is_err());
        assert!(compute_frame_at(&m, 2, f64::NAN).is_err());
    }

    #[test]
    fn frames_are_pure() {
        let m = m2([[0.4, -1.2], [2.2, 0.9]]);
        assert_eq!(compute_frame(&m, 2).unwrap(), compute_frame(&m, 2).unwrap());
    }
}
