pub mod analysis;
pub mod animation;
pub mod eigen;
pub mod error;
pub mod frame;
pub mod mapper;
pub mod matrix;
pub mod properties;
pub mod remote;
pub mod svd;
/// The `linviz_core` crate is the computation engine behind the Linviz matrix visualiser.
/// Everything here is deterministic and free of rendering or timer code, so the same
/// functions back the browser build and the native tests.
///
/// Key components:
/// - **Eigen**: closed-form 2×2 eigen-decomposition, numerical 3×3 fallback.
/// - **Mapper / Frame**: where a matrix sends the basis, unit square, grid and eigen-rays,
///   stepped through the `U·Σ·Vᵀ` decomposition.
/// - **Animation**: a pure step state machine plus a controller driven by an external
///   `TickScheduler`.
/// - **Viewport**: math-to-screen projection applied uniformly to every primitive.
pub mod traits;
pub mod viewport;

pub use analysis::{analyze_matrix, analyze_square, MatrixAnalysis, SquareAnalysis};
pub use animation::{AnimationController, AnimationSettings, AnimationState};
pub use eigen::EigenResult;
pub use error::{CoreError, CoreResult};
pub use frame::{compute_frame, AnimationStage, TransformSnapshot};
pub use matrix::{Matrix2, Matrix3, SquareMatrix};
pub use properties::MatrixProperties;
pub use viewport::Viewport;
