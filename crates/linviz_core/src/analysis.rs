//! One-call analysis entry points used by the UI layer.

use crate::eigen::{self, EigenResult, GeneralEigenResult};
use crate::matrix::{Matrix2, SquareMatrix};
use crate::properties::{self, MatrixProperties};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixAnalysis {
    pub eigen: EigenResult,
    pub properties: MatrixProperties,
}

/// Eigen-decomposition and invariants of a 2×2 matrix. Deterministic,
/// recomputed from scratch on every call.
pub fn analyze_matrix(m: &Matrix2) -> MatrixAnalysis {
    let analysis = MatrixAnalysis {
        eigen: eigen::solve(m),
        properties: properties::analyze(m),
    };
    debug!(
        "analyzed {:?}: det={} complex={}",
        m.rows(),
        analysis.properties.determinant,
        analysis.eigen.is_complex()
    );
    analysis
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "size")]
pub enum SquareAnalysis {
    #[serde(rename = "2")]
    Two(MatrixAnalysis),
    #[serde(rename = "3")]
    Three {
        eigen: GeneralEigenResult,
        properties: MatrixProperties,
    },
}

impl SquareAnalysis {
    pub fn properties(&self) -> &MatrixProperties {
        match self {
            SquareAnalysis::Two(analysis) => &analysis.properties,
            SquareAnalysis::Three { properties, .. } => properties,
        }
    }
}

/// Analysis for either supported size. 3×3 matrices use the numerical
/// eigen-solver and are not animated.
pub fn analyze_square(m: &SquareMatrix) -> anyhow::Result<SquareAnalysis> {
    match m {
        SquareMatrix::Two(m) => Ok(SquareAnalysis::Two(analyze_matrix(m))),
        SquareMatrix::Three(m) => {
            debug!("analyzing 3x3 {:?}", m.rows());
            Ok(SquareAnalysis::Three {
                eigen: eigen::solve_general(m)?,
                properties: properties::analyze3(m),
            })
        }
    }
}
