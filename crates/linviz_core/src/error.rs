//! Error kinds raised by the core.
//!
//! Complex eigenvalues and singular transforms are not errors; they are
//! reported through [`crate::eigen::EigenResult::ComplexPair`] and
//! [`crate::frame::FrameNotice`].

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Wrong dimensions or a non-finite entry. Raised before any solver runs.
    #[error("Invalid matrix: {reason}")]
    InvalidMatrix { reason: String },

    /// A transition was requested in a state that does not allow it.
    /// The animation state is left untouched.
    #[error("Animation misuse: cannot {action} while {state}")]
    AnimationMisuse {
        action: &'static str,
        state: &'static str,
    },

    #[error("Invalid setting {name} = {value}: {reason}")]
    InvalidSetting {
        name: &'static str,
        value: f64,
        reason: String,
    },
}

impl CoreError {
    pub(crate) fn invalid_matrix(reason: impl Into<String>) -> Self {
        CoreError::InvalidMatrix {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_setting(name: &'static str, value: f64, reason: impl Into<String>) -> Self {
        CoreError::InvalidSetting {
            name,
            value,
            reason: reason.into(),
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
