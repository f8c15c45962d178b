//! Error types for the discretizer.
//!
//! Every failure is a local precondition violation that is returned to the
//! caller immediately. Persistence has its own error types in
//! [`crate::persist`], which convert into [`DiscretizeError`].

use crate::persist::{LoadError, SaveError};

/// Convenience alias used across the crate.
pub type Result<T, E = DiscretizeError> = std::result::Result<T, E>;

/// Errors raised while configuring, adapting or applying a discretizer.
#[derive(Debug, thiserror::Error)]
pub enum DiscretizeError {
    /// The layer is not in a state that allows the requested operation,
    /// or its configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An input tensor has an invalid or inconsistent shape.
    #[error("shape error: {0}")]
    Shape(String),

    /// Writing a persisted layer failed.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// Reading a persisted layer failed.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl DiscretizeError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Returns `true` for [`DiscretizeError::Configuration`].
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns `true` for [`DiscretizeError::Shape`].
    pub fn is_shape(&self) -> bool {
        matches!(self, Self::Shape(_))
    }
}
