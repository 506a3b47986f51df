use std::time::Duration;

use crate::foundation::core::Stage;

/// Convenience result type used across Slidereel.
pub type SlidereelResult<T> = Result<T, SlidereelError>;

/// Top-level error taxonomy used by builder APIs.
#[derive(thiserror::Error, Debug)]
pub enum SlidereelError {
    /// Missing or unreadable build inputs, or a script without slides.
    #[error("input error: {0}")]
    Input(String),

    /// Settings or slide data that cannot be rendered.
    #[error("validation error: {0}")]
    Validation(String),

    /// An external collaborator call failed.
    #[error("{stage} stage failed: {message}")]
    Stage {
        /// Stage that was running when the failure happened.
        stage: Stage,
        /// Collaborator-provided detail.
        message: String,
    },

    /// An external collaborator call exceeded the configured stage timeout.
    #[error("{stage} stage timed out after {after:?}")]
    Timeout {
        /// Stage that was running when the timer expired.
        stage: Stage,
        /// Configured timeout.
        after: Duration,
    },

    /// Final video assembly could not produce an output.
    #[error("assembly error: {0}")]
    Assembly(String),

    /// Errors when deserializing scripts or serializing reports.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlidereelError {
    /// Build a [`SlidereelError::Input`] value.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`SlidereelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SlidereelError::Stage`] value.
    pub fn stage(stage: Stage, msg: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            message: msg.into(),
        }
    }

    /// Build a [`SlidereelError::Assembly`] value.
    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly(msg.into())
    }

    /// Build a [`SlidereelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Stage attached to this error, if it came from a collaborator call.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } | Self::Timeout { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
