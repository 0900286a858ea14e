use thiserror::Error;

/// Domain errors raised by the workout model, store and codec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkoutError {
    /// A workout was requested without a concrete variant.
    #[error("cannot construct an abstract workout; use running or cycling")]
    InvalidConstruction,

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("unknown workout type: {0:?}")]
    UnknownWorkoutType(String),

    #[error("no workout with id {0}")]
    NotFound(String),

    #[error("duplicate workout id {0}")]
    DuplicateId(String),

    /// A snapshot record with a known type but an unusable shape.
    #[error("malformed workout record: {0}")]
    MalformedRecord(String),
}

impl WorkoutError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by [`crate::app::App`] requests.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Workout(#[from] WorkoutError),

    #[error("snapshot storage failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type WorkoutResult<T> = Result<T, WorkoutError>;
