use thiserror::Error;

/// Request-path failures. Each variant maps to one caller-visible failure kind;
/// none of them are retried.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("insufficient game data for team '{team}' ({games} games logged, min {required} required)")]
    InsufficientData {
        team: String,
        games: usize,
        required: usize,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PredictError {
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::InsufficientData { .. } => "insufficient_data",
            PredictError::NotFound(_) => "not_found",
            PredictError::Upstream(_) => "upstream",
            PredictError::Validation(_) => "validation",
            PredictError::Internal(_) => "internal",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        PredictError::Validation(msg.into())
    }
}

pub type PredictResult<T> = Result<T, PredictError>;
