use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `barter-microstructure`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum MicrostructureError {
    #[error("missing data: {0}")]
    MissingData(String),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("insufficient sample for {metric}: required {required}, got {actual}")]
    InsufficientSample {
        metric: String,
        required: usize,
        actual: usize,
    },

    #[error("degenerate arithmetic in {0}")]
    DegenerateArithmetic(String),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

impl MicrostructureError {
    /// Determine if the engine may downgrade this error to a neutral report rather than
    /// refusing to run.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_recoverable(&self) -> bool {
        match self {
            MicrostructureError::InvalidConfig(_) => false,
            _ => true,
        }
    }
}

/// Guard a computed value against NaN / infinity leaking into a report.
pub fn ensure_finite(context: &str, value: f64) -> Result<f64, MicrostructureError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MicrostructureError::DegenerateArithmetic(format!(
            "{context} produced non-finite value {value}"
        )))
    }
}
