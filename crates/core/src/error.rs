#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid time value '{value}': {reason}")]
    InvalidTime { value: String, reason: &'static str },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
