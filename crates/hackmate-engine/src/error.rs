use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Error policy for the engine (see individual specialists for which
/// variants they absorb and which they propagate).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The generative call itself failed (transport, non-2xx status,
    /// rate/quota limiting).
    #[error("upstream model call failed: {0}")]
    UpstreamModel(String),

    /// The model responded, but the text does not conform to the expected
    /// structured shape even after fencing strip.
    #[error("upstream model output failed validation: {0}")]
    UpstreamParse(String),

    /// A referenced student or hackathon id does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// Duplicate registration or code collision under concurrent access.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("corrupt stored value: {0}")]
    Decode(String),

    #[error(transparent)]
    Storage(#[from] sqlx::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether this is one of the two upstream failure kinds that the
    /// structured specialists replace with a deterministic fallback.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            EngineError::UpstreamModel(_) | EngineError::UpstreamParse(_)
        )
    }
}
