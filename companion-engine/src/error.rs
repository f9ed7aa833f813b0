use thiserror::Error;

/// Errors produced by the assistant engine and its collaborators
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("Collaborator '{collaborator}' failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    #[error("Dialogue flow error: {0}")]
    FlowError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl EngineError {
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
