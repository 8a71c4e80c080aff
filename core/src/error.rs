use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestraError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {kind} {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Conflict: {kind} {id} already exists")]
    Conflict { kind: &'static str, id: String },

    #[error("Conversation busy: a reply is still pending")]
    Busy,

    #[error("Vault error: {0}")]
    Vault(String),

    #[error("Responder error: {0}")]
    Responder(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OrchestraError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    /// Stable machine-readable tag, used by the FFI error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Busy => "busy",
            Self::Vault(_) => "vault",
            Self::Responder(_) => "responder",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Serialization(_) => "serialization",
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestraError>;
