use thiserror::Error;

#[derive(Error, Debug)]
pub enum EntityError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("EntityServer error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    #[error("No active transaction. Call trans_start() first.")]
    NoActiveTransaction,

    #[error("Transaction {active} is already active; commit or roll it back first")]
    TransactionAlreadyActive { active: String },

    #[error("transaction_id not found in response: {body}")]
    TransactionIdMissing { body: String },

    #[error("Malformed packet: expected at least {expected} bytes, got {actual}")]
    MalformedPacket { expected: usize, actual: usize },

    #[error("Packet decryption failed: {0}")]
    DecryptionFailed(#[source] chacha20poly1305::aead::Error),

    #[error("Packet encryption failed: {0}")]
    EncryptionFailed(#[source] chacha20poly1305::aead::Error),

    #[error("Decrypted payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl EntityError {
    /// Usage errors come from calling the client in a state that cannot succeed.
    pub const fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::NoActiveTransaction | Self::TransactionAlreadyActive { .. }
        )
    }

    /// HTTP status carried by a transport error, if any.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
