//! Error types for the registration client

/// Errors that can occur when talking to the registration backend
///
/// Transport failures and HTTP error statuses are deliberately not told
/// apart: both surface as [`RegistroError::Request`] (or
/// [`RegistroError::Auth`] for login and registration) carrying a
/// human-readable message.
#[derive(Debug, thiserror::Error)]
pub enum RegistroError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistroError {
    /// The bare message, without the variant prefix
    pub fn message(&self) -> String {
        match self {
            RegistroError::Auth(msg)
            | RegistroError::Request(msg)
            | RegistroError::WebSocket(msg)
            | RegistroError::Storage(msg)
            | RegistroError::Config(msg) => msg.clone(),
            RegistroError::Io(e) => e.to_string(),
            RegistroError::Json(e) => e.to_string(),
        }
    }

    /// Re-tag any failure as an authentication failure, keeping its message
    pub(crate) fn into_auth(self) -> Self {
        match self {
            RegistroError::Auth(_) => self,
            other => RegistroError::Auth(other.message()),
        }
    }
}

/// Result type alias for registration client operations
pub type Result<T> = std::result::Result<T, RegistroError>;
