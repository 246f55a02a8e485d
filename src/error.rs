use crate::models::QualityTier;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Decode error: {0}")]
    DecodeError(String),
    #[error("Encode error: {0}")]
    EncodeError(String),
    #[error("Environment error: {0}")]
    EnvironmentError(String),
    #[error("Provider error ({status}): {message}")]
    ProviderError { status: u16, message: String },
    #[error("Content missing: {0}")]
    ContentMissing(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl StudioError {
    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        StudioError::ProviderError {
            status,
            message: message.into(),
        }
    }

    /// True for HTTP 403 or any upstream message mentioning permission.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            StudioError::ProviderError { status, message } => {
                *status == 403 || message.to_lowercase().contains("permission")
            }
            StudioError::RequestError(message) => message.to_lowercase().contains("permission"),
            _ => false,
        }
    }

    /// The message shown to the user for a failed generation.
    pub fn user_message(&self, tier: QualityTier) -> String {
        if tier == QualityTier::Pro && self.is_permission_denied() {
            return "Permission denied for the Pro model. Your API key may not have access to it; \
                    switch to the Fast tier and try again."
                .to_string();
        }

        match self {
            StudioError::ValidationError(msg)
            | StudioError::DecodeError(msg)
            | StudioError::EncodeError(msg)
            | StudioError::EnvironmentError(msg)
            | StudioError::ContentMissing(msg)
            | StudioError::ConfigError(msg)
            | StudioError::RequestError(msg)
            | StudioError::SerializationError(msg)
            | StudioError::StorageError(msg) => msg.clone(),
            StudioError::ProviderError { message, .. } => message.clone(),
        }
    }
}

impl From<reqwest::Error> for StudioError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => StudioError::provider(status.as_u16(), e.to_string()),
            None => StudioError::RequestError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(e: serde_json::Error) -> Self {
        StudioError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
