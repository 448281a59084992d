//! Runtime error types.

use thiserror::Error;

/// Errors that can occur while loading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Extraction from the layered providers failed.
    #[error("Failed to extract settings: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// A value was present but unusable.
    #[error("Invalid settings: {message}")]
    Invalid { message: String },
}

impl SettingsError {
    /// Creates an invalid settings error with the given message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for SettingsError {
    fn from(err: figment::Error) -> Self {
        Self::Extract(Box::new(err))
    }
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
