//! Error types for the Annotator batch pipeline.
//!
//! Errors are split by scope: request-level errors abort a batch before any
//! processing, item-level errors are contained to a single image and end up
//! as that image's error string.

use thiserror::Error;

/// Message surfaced for every failed upload, whatever the underlying cause.
pub const UPLOAD_FAILED_MESSAGE: &str = "unable to upload file to the generation service";

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Request-level errors. Any of these aborts the whole batch with HTTP 400.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The `images` field was missing or held no files
    #[error("No images provided. Attach at least one image.")]
    NoImagesProvided,

    /// The `prompts` field was present but not a JSON array of strings
    #[error("Prompts must be a JSON array of strings: {0}")]
    MalformedPromptList(String),

    /// Neither the operator configuration nor the request supplied a key
    #[error("No API keys available. Configure GEMINI_API_KEY or send apiKeys with the request.")]
    NoCredentials,

    /// The multipart body could not be read
    #[error("Invalid form payload: {0}")]
    InvalidPayload(String),
}

/// Item-level errors, contained to the image that raised them.
#[derive(Error, Debug)]
pub enum ItemError {
    /// Writing the staging file failed
    #[error("Failed to stage image: {0}")]
    Staging(#[source] std::io::Error),

    /// The upload call failed or returned an unusable asset reference.
    ///
    /// `reason` is kept for logs only; the surfaced message is fixed.
    #[error("unable to upload file to the generation service")]
    UploadFailed { reason: String },

    /// The generation call failed
    #[error("{message}")]
    GenerationFailed {
        message: String,
        status_code: Option<u16>,
    },

    /// Removing the staging file failed (logged, never surfaced)
    #[error("Failed to remove staging file: {0}")]
    ResourceCleanupFailed(#[source] std::io::Error),
}

impl ItemError {
    pub fn upload(reason: impl Into<String>) -> Self {
        Self::UploadFailed {
            reason: reason.into(),
        }
    }

    pub fn generation(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::GenerationFailed {
            message: message.into(),
            status_code,
        }
    }
}

/// Convenience type alias for item-level results.
pub type ItemResult<T> = std::result::Result<T, ItemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_failure_hides_reason() {
        let err = ItemError::upload("HTTP 503: backend unavailable");
        assert_eq!(err.to_string(), UPLOAD_FAILED_MESSAGE);
    }

    #[test]
    fn test_generation_failure_uses_message() {
        let err = ItemError::generation("Gemini HTTP 400: bad model", Some(400));
        assert_eq!(err.to_string(), "Gemini HTTP 400: bad model");
    }
}
