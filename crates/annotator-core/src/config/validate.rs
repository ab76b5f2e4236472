//! Configuration validation with range checks.

use crate::error::ConfigError;
use std::net::SocketAddr;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "server.bind is not a socket address: {}",
                self.server.bind
            )));
        }
        if self.annotation.default_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "annotation.default_model must not be empty".into(),
            ));
        }
        if self.annotation.default_prompt.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "annotation.default_prompt must not be empty".into(),
            ));
        }
        if self.gemini.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gemini.endpoint must not be empty".into(),
            ));
        }
        if self.limits.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_upload_mb must be > 0".into(),
            ));
        }
        if self.limits.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.request_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
