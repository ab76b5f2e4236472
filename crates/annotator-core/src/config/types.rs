//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Built-in model identifier used when neither config nor request set one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Built-in prompt used when neither config nor request set one.
pub const DEFAULT_PROMPT: &str = "Describe this image.";

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Batch-wide defaults applied by the request validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Model used when the request leaves `model` blank
    pub default_model: String,

    /// Prompt used for items whose own prompt is blank, when the request
    /// leaves `defaultPrompt` blank too
    pub default_prompt: String,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            default_prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

/// Operator-supplied API keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Key sources (supports ${ENV_VAR} syntax). Each source may hold several
    /// keys separated by commas, semicolons or whitespace.
    pub sources: Vec<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                "${GEMINI_API_KEY}".to_string(),
                "${GEMINI_API_KEYS}".to_string(),
            ],
        }
    }
}

/// Gemini API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API base URL (upload and generate paths are derived from it)
    pub endpoint: String,

    /// API version path segment
    pub api_version: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            api_version: "v1beta".to_string(),
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum multipart request body in megabytes
    pub max_upload_mb: u64,

    /// Transport timeout for each outbound call in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: 50,
            request_timeout_ms: 120_000,
        }
    }
}

impl LimitsConfig {
    /// Body limit in bytes, as axum's `DefaultBodyLimit` expects.
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

/// Staging file settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StagingConfig {
    /// Directory for temporary image copies. Empty means the system temp dir.
    pub dir: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
