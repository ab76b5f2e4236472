//! Request validation.
//!
//! Turns the fields of an annotate form into a [`ValidatedBatch`] or fails
//! with a request-level error before anything touches disk or network.

use crate::config::{AnnotationConfig, DEFAULT_MODEL, DEFAULT_PROMPT};
use crate::credentials::{configured_keys, supplied_keys, CredentialPool};
use crate::error::RequestError;
use crate::types::{resolve_media_type, ImageItem};

/// A file part from the `images` field.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// The raw annotate form, split into fields but not yet interpreted.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    /// Repeated `images` parts, in submission order
    pub images: Vec<UploadedImage>,
    /// `prompts`: JSON array of strings, as received
    pub prompts: Option<Vec<u8>>,
    /// `defaultPrompt`
    pub default_prompt: Option<String>,
    /// `model`
    pub model: Option<String>,
    /// `apiKeys`: JSON array of strings
    pub api_keys: Option<String>,
}

/// Everything the pipeline needs for one batch.
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    pub items: Vec<ImageItem>,
    pub model: String,
    pub default_prompt: String,
    pub credentials: CredentialPool,
}

/// Operator-side inputs to validation: defaults and configured key sources.
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub model: String,
    pub prompt: String,
    pub configured_keys: Vec<String>,
}

impl RequestDefaults {
    /// Resolve defaults and operator keys from config.
    ///
    /// Blank configured defaults fall back to the built-in model and prompt.
    pub fn from_config(annotation: &AnnotationConfig, key_sources: &[String]) -> Self {
        Self {
            model: non_blank(Some(annotation.default_model.clone()))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            prompt: non_blank(Some(annotation.default_prompt.clone()))
                .unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            configured_keys: configured_keys(key_sources),
        }
    }
}

impl BatchRequest {
    /// Validate the request and apply defaults.
    pub fn validate(self, defaults: &RequestDefaults) -> Result<ValidatedBatch, RequestError> {
        if self.images.is_empty() {
            return Err(RequestError::NoImagesProvided);
        }

        let prompts = parse_prompts(self.prompts.as_deref())?;

        let credentials = CredentialPool::new(
            defaults
                .configured_keys
                .iter()
                .cloned()
                .chain(self.api_keys.as_deref().map(supplied_keys).unwrap_or_default()),
        )?;

        let default_prompt = non_blank(self.default_prompt).unwrap_or_else(|| defaults.prompt.clone());
        let model = non_blank(self.model).unwrap_or_else(|| defaults.model.clone());

        let items = self
            .images
            .into_iter()
            .enumerate()
            .map(|(index, image)| ImageItem {
                media_type: resolve_media_type(image.content_type.as_deref(), &image.filename),
                prompt: prompts.get(index).cloned().unwrap_or_default(),
                filename: image.filename,
                bytes: image.bytes,
            })
            .collect();

        Ok(ValidatedBatch {
            items,
            model,
            default_prompt,
            credentials,
        })
    }
}

/// Parse the `prompts` field. Absent or blank means no per-item prompts.
fn parse_prompts(raw: Option<&[u8]>) -> Result<Vec<String>, RequestError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let text = std::str::from_utf8(raw)
        .map_err(|e| RequestError::MalformedPromptList(e.to_string()))?;
    match text.trim() {
        "" => Ok(Vec::new()),
        text => serde_json::from_str::<Vec<String>>(text)
            .map_err(|e| RequestError::MalformedPromptList(e.to_string())),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
