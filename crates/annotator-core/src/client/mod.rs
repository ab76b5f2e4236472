//! Generation service client abstraction.
//!
//! The pipeline talks to the generation service only through
//! [`GenerationClient`]: one call to upload an asset, one call to generate
//! text that references it.

pub(crate) mod gemini;
pub(crate) mod output;

pub use gemini::GeminiClient;
pub use output::{extract_text, Candidate, CandidateContent, ContentPart, GenerationOutput};

use crate::error::ItemError;
use crate::types::AssetReference;
use async_trait::async_trait;
use std::path::Path;

/// What the service reported back for an uploaded asset.
///
/// Both fields are optional because the service may answer with an
/// incomplete record; [`UploadedFile::into_reference`] decides usability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedFile {
    pub uri: Option<String>,
    pub mime_type: Option<String>,
}

impl UploadedFile {
    /// Convert into an [`AssetReference`], failing when the URI or media type
    /// is missing or blank.
    pub fn into_reference(self) -> Result<AssetReference, ItemError> {
        let uri = self.uri.filter(|uri| !uri.trim().is_empty());
        let media_type = self.mime_type.filter(|mt| !mt.trim().is_empty());
        match (uri, media_type) {
            (Some(uri), Some(media_type)) => Ok(AssetReference { uri, media_type }),
            (None, _) => Err(ItemError::upload("upload response has no file URI")),
            (_, None) => Err(ItemError::upload("upload response has no media type")),
        }
    }
}

/// A text generation request over one uploaded asset.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub asset: AssetReference,
}

/// Trait that generation service backends implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Arc<dyn GenerationClient>` in shared server state).
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Backend name for logging (e.g., "gemini").
    fn name(&self) -> &str;

    /// Upload the staged file at `path` under `credential`.
    async fn upload(
        &self,
        credential: &str,
        path: &Path,
        display_name: &str,
        media_type: &str,
    ) -> Result<UploadedFile, ItemError>;

    /// Generate text for `request` under `credential`.
    async fn generate(
        &self,
        credential: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, ItemError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_upload_becomes_reference() {
        let file = UploadedFile {
            uri: Some("https://example.test/files/abc".to_string()),
            mime_type: Some("image/png".to_string()),
        };
        let reference = file.into_reference().unwrap();
        assert_eq!(reference.uri, "https://example.test/files/abc");
        assert_eq!(reference.media_type, "image/png");
    }

    #[test]
    fn test_missing_uri_is_upload_failure() {
        let file = UploadedFile {
            uri: None,
            mime_type: Some("image/png".to_string()),
        };
        let err = file.into_reference().unwrap_err();
        assert!(matches!(err, ItemError::UploadFailed { .. }));
        assert_eq!(err.to_string(), crate::error::UPLOAD_FAILED_MESSAGE);
    }

    #[test]
    fn test_blank_media_type_is_upload_failure() {
        let file = UploadedFile {
            uri: Some("https://example.test/files/abc".to_string()),
            mime_type: Some(" ".to_string()),
        };
        assert!(matches!(
            file.into_reference(),
            Err(ItemError::UploadFailed { .. })
        ));
    }
}
