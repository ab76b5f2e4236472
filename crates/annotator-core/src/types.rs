//! Core data types for the Annotator batch pipeline.
//!
//! Everything here lives for a single request: items come in with the
//! upload, results go out in the response body, nothing is persisted.

use serde::{Deserialize, Serialize};

/// One uploaded image and the prompt the caller attached to it.
#[derive(Debug, Clone)]
pub struct ImageItem {
    /// Original filename from the form part
    pub filename: String,

    /// Raw image bytes
    pub bytes: Vec<u8>,

    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,

    /// Per-item prompt; may be blank, in which case the batch default applies
    pub prompt: String,
}

impl ImageItem {
    /// Resolve the prompt this item is generated with.
    pub fn effective_prompt<'a>(&'a self, default_prompt: &'a str) -> &'a str {
        if self.prompt.trim().is_empty() {
            default_prompt
        } else {
            &self.prompt
        }
    }

    /// Lowercased filename extension, if any.
    pub fn extension(&self) -> Option<String> {
        extension(&self.filename)
    }
}

fn extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Resolve a MIME type for an uploaded part.
///
/// A declared type wins unless it is missing or the generic octet-stream;
/// otherwise the filename extension decides.
pub fn resolve_media_type(declared: Option<&str>, filename: &str) -> String {
    if let Some(declared) = declared.map(str::trim) {
        if !declared.is_empty() && declared != "application/octet-stream" {
            return declared.to_string();
        }
    }

    let extension = extension(filename).unwrap_or_default();

    let media_type = match extension.as_str() {
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        other => {
            tracing::warn!("Unknown image extension '{other}' for {filename}, defaulting to image/jpeg");
            "image/jpeg"
        }
    };
    media_type.to_string()
}

/// Reference to an asset stored by the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub uri: String,
    pub media_type: String,
}

/// Outcome of processing one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Text(String),
    Error(String),
}

/// The per-image entry in the response.
///
/// Serializes as `{ filename, prompt, text }` or `{ filename, prompt, error }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireEntry", into = "WireEntry")]
pub struct ResultEntry {
    pub filename: String,

    /// Effective prompt the item was generated with
    pub prompt: String,

    pub outcome: Outcome,
}

impl ResultEntry {
    pub fn success(filename: impl Into<String>, prompt: impl Into<String>, text: String) -> Self {
        Self {
            filename: filename.into(),
            prompt: prompt.into(),
            outcome: Outcome::Text(text),
        }
    }

    pub fn failure(filename: impl Into<String>, prompt: impl Into<String>, error: String) -> Self {
        Self {
            filename: filename.into(),
            prompt: prompt.into(),
            outcome: Outcome::Error(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Text(_))
    }

    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Text(text) => Some(text),
            Outcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Error(error) => Some(error),
            Outcome::Text(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireEntry {
    filename: String,
    prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<ResultEntry> for WireEntry {
    fn from(entry: ResultEntry) -> Self {
        let (text, error) = match entry.outcome {
            Outcome::Text(text) => (Some(text), None),
            Outcome::Error(error) => (None, Some(error)),
        };
        Self {
            filename: entry.filename,
            prompt: entry.prompt,
            text,
            error,
        }
    }
}

impl From<WireEntry> for ResultEntry {
    fn from(wire: WireEntry) -> Self {
        // An entry carrying an error is a failure even if text slipped in.
        let outcome = match (wire.error, wire.text) {
            (Some(error), _) => Outcome::Error(error),
            (None, text) => Outcome::Text(text.unwrap_or_default()),
        };
        Self {
            filename: wire.filename,
            prompt: wire.prompt,
            outcome,
        }
    }
}

/// Ordered results for one batch, one entry per input image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub results: Vec<ResultEntry>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// `(succeeded, failed)` counts.
    pub fn counts(&self) -> (usize, usize) {
        let succeeded = self.results.iter().filter(|r| r.is_success()).count();
        (succeeded, self.results.len() - succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(prompt: &str) -> ImageItem {
        ImageItem {
            filename: "photo.PNG".to_string(),
            bytes: vec![1, 2, 3],
            media_type: "image/png".to_string(),
            prompt: prompt.to_string(),
        }
    }

    #[test]
    fn test_effective_prompt_falls_back_to_default() {
        assert_eq!(
            item("").effective_prompt("Describe this image"),
            "Describe this image"
        );
        assert_eq!(
            item("   ").effective_prompt("Describe this image"),
            "Describe this image"
        );
    }

    #[test]
    fn test_effective_prompt_prefers_item_prompt() {
        assert_eq!(
            item("What color is this?").effective_prompt("Describe this image"),
            "What color is this?"
        );
    }

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(item("").extension().as_deref(), Some("png"));
        assert_eq!(extension("archive.tar.WEBP").as_deref(), Some("webp"));
        assert_eq!(extension("no-extension"), None);
    }

    #[test]
    fn test_resolve_media_type_prefers_declared() {
        assert_eq!(resolve_media_type(Some("image/webp"), "a.png"), "image/webp");
    }

    #[test]
    fn test_resolve_media_type_from_extension() {
        assert_eq!(resolve_media_type(None, "a.PNG"), "image/png");
        assert_eq!(
            resolve_media_type(Some("application/octet-stream"), "b.jpg"),
            "image/jpeg"
        );
        assert_eq!(resolve_media_type(Some(""), "c.gif"), "image/gif");
    }

    #[test]
    fn test_resolve_media_type_unknown_defaults_to_jpeg() {
        assert_eq!(resolve_media_type(None, "scan"), "image/jpeg");
    }

    #[test]
    fn test_result_entry_success_serialization() {
        let entry = ResultEntry::success("a.png", "Describe", "A trumpet".to_string());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"filename": "a.png", "prompt": "Describe", "text": "A trumpet"})
        );
    }

    #[test]
    fn test_result_entry_failure_serialization() {
        let entry = ResultEntry::failure("b.png", "Describe", "boom".to_string());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"filename": "b.png", "prompt": "Describe", "error": "boom"})
        );
        assert!(json.get("text").is_none());
    }

    #[test]
    fn test_empty_text_is_still_success() {
        let entry = ResultEntry::success("a.png", "p", String::new());
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""text":"""#));
        assert!(entry.is_success());
    }

    #[test]
    fn test_batch_counts() {
        let batch = BatchResult {
            results: vec![
                ResultEntry::success("a.png", "p", "x".to_string()),
                ResultEntry::failure("b.png", "p", "y".to_string()),
                ResultEntry::success("c.png", "p", "z".to_string()),
            ],
        };
        assert_eq!(batch.counts(), (2, 1));
        assert_eq!(batch.len(), 3);
    }
}
