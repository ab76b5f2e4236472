//! Generation response shapes and text extraction.
//!
//! Responses reach us in a few shapes: a bare text value, a `candidates`
//! list at the top level, or the same list nested under a `response`
//! envelope. They are classified once into [`GenerationOutput`] and
//! [`extract_text`] normalizes every shape to a single string.

use serde::Deserialize;

/// A fragment inside a candidate's content.
///
/// `text` is kept as a raw value so a malformed part only drops itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContentPart {
    pub text: Option<serde_json::Value>,
}

impl ContentPart {
    /// The fragment's text, if it is a string.
    pub fn text(&self) -> Option<&str> {
        self.text.as_ref().and_then(serde_json::Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CandidateContent {
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

/// Known response shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutput {
    /// A direct text value
    Text(String),
    /// `{ "candidates": [...] }`
    Candidates(Vec<Candidate>),
    /// `{ "response": { "candidates": [...] } }`
    Wrapped(Vec<Candidate>),
    /// Anything else
    Unknown,
}

#[derive(Deserialize)]
struct RawResponse {
    #[serde(default)]
    text: Option<serde_json::Value>,
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    response: Option<RawEnvelope>,
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

impl GenerationOutput {
    /// Classify a raw JSON response body.
    ///
    /// A non-empty top-level `text` string takes precedence over candidate
    /// lists; a body matching no known shape is [`GenerationOutput::Unknown`].
    pub fn from_json(value: serde_json::Value) -> Self {
        if let serde_json::Value::String(text) = value {
            return Self::Text(text);
        }

        let raw: RawResponse = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("Unrecognized generation response shape: {e}");
                return Self::Unknown;
            }
        };

        match raw.text {
            Some(serde_json::Value::String(text)) if !text.is_empty() => return Self::Text(text),
            _ => {}
        }
        if let Some(candidates) = raw.candidates {
            return Self::Candidates(candidates);
        }
        if let Some(candidates) = raw.response.and_then(|envelope| envelope.candidates) {
            return Self::Wrapped(candidates);
        }
        Self::Unknown
    }
}

/// Normalize any response shape to plain text.
///
/// Non-empty fragments are joined with newlines; no text at all yields an
/// empty string, never an error.
pub fn extract_text(output: &GenerationOutput) -> String {
    match output {
        GenerationOutput::Text(text) => text.clone(),
        GenerationOutput::Candidates(candidates) | GenerationOutput::Wrapped(candidates) => {
            candidates
                .iter()
                .filter_map(|candidate| candidate.content.as_ref())
                .flat_map(|content| content.parts.iter())
                .filter_map(ContentPart::text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        }
        GenerationOutput::Unknown => String::new(),
    }
}
