//! Gemini client using the Files API and `generateContent`.
//!
//! Uploads go through the multipart upload protocol; generation references
//! the uploaded file by URI instead of inlining image bytes.

use super::output::GenerationOutput;
use super::{GenerationClient, GenerationRequest, UploadedFile};
use crate::config::Config;
use crate::error::ItemError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// Gemini provider over the public REST API.
pub struct GeminiClient {
    endpoint: String,
    api_version: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(endpoint: &str, api_version: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from the `[gemini]` and `[limits]` config sections.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.gemini.endpoint,
            &config.gemini.api_version,
            Duration::from_millis(config.limits.request_timeout_ms),
        )
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/{}/files", self.endpoint, self.api_version)
    }

    fn generate_url(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!(
            "{}/{}/models/{}:generateContent",
            self.endpoint, self.api_version, model
        )
    }
}

// --- Upload types ---

#[derive(Serialize)]
struct UploadMetadata<'a> {
    file: UploadMetadataFile<'a>,
}

#[derive(Serialize)]
struct UploadMetadataFile<'a> {
    display_name: &'a str,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: Option<RemoteFile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteFile {
    uri: Option<String>,
    mime_type: Option<String>,
}

/// Build a `multipart/related` body: JSON metadata, then the raw bytes.
fn multipart_related_body(
    boundary: &str,
    metadata: &str,
    media_type: &str,
    data: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + metadata.len() + 256);

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.as_bytes());
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {media_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

// --- Generate types ---

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    FileData { file_data: FileData },
    Text { text: String },
}

#[derive(Serialize)]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[async_trait]
impl GenerationClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn upload(
        &self,
        credential: &str,
        path: &Path,
        display_name: &str,
        media_type: &str,
    ) -> Result<UploadedFile, ItemError> {
        let start = Instant::now();

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ItemError::upload(format!("Failed to read staged file: {e}")))?;

        let metadata = serde_json::to_string(&UploadMetadata {
            file: UploadMetadataFile { display_name },
        })
        .map_err(|e| ItemError::upload(format!("Failed to encode upload metadata: {e}")))?;

        let boundary = format!("annotator-{:016x}", rand::random::<u64>());
        let body = multipart_related_body(&boundary, &metadata, media_type, &data);

        let resp = self
            .client
            .post(self.upload_url())
            .timeout(self.timeout)
            .header("x-goog-api-key", credential)
            .header("X-Goog-Upload-Protocol", "multipart")
            .header(
                "content-type",
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| ItemError::upload(format!("Gemini upload request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ItemError::upload(format!("Gemini upload HTTP {status}: {text}")));
        }

        let upload: UploadResponse = resp
            .json()
            .await
            .map_err(|e| ItemError::upload(format!("Failed to parse Gemini upload response: {e}")))?;

        tracing::debug!(
            "Uploaded {display_name} ({} bytes) in {}ms",
            data.len(),
            start.elapsed().as_millis()
        );

        Ok(upload
            .file
            .map(|file| UploadedFile {
                uri: file.uri,
                mime_type: file.mime_type,
            })
            .unwrap_or_default())
    }

    async fn generate(
        &self,
        credential: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, ItemError> {
        let start = Instant::now();

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::FileData {
                        file_data: FileData {
                            mime_type: request.asset.media_type.clone(),
                            file_uri: request.asset.uri.clone(),
                        },
                    },
                    Part::Text {
                        text: request.prompt.clone(),
                    },
                ],
            }],
        };

        let resp = self
            .client
            .post(self.generate_url(&request.model))
            .timeout(self.timeout)
            .header("x-goog-api-key", credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| ItemError::generation(format!("Gemini request failed: {e}"), None))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ItemError::generation(
                format!("Gemini HTTP {status}: {text}"),
                Some(status.as_u16()),
            ));
        }

        let value: serde_json::Value = resp.json().await.map_err(|e| {
            ItemError::generation(format!("Failed to parse Gemini response: {e}"), None)
        })?;

        tracing::debug!(
            "Gemini {} responded in {}ms",
            request.model,
            start.elapsed().as_millis()
        );

        Ok(GenerationOutput::from_json(value))
    }
}
