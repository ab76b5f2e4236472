//! Request handlers.

use super::error::ApiError;
use super::AppState;
use annotator_core::{BatchRequest, BatchResult, UploadedImage};
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::Json;
use serde::Serialize;

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: annotator_core::VERSION,
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// POST /api/annotate - Describe a batch of uploaded images
///
/// Always answers 200 once the batch ran, even if every image failed;
/// only request validation produces an error response.
pub async fn annotate_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchResult>, ApiError> {
    let request = read_form(multipart?).await?;
    let batch = request.validate(&state.defaults)?;
    Ok(Json(state.annotator.annotate(&batch).await))
}

/// Split the multipart body into the annotate form fields.
///
/// File parts with neither a name nor content (an empty file input) are
/// skipped; unknown fields are ignored.
async fn read_form(mut multipart: Multipart) -> Result<BatchRequest, ApiError> {
    let mut request = BatchRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                let filename = if filename.is_empty() {
                    format!("image-{}", request.images.len() + 1)
                } else {
                    filename
                };
                request.images.push(UploadedImage {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "prompts" => request.prompts = Some(field.bytes().await?.to_vec()),
            "defaultPrompt" => request.default_prompt = Some(field.text().await?),
            "model" => request.model = Some(field.text().await?),
            "apiKeys" => request.api_keys = Some(field.text().await?),
            other => tracing::debug!("Ignoring unknown form field '{other}'"),
        }
    }

    tracing::debug!("Received annotate form with {} images", request.images.len());
    Ok(request)
}
