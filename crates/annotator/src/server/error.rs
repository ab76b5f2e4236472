//! HTTP mapping of request-level errors.

use annotator_core::RequestError;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A request-level failure and the status it is reported with.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: RequestError,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<RequestError> for ApiError {
    fn from(error: RequestError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: RequestError::InvalidPayload(rejection.body_text()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        // Oversized bodies keep their 413; everything else is a bad request.
        let status = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            StatusCode::PAYLOAD_TOO_LARGE
        } else {
            StatusCode::BAD_REQUEST
        };
        Self {
            status,
            error: RequestError::InvalidPayload(e.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!("Rejected annotate request: {}", self.error);
        let body = ErrorBody {
            error: self.error.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}
