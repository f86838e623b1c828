//! Mapping results and errors to HTTP responses.
//!
//! # Design Decisions
//! - Not found and unacceptable are both 404 with a short text body
//! - Every other failure is 500 with a fixed body; the cause is only logged
//! - The payload's format decides `Content-Type`

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::records::NormalizeError;
use crate::render::{Payload, RenderError, Unacceptable};
use crate::store::SourceError;

/// Errors a request handler can end with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound,

    #[error(transparent)]
    Unacceptable(#[from] Unacceptable),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound | ApiError::Unacceptable(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::NotFound => "Not found",
            ApiError::Unacceptable(_) => "No acceptable representation",
            _ => "Internal server error",
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, body).into_response()
    }
}

impl IntoResponse for Payload {
    fn into_response(self) -> Response {
        let content_type = self.format().content_type();
        ([(header::CONTENT_TYPE, content_type)], self.into_body()).into_response()
    }
}
