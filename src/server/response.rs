// file: src/server/response.rs
// description: api error type and its json rendering

use crate::error::FeedError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            // Details stay in the log; clients get the generic message.
            error!("Request failed: {}", detail);
        }

        let status = self.status();
        let body = ErrorResponse {
            code: status.as_u16(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
