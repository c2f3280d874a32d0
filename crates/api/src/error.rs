//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DispatchError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Dispatch failure from the bounded context.
    Dispatch(DispatchError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Dispatch(err) => dispatch_status(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg,
            ApiError::Dispatch(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, "internal server error");
                }
                err.to_string()
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn dispatch_status(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        DispatchError::ConcurrentModification { .. } | DispatchError::PersistenceConflict { .. } => {
            StatusCode::CONFLICT
        }
        DispatchError::NoHandler { .. }
        | DispatchError::DuplicateHandler { .. }
        | DispatchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        ApiError::Dispatch(err)
    }
}
