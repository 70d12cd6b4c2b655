use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tenet_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// Engine error rendered as `{"detail": ...}` with a matching status code.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self(e)
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CoreError::DataDirectoryNotFound(_) => StatusCode::NOT_FOUND,
            CoreError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CoreError::Embedding(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match &self.0 {
            CoreError::DataDirectoryNotFound(path) => {
                format!("Data directory not found: {}", path.display())
            }
            CoreError::InvalidRequest(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(ErrorBody { detail: self.detail() })).into_response()
    }
}
