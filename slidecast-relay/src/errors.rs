use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::relay::cors_headers;

pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing url parameter")]
    MissingUrl,

    #[error("Invalid protocol")]
    InvalidProtocol { scheme: String },

    #[error("Failed to relay media")]
    Upstream { message: String },
}

impl RelayError {
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        Self::Upstream {
            message: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingUrl | RelayError::InvalidProtocol { .. } => {
                StatusCode::BAD_REQUEST
            }
            RelayError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = match &self {
            RelayError::Upstream { message } => json!({
                "error": self.to_string(),
                "message": message,
            }),
            RelayError::InvalidProtocol { scheme } => {
                debug!(%scheme, "rejected relay target");
                json!({ "error": self.to_string() })
            }
            RelayError::MissingUrl => json!({ "error": self.to_string() }),
        };

        (self.status(), cors_headers(), Json(body)).into_response()
    }
}
