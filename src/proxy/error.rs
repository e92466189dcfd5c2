use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorBody;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Video not found")]
    VideoNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Upstream returned an invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::VideoNotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) | ProxyError::InvalidCatalog(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ProxyError::Io(_) => "Internal error".to_string(),
            other => other.to_string(),
        };

        match &self {
            ProxyError::VideoNotFound(id) => tracing::debug!("Video not found: {}", id),
            other => tracing::warn!("Proxy error: {}", other),
        }

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ProxyError::VideoNotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ProxyError::InvalidPath("..".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::InvalidCatalog("not an array".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            ProxyError::VideoNotFound("v9".into()).to_string(),
            "Video not found"
        );
    }
}
