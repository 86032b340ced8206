use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::fetch::FetchError;

/// Errors returned to HTTP clients as `{"detail": "..."}`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    BadGateway(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Self::Internal(e) => {
                log::error!("Internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<deck_core::Error> for AppError {
    fn from(err: deck_core::Error) -> Self {
        use deck_core::Error;

        match err {
            Error::UnsupportedFormat(_) | Error::InvalidInput(_) => Self::BadRequest(err.to_string()),
            e if e.is_package_error() => Self::Unprocessable(format!("Invalid presentation: {}", e)),
            e => Self::Internal(e.into()),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidUrl(_) => Self::BadRequest(err.to_string()),
            FetchError::TooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            _ => Self::BadGateway(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(anyhow::anyhow!("Background task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let unsupported: AppError = deck_core::Error::UnsupportedFormat("ppt".into()).into();
        assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);

        let missing: AppError = deck_core::Error::MissingPart("ppt/presentation.xml".into()).into();
        assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let io: AppError = deck_core::Error::IoError(std::io::Error::other("disk")).into();
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_fetch_error_mapping() {
        let too_large: AppError = FetchError::TooLarge { limit: 10 }.into();
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let status: AppError = FetchError::Status {
            status: 404,
            url: "http://x/a.pptx".into(),
        }
        .into();
        assert_eq!(status.status(), StatusCode::BAD_GATEWAY);

        let invalid: AppError = FetchError::InvalidUrl("ftp://x".into()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }
}
