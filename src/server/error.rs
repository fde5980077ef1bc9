//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Error returned by request handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or empty query parameter
    #[error("{0}")]
    BadRequest(String),

    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Error from the query layer
    #[error(transparent)]
    Geo(#[from] crate::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Geo(crate::Error::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Geo(crate::Error::InvalidIpAddress(_)) => StatusCode::BAD_REQUEST,
            ApiError::Geo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::bad_request("ip param is empty").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(crate::Error::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(crate::Error::InvalidIpAddress("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(crate::Error::Config("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Timeout.status_code(), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(ApiError::from(crate::Error::NotFound).to_string(), "not found");
    }
}
