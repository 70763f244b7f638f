//! Error type shared by the engine, the store and the HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    /// Input has the wrong shape (missing weekday, value out of range, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl PlannerError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            PlannerError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            PlannerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            PlannerError::Io(_) | PlannerError::Json(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
            PlannerError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
        }
    }
}

impl IntoResponse for PlannerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        let resp = PlannerError::InvalidInput("bad".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = PlannerError::NotFound("timetable".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let resp = PlannerError::from(io).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
