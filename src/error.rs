use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors surfaced by the request handlers. Each maps to one HTTP status.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request, caught before any upstream call.
    #[error("{0}")]
    Validation(String),
    /// The upstream call succeeded but its payload lacked the expected fields.
    #[error("Invalid {0} response from API")]
    InvalidResponse(&'static str),
    /// The upstream call itself failed.
    #[error("{0}")]
    Upstream(String),
    #[error("{0} not found")]
    NotFound(&'static str),
}

impl AppError {
    /// Wrap an upstream failure, keeping its context chain in the message.
    pub fn upstream(err: anyhow::Error) -> Self {
        AppError::Upstream(format!("{err:#}"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidResponse(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_user_facing_text() {
        assert_eq!(AppError::InvalidResponse("image").to_string(), "Invalid image response from API");
        assert_eq!(AppError::NotFound("Todo").to_string(), "Todo not found");
        assert_eq!(AppError::Validation("prompt must not be empty".into()).to_string(), "prompt must not be empty");
    }

    #[test]
    fn upstream_keeps_context_chain() {
        let err = anyhow::anyhow!("connection refused").context("fal submit request failed");
        let app = AppError::upstream(err);
        assert_eq!(app.to_string(), "fal submit request failed: connection refused");
    }

    #[test]
    fn statuses() {
        assert_eq!(AppError::Validation(String::new()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidResponse("video").status(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::Upstream(String::new()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::NotFound("Todo").status(), StatusCode::NOT_FOUND);
    }
}
