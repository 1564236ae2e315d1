use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use stockyard_offer::DecisionError;

#[derive(Debug)]
pub enum AppError {
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InProgress(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InProgress(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<DecisionError> for AppError {
    fn from(err: DecisionError) -> Self {
        let message = err.to_string();
        match err {
            DecisionError::OfferNotFound(_) => AppError::NotFoundError(message),
            DecisionError::Ineligible(_) => AppError::AuthorizationError(message),
            DecisionError::InProgress => AppError::InProgress(message),
            // The store's own wording goes back untouched
            DecisionError::Store { .. } | DecisionError::NotLoaded | DecisionError::Stale => {
                AppError::ConflictError(message)
            }
        }
    }
}
