//! API errors and their HTTP mapping.

use crate::feedback::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request body must be a JSON object")]
    InvalidBody,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for field: {0}")]
    InvalidField(&'static str),

    #[error("{} must be between 1 and 5", field_label(.0))]
    OutOfRange(&'static str),

    #[error("Internal server error")]
    Storage(#[from] StoreError),
}

fn field_label(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Storage(ref source) = self {
            error!("Feedback storage failed: {}", source);
        }

        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::MissingField("llm_provider").to_string(),
            "Missing required field: llm_provider"
        );
        assert_eq!(
            ApiError::OutOfRange("satisfaction").to_string(),
            "Satisfaction must be between 1 and 5"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::InvalidBody.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::OutOfRange("clarity").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        let storage = ApiError::Storage(StoreError::Database(rusqlite::Error::InvalidQuery));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(storage.to_string(), "Internal server error");
    }
}
