//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::Error;

/// Per-request error with the status it maps to. The body is always
/// `{"error": "<reason>"}`.
#[derive(Debug)]
pub struct RequestError {
    pub status: StatusCode,
    pub message: String,
}

impl RequestError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<Error> for RequestError {
    fn from(err: Error) -> Self {
        match &err {
            Error::InputMissing(_) | Error::Decode(_) => RequestError::bad_request(err.to_string()),
            // Internal detail never reaches the client; it is logged at the
            // route boundary instead.
            Error::Prediction(_) => RequestError::internal("prediction failed"),
            Error::Config(_) | Error::Io(_) => RequestError::internal("internal error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_input_maps_to_400() {
        let err = RequestError::from(Error::InputMissing("expected a `text` field".to_string()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("text"));
    }

    #[test]
    fn prediction_failure_maps_to_500_without_detail() {
        let err = RequestError::from(Error::Prediction("model exploded: secret path".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "prediction failed");
    }
}
