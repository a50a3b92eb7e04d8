//! JSON rendering of rejected requests.

use crate::body::{self, Body};
use crate::error::ValidationError;
use http::{header, request, HeaderValue, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Top-level message of every default error body.
pub const VALIDATION_FAILED: &str = "Validation Failed";

/// Wire format: `{"message": ..., "errors": [...]}`; `errors` is omitted
/// when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    /// Renders the body as a JSON response with `status`.
    pub fn into_response(self, status: StatusCode) -> Response<Body> {
        let bytes = serde_json::to_vec(&self)
            .unwrap_or_else(|_| json!({ "message": self.message }).to_string().into_bytes());
        let mut response = Response::new(body::full(bytes));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Turns a rejected request into the response sent to the client.
pub trait ErrorEncoder: Send + Sync {
    fn encode(&self, request: &request::Parts, error: &ValidationError) -> Response<Body>;
}

impl<F> ErrorEncoder for F
where
    F: Fn(&request::Parts, &ValidationError) -> Response<Body> + Send + Sync,
{
    fn encode(&self, request: &request::Parts, error: &ValidationError) -> Response<Body> {
        self(request, error)
    }
}

/// Default encoder: `400 Bad Request` with an [`ErrorBody`] naming the error.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorEncoder;

impl ErrorEncoder for JsonErrorEncoder {
    fn encode(&self, _request: &request::Parts, error: &ValidationError) -> Response<Body> {
        ErrorBody::new(VALIDATION_FAILED)
            .with_errors(vec![error.to_string()])
            .into_response(StatusCode::BAD_REQUEST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn parts() -> request::Parts {
        http::Request::builder()
            .uri("/")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn display_is_the_message() {
        let body = ErrorBody::new("test error").with_errors(vec!["detail 1".into(), "detail 2".into()]);
        assert_eq!(body.to_string(), "test error");
    }

    #[test]
    fn empty_errors_are_omitted() {
        let json = serde_json::to_string(&ErrorBody::new("nope")).unwrap();
        assert_eq!(json, r#"{"message":"nope"}"#);
    }

    #[tokio::test]
    async fn default_encoder_writes_400_json() {
        let error = ValidationError::MalformedBody("test validation error".to_string());

        let response = JsonErrorEncoder.encode(&parts(), &error);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.message, VALIDATION_FAILED);
        assert_eq!(body.errors.len(), 1);
        assert!(body.errors[0].contains("test validation error"));
    }

    #[tokio::test]
    async fn control_characters_are_json_escaped() {
        let message = "bad \u{1b}[0m \"quoted\" input";
        let response = ErrorBody::new(message)
            .with_errors(vec!["tab\there".to_string()])
            .into_response(StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(!bytes.windows(3).any(|w| w == b"\\u{"));
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.message, message);
        assert_eq!(body.errors, vec!["tab\there"]);
    }

    #[test]
    fn closures_are_encoders() {
        let encoder = |_: &request::Parts, _: &ValidationError| {
            ErrorBody::new("custom").into_response(StatusCode::UNPROCESSABLE_ENTITY)
        };
        let response = encoder.encode(&parts(), &ValidationError::MissingRequestBody);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
