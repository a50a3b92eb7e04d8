use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a [`Validator`](crate::Validator).
///
/// All of these are fatal: construction either succeeds completely or
/// returns one of them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to load spec {}: {reason}", path.display())]
    SpecLoad { path: PathBuf, reason: String },

    #[error("invalid spec: {}", problems.join("; "))]
    InvalidSpec { problems: Vec<String> },

    #[error("failed to compile schema: {0}")]
    SchemaCompilation(String),

    #[error("failed to create route resolver: {0}")]
    Router(String),

    #[error("failed to load settings {}: {reason}", path.display())]
    Settings { path: PathBuf, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A request or response that does not conform to its operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("parameter \"{name}\" in {location} is required")]
    MissingParameter {
        name: String,
        location: &'static str,
    },

    #[error("parameter \"{name}\" in {location} is invalid: {}", details.join("; "))]
    InvalidParameter {
        name: String,
        location: &'static str,
        details: Vec<String>,
    },

    #[error("query string is malformed: {0}")]
    MalformedQuery(String),

    #[error("request body is required but was not provided")]
    MissingRequestBody,

    #[error("content type \"{0}\" is not declared for this request body")]
    UnsupportedMediaType(String),

    #[error("body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("request body does not match schema: {}", details.join("; "))]
    RequestBody { details: Vec<String> },

    #[error("response content type \"{content_type}\" is not declared for status {status}")]
    ResponseMediaType { status: u16, content_type: String },

    #[error("response body for status {status} does not match schema: {}", details.join("; "))]
    ResponseBody { status: u16, details: Vec<String> },

    #[error("failed to read body: {0}")]
    BodyRead(String),
}

impl ValidationError {
    /// Individual violation lines, or the error text itself when the
    /// failure has no finer-grained breakdown.
    pub fn details(&self) -> Vec<String> {
        match self {
            Self::InvalidParameter { details, .. }
            | Self::RequestBody { details }
            | Self::ResponseBody { details, .. } => details.clone(),
            other => vec![other.to_string()],
        }
    }
}
