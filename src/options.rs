//! Validator configuration.

use crate::error::{Error, ValidationError};
use crate::report::{ErrorEncoder, JsonErrorEncoder};
use crate::router::RouteResolver;
use http::{Method, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_DOC_PATH: &str = "/docs";

/// What a response-validation failure is reported against.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    pub method: Method,
    pub path: String,
    /// `METHOD /template` of the matched operation.
    pub operation: String,
    pub status: StatusCode,
}

/// Receives responses that did not match the document.
///
/// The response has already been streamed to the client when this runs.
pub trait ResponseObserver: Send + Sync {
    fn on_invalid_response(&self, context: &ResponseContext, error: &ValidationError);
}

impl<F> ResponseObserver for F
where
    F: Fn(&ResponseContext, &ValidationError) + Send + Sync,
{
    fn on_invalid_response(&self, context: &ResponseContext, error: &ValidationError) {
        self(context, error)
    }
}

/// Default observer: one WARN event per invalid response.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ResponseObserver for LogObserver {
    fn on_invalid_response(&self, context: &ResponseContext, error: &ValidationError) {
        tracing::warn!(
            method = %context.method,
            path = %context.path,
            operation = %context.operation,
            status = context.status.as_u16(),
            error = %error,
            "response validation failed"
        );
    }
}

/// Configuration of a [`Validator`](crate::Validator).
///
/// Builder methods may be chained in any order; a later call overrides an
/// earlier one for the same field.
#[derive(Clone)]
pub struct Options {
    validate_requests: bool,
    validate_responses: bool,
    doc_path: String,
    error_encoder: Arc<dyn ErrorEncoder>,
    route_resolver: Option<Arc<dyn RouteResolver>>,
    response_observer: Arc<dyn ResponseObserver>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            validate_requests: true,
            validate_responses: false,
            doc_path: DEFAULT_DOC_PATH.to_string(),
            error_encoder: Arc::new(JsonErrorEncoder),
            route_resolver: None,
            response_observer: Arc::new(LogObserver),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable request validation (default: on).
    pub fn validate_requests(mut self, enabled: bool) -> Self {
        self.validate_requests = enabled;
        self
    }

    /// Enable or disable response validation (default: off).
    pub fn validate_responses(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    /// URL prefix of the documentation UI (default: `/docs`).
    pub fn doc_path(mut self, path: impl Into<String>) -> Self {
        self.doc_path = path.into();
        self
    }

    pub fn error_encoder(mut self, encoder: impl ErrorEncoder + 'static) -> Self {
        self.error_encoder = Arc::new(encoder);
        self
    }

    /// Use `resolver` instead of the radix router derived from the document.
    pub fn route_resolver(mut self, resolver: impl RouteResolver + 'static) -> Self {
        self.route_resolver = Some(Arc::new(resolver));
        self
    }

    pub fn response_observer(mut self, observer: impl ResponseObserver + 'static) -> Self {
        self.response_observer = Arc::new(observer);
        self
    }

    pub fn validates_requests(&self) -> bool {
        self.validate_requests
    }

    pub fn validates_responses(&self) -> bool {
        self.validate_responses
    }

    pub fn docs_path(&self) -> &str {
        &self.doc_path
    }

    pub fn encoder(&self) -> &Arc<dyn ErrorEncoder> {
        &self.error_encoder
    }

    pub fn resolver(&self) -> Option<&Arc<dyn RouteResolver>> {
        self.route_resolver.as_ref()
    }

    pub fn observer(&self) -> &Arc<dyn ResponseObserver> {
        &self.response_observer
    }

    pub(crate) fn set_resolver(&mut self, resolver: Arc<dyn RouteResolver>) {
        self.route_resolver = Some(resolver);
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("validate_requests", &self.validate_requests)
            .field("validate_responses", &self.validate_responses)
            .field("doc_path", &self.doc_path)
            .field("custom_resolver", &self.route_resolver.is_some())
            .finish_non_exhaustive()
    }
}

/// File-backed subset of [`Options`].
///
/// ```yaml
/// validate_requests: true
/// validate_responses: true
/// doc_path: /api/docs
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub validate_requests: bool,
    pub validate_responses: bool,
    pub doc_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            validate_requests: true,
            validate_responses: false,
            doc_path: DEFAULT_DOC_PATH.to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from a YAML (or JSON) file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let settings_error = |reason: String| Error::Settings {
            path: path.to_path_buf(),
            reason,
        };
        let contents = std::fs::read_to_string(path).map_err(|e| settings_error(e.to_string()))?;
        serde_yaml::from_str(&contents).map_err(|e| settings_error(e.to_string()))
    }
}

impl From<Settings> for Options {
    fn from(settings: Settings) -> Self {
        Options::default()
            .validate_requests(settings.validate_requests)
            .validate_responses(settings.validate_responses)
            .doc_path(settings.doc_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn defaults() {
        let opts = Options::default();
        assert!(opts.validates_requests());
        assert!(!opts.validates_responses());
        assert_eq!(opts.docs_path(), "/docs");
        assert!(opts.resolver().is_none());
    }

    #[test]
    fn toggles_request_validation() {
        assert!(!Options::new().validate_requests(false).validates_requests());
    }

    #[test]
    fn toggles_response_validation() {
        assert!(Options::new().validate_responses(true).validates_responses());
    }

    #[test]
    fn sets_doc_path() {
        assert_eq!(Options::new().doc_path("/api/docs").docs_path(), "/api/docs");
    }

    #[test]
    fn repeated_options_are_idempotent() {
        let once = Options::new().validate_responses(true).doc_path("/x");
        let twice = Options::new()
            .validate_responses(true)
            .validate_responses(true)
            .doc_path("/x")
            .doc_path("/x");
        assert_eq!(once.validates_responses(), twice.validates_responses());
        assert_eq!(once.docs_path(), twice.docs_path());
    }

    #[test]
    fn last_write_wins() {
        let opts = Options::new()
            .validate_requests(false)
            .doc_path("/a")
            .validate_requests(true)
            .doc_path("/b");
        assert!(opts.validates_requests());
        assert_eq!(opts.docs_path(), "/b");
    }

    #[test]
    fn closures_observe_invalid_responses() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let opts = Options::new().response_observer(move |_: &ResponseContext, _: &ValidationError| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let context = ResponseContext {
            method: Method::GET,
            path: "/x".to_string(),
            operation: "GET /x".to_string(),
            status: StatusCode::OK,
        };
        opts.observer()
            .on_invalid_response(&context, &ValidationError::MissingRequestBody);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn settings_fill_missing_fields_with_defaults() {
        let settings: Settings = serde_yaml::from_str("validate_responses: true").unwrap();
        assert_eq!(
            settings,
            Settings {
                validate_requests: true,
                validate_responses: true,
                doc_path: "/docs".to_string(),
            }
        );

        let opts = Options::from(settings);
        assert!(opts.validates_responses());
    }

    #[test]
    fn settings_reject_unknown_keys() {
        assert!(serde_yaml::from_str::<Settings>("validate_everything: true").is_err());
    }

    #[test]
    fn settings_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "doc_path: /reference\n").unwrap();
        assert_eq!(Settings::load(&path).unwrap().doc_path, "/reference");
        assert!(matches!(
            Settings::load(dir.path().join("missing.yaml")),
            Err(Error::Settings { .. })
        ));
    }
}
