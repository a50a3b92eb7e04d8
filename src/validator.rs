use crate::docs::{self, DocsService};
use crate::error::{Error, ValidationError};
use crate::middleware::{CapturedResponse, ValidationLayer};
use crate::options::{Options, ResponseContext};
use crate::router::{MatchitRouter, RouteMatch, RouteResolver};
use crate::spec::ApiSpec;
use http::{request, HeaderMap, Method};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

struct Inner {
    options: Options,
    spec: Arc<ApiSpec>,
    resolver: Arc<dyn RouteResolver>,
}

/// Validates traffic against one OpenAPI document.
///
/// Cheap to clone; every clone shares the same document and options.
#[derive(Clone)]
pub struct Validator {
    inner: Arc<Inner>,
}

impl Validator {
    /// Loads the document at `path` with default options.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::with_options(path, Options::default())
    }

    pub fn with_options(path: impl AsRef<Path>, options: Options) -> Result<Self, Error> {
        let spec = ApiSpec::load(path)?;
        Self::from_spec(spec, options)
    }

    /// Builds a validator around an already compiled document.
    ///
    /// Without a resolver in `options`, a [`MatchitRouter`] is derived from
    /// the document.
    pub fn from_spec(spec: ApiSpec, mut options: Options) -> Result<Self, Error> {
        let resolver = match options.resolver() {
            Some(resolver) => resolver.clone(),
            None => {
                let resolver: Arc<dyn RouteResolver> = Arc::new(MatchitRouter::from_spec(&spec)?);
                options.set_resolver(resolver.clone());
                resolver
            }
        };

        debug!(
            title = %spec.document().info.title,
            operations = spec.operations().len(),
            validate_requests = options.validates_requests(),
            validate_responses = options.validates_responses(),
            doc_path = %options.docs_path(),
            "validator ready"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                options,
                spec: Arc::new(spec),
                resolver,
            }),
        })
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    pub fn spec(&self) -> &ApiSpec {
        &self.inner.spec
    }

    /// True for paths served by the documentation UI, which bypass validation.
    pub fn is_docs_path(&self, path: &str) -> bool {
        path.starts_with(docs::mount_base(self.inner.options.docs_path()))
    }

    pub fn resolve(&self, method: &Method, path: &str, headers: &HeaderMap) -> Option<RouteMatch> {
        self.inner.resolver.resolve(method, path, headers)
    }

    /// Checks a request against the matched operation; `body` is the full
    /// payload (empty when absent).
    pub fn validate_request(
        &self,
        route: &RouteMatch,
        request: &request::Parts,
        body: &[u8],
    ) -> Result<(), ValidationError> {
        route.operation.validator.validate_request(
            &route.path_params,
            request.uri.query(),
            &request.headers,
            body,
        )
    }

    pub fn validate_response(
        &self,
        route: &RouteMatch,
        response: &CapturedResponse,
    ) -> Result<(), ValidationError> {
        route
            .operation
            .validator
            .validate_response(response.status, &response.headers, &response.body)
    }

    /// Validates a finished response and reports a mismatch to the
    /// configured observer.
    pub(crate) fn check_response(
        &self,
        route: &RouteMatch,
        method: &Method,
        path: &str,
        response: &CapturedResponse,
    ) {
        if let Err(error) = self.validate_response(route, response) {
            let context = ResponseContext {
                method: method.clone(),
                path: path.to_string(),
                operation: route.operation.label(),
                status: response.status,
            };
            self.inner
                .options
                .observer()
                .on_invalid_response(&context, &error);
        }
    }

    /// Tower layer applying this validator to a service.
    pub fn layer(&self) -> ValidationLayer {
        ValidationLayer::new(self.clone())
    }

    /// Service serving Swagger UI and the document under the docs path.
    pub fn docs(&self) -> DocsService {
        DocsService::new(self.inner.options.docs_path(), self.inner.spec.clone())
    }

    /// Axum router with the documentation service mounted at the docs path.
    pub fn docs_router<S>(&self) -> axum::Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let docs = self.docs();
        let base = docs.base_path().to_string();
        let router = if base.is_empty() {
            axum::Router::new().route_service("/", docs.clone())
        } else {
            axum::Router::new()
                .route_service(&base, docs.clone())
                .route_service(&format!("{}/", base), docs.clone())
        };
        router.route_service(&format!("{}/{{*asset}}", base), docs)
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("title", &self.inner.spec.document().info.title)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}
