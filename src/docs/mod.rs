//! Swagger UI and the machine-readable document, served under a prefix.
//!
//! | path                   | content                      |
//! |------------------------|------------------------------|
//! | `{prefix}`, `{prefix}/`, `{prefix}/index.html` | UI page |
//! | `{prefix}/openapi.json` | the document as JSON        |
//! | `{prefix}/styles.css`, `{prefix}/main.js` | bundled assets |
//!
//! Anything else under the prefix is a 404.

use crate::body::{self, Body};
use crate::spec::ApiSpec;
use http::{header, HeaderValue, Method, Request, Response, StatusCode};
use minijinja::{context, AutoEscape, Environment};
use std::convert::Infallible;
use std::future::{ready, Ready};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;
use tracing::{debug, error};

const INDEX_TEMPLATE: &str = include_str!("assets/index.html");
const STYLES_CSS: &str = include_str!("assets/styles.css");
const MAIN_JS: &str = include_str!("assets/main.js");

struct DocsInner {
    base_path: String,
    spec: Arc<ApiSpec>,
    templates: Environment<'static>,
}

/// Tower service for the documentation UI.
#[derive(Clone)]
pub struct DocsService {
    inner: Arc<DocsInner>,
}

impl DocsService {
    /// `prefix` is the mount point; a trailing `/` is ignored.
    pub fn new(prefix: &str, spec: Arc<ApiSpec>) -> Self {
        let mut templates = Environment::new();
        templates.set_auto_escape_callback(|_| AutoEscape::Html);

        Self {
            inner: Arc::new(DocsInner {
                base_path: mount_base(prefix).to_string(),
                spec,
                templates,
            }),
        }
    }

    /// Mount point without trailing slash (empty when mounted at `/`).
    pub fn base_path(&self) -> &str {
        &self.inner.base_path
    }

    pub fn spec_url(&self) -> String {
        format!("{}/openapi.json", self.inner.base_path)
    }

    /// Builds the response for `method` on `path`.
    pub fn respond(&self, method: &Method, path: &str) -> Response<Body> {
        if method != Method::GET && method != Method::HEAD {
            let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
            return response;
        }

        let Some(asset) = self.asset_name(path) else {
            return not_found();
        };
        debug!(path = %path, asset = %asset, "serving documentation");

        match asset {
            "" | "index.html" => self.index(),
            "openapi.json" => self.spec_json(),
            "styles.css" => content_response(STYLES_CSS, "text/css"),
            "main.js" => content_response(MAIN_JS, "application/javascript"),
            _ => not_found(),
        }
    }

    /// Path relative to the mount point; the bare prefix maps to `""`.
    fn asset_name<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.inner.base_path.as_str())?;
        if rest.is_empty() {
            return Some("");
        }
        rest.strip_prefix('/')
    }

    fn index(&self) -> Response<Body> {
        let rendered = self.inner.templates.render_str(
            INDEX_TEMPLATE,
            context! {
                base_path => self.inner.base_path.as_str(),
                spec_url => self.spec_url(),
            },
        );
        match rendered {
            Ok(html) => content_response(html, "text/html"),
            Err(e) => {
                error!(error = %e, "failed to render Swagger UI");
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to render Swagger UI")
            }
        }
    }

    fn spec_json(&self) -> Response<Body> {
        match self.inner.spec.to_json() {
            Ok(json) => content_response(json, "application/json"),
            Err(e) => {
                error!(error = %e, "failed to serialize OpenAPI document");
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to serialize spec")
            }
        }
    }
}

/// Mount point of the docs for a configured prefix; a trailing `/` is
/// not part of it.
pub(crate) fn mount_base(prefix: &str) -> &str {
    prefix.trim_end_matches('/')
}

impl std::fmt::Debug for DocsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocsService")
            .field("base_path", &self.inner.base_path)
            .finish_non_exhaustive()
    }
}

impl<B> Service<Request<B>> for DocsService {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        ready(Ok(self.respond(request.method(), request.uri().path())))
    }
}

fn content_response(content: impl Into<bytes::Bytes>, content_type: &'static str) -> Response<Body> {
    let mut response = Response::new(body::full(content));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn text_response(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = content_response(message, "text/plain; charset=utf-8");
    *response.status_mut() = status;
    response
}

fn not_found() -> Response<Body> {
    text_response(StatusCode::NOT_FOUND, "404 page not found")
}
