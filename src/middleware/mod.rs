//! Tower middleware applying a [`Validator`] to a service.
//!
//! For each request:
//!
//! ```text
//! docs path? ── yes ──────────────────────────────► inner
//!     │ no
//! resolve route ── miss ──────────────────────────► inner
//!     │ hit
//! validate request ── fail ──► error encoder (inner never runs)
//!     │ ok
//! inner ──► response body captured ──► validate response ──► observer
//! ```

mod capture;

pub use capture::{CaptureBody, CapturedResponse};

use crate::body::{self, Body, BoxError};
use crate::error::ValidationError;
use crate::validator::Validator;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::BodyExt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Layer produced by [`Validator::layer`].
#[derive(Clone, Debug)]
pub struct ValidationLayer {
    validator: Validator,
}

impl ValidationLayer {
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }
}

impl<S> Layer<S> for ValidationLayer {
    type Service = ValidationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ValidationService {
            inner,
            validator: self.validator.clone(),
        }
    }
}

/// Service wrapping `S` with request and response validation.
#[derive(Clone, Debug)]
pub struct ValidationService<S> {
    inner: S,
    validator: Validator,
}

impl<S> ValidationService<S> {
    pub fn new(inner: S, validator: Validator) -> Self {
        Self { inner, validator }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S, F, ReqBody, ResBody> Service<Request<ReqBody>> for ValidationService<S>
where
    S: Service<Request<Body>, Response = Response<ResBody>, Future = F> + Clone + Send + 'static,
    S::Error: Send + 'static,
    F: Future<Output = Result<Response<ResBody>, S::Error>> + Send + 'static,
    ReqBody: http_body::Body<Data = Bytes> + Send + 'static,
    ReqBody::Error: Into<BoxError>,
    ResBody: http_body::Body<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // The clone may not be ready; the instance polled in poll_ready is.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let validator = self.validator.clone();

        Box::pin(handle(validator, inner, request))
    }
}

fn handle<S, F, E, ReqBody, ResBody>(
    validator: Validator,
    mut inner: S,
    request: Request<ReqBody>,
) -> impl Future<Output = Result<Response<Body>, E>> + Send
where
    S: Service<Request<Body>, Response = Response<ResBody>, Error = E, Future = F> + Send + 'static,
    E: Send + 'static,
    F: Future<Output = Result<Response<ResBody>, E>> + Send + 'static,
    ReqBody: http_body::Body<Data = Bytes> + Send + 'static,
    ReqBody::Error: Into<BoxError>,
    ResBody: http_body::Body<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    async move {
        let (parts, request_body) = request.into_parts();
        let path = parts.uri.path().to_owned();

        let Some(route) = (!validator.is_docs_path(&path))
            .then(|| validator.resolve(&parts.method, &path, &parts.headers))
            .flatten()
        else {
            debug!(method = %parts.method, path = %path, "not validated, passing through");
            let response = inner
                .call(Request::from_parts(parts, body::boxed(request_body)))
                .await?;
            return Ok(response.map(body::boxed));
        };

        let options = validator.options();

        let request_body = if options.validates_requests() {
            let bytes = match request_body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    let e: BoxError = e.into();
                    let error = ValidationError::BodyRead(e.to_string());
                    return Ok(options.encoder().encode(&parts, &error));
                }
            };

            if let Err(error) = validator.validate_request(&route, &parts, &bytes) {
                debug!(
                    method = %parts.method,
                    path = %path,
                    operation = %route.operation.label(),
                    error = %error,
                    "request rejected"
                );
                return Ok(options.encoder().encode(&parts, &error));
            }
            body::full(bytes)
        } else {
            body::boxed(request_body)
        };

        if !options.validates_responses() {
            let response = inner.call(Request::from_parts(parts, request_body)).await?;
            return Ok(response.map(body::boxed));
        }

        let method = parts.method.clone();
        let response = inner.call(Request::from_parts(parts, request_body)).await?;
        let (response_parts, response_body) = response.into_parts();

        let checker = validator.clone();
        let captured = CaptureBody::new(
            response_parts.status,
            response_parts.headers.clone(),
            body::boxed(response_body),
            move |captured| checker.check_response(&route, &method, &path, &captured),
        );

        Ok(Response::from_parts(response_parts, body::boxed(captured)))
    }
}
