#![allow(dead_code)]

use bytes::Bytes;
use http::{header, Request, Response, StatusCode};
use http_body_util::BodyExt;
use openapi_validator::body::{self, Body};
use serde_json::Value;
use std::convert::Infallible;
use tower::util::BoxCloneService;

pub fn fixture_path() -> String {
    format!("{}/tests/fixtures/test_spec.yaml", env!("CARGO_MANIFEST_DIR"))
}

pub fn json_request(method: &str, uri: &str, payload: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body::full(payload.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(body::empty()).unwrap()
}

pub fn json_response(status: StatusCode, payload: &'static str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body::full(payload))
        .unwrap()
}

/// Inner service that answers every request with the same JSON payload.
pub fn responder(
    status: StatusCode,
    payload: &'static str,
) -> BoxCloneService<Request<Body>, Response<Body>, Infallible> {
    BoxCloneService::new(tower::service_fn(move |_req: Request<Body>| async move {
        Ok::<_, Infallible>(json_response(status, payload))
    }))
}

pub async fn read_body<B>(response: Response<B>) -> Bytes
where
    B: http_body::Body<Data = Bytes>,
    B::Error: std::fmt::Debug,
{
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn read_json<B>(response: Response<B>) -> Value
where
    B: http_body::Body<Data = Bytes>,
    B::Error: std::fmt::Debug,
{
    serde_json::from_slice(&read_body(response).await).unwrap()
}
