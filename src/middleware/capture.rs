//! Response capture: a body decorator that records what the client is sent.

use crate::body::{Body, BoxError};
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Status, headers and body bytes of a response as sent to the client.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

type OnComplete = Box<dyn FnOnce(CapturedResponse) + Send>;

struct Recording {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    on_complete: OnComplete,
}

impl Recording {
    fn finish(self) {
        (self.on_complete)(CapturedResponse {
            status: self.status,
            headers: self.headers,
            body: self.body.freeze(),
        });
    }
}

/// Forwards every frame of the wrapped body unchanged while copying data
/// frames; the copy is handed to `on_complete` once the stream ends.
///
/// Streams that fail or are dropped early are not reported.
pub struct CaptureBody {
    inner: Body,
    recording: Option<Recording>,
}

impl CaptureBody {
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        inner: Body,
        on_complete: impl FnOnce(CapturedResponse) + Send + 'static,
    ) -> Self {
        let mut body = Self {
            inner,
            recording: Some(Recording {
                status,
                headers,
                body: BytesMut::new(),
                on_complete: Box::new(on_complete),
            }),
        };
        // An empty body may never be polled.
        if body.inner.is_end_stream() {
            body.finish();
        }
        body
    }

    fn finish(&mut self) {
        if let Some(recording) = self.recording.take() {
            recording.finish();
        }
    }
}

impl HttpBody for CaptureBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        let polled = Pin::new(&mut this.inner).poll_frame(cx);

        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let (Some(data), Some(recording)) = (frame.data_ref(), this.recording.as_mut()) {
                    recording.body.extend_from_slice(data);
                }
                if this.inner.is_end_stream() {
                    this.finish();
                }
            }
            Poll::Ready(Some(Err(_))) => {
                this.recording = None;
            }
            Poll::Ready(None) => this.finish(),
            Poll::Pending => {}
        }

        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body;
    use http_body_util::{BodyExt, StreamBody};
    use std::sync::{Arc, Mutex};

    fn sink() -> (
        Arc<Mutex<Option<CapturedResponse>>>,
        impl FnOnce(CapturedResponse) + Send + 'static,
    ) {
        let slot = Arc::new(Mutex::new(None));
        let writer = slot.clone();
        (slot, move |captured| {
            *writer.lock().unwrap() = Some(captured);
        })
    }

    #[tokio::test]
    async fn forwards_and_records_full_body() {
        let (slot, on_complete) = sink();
        let body = CaptureBody::new(
            StatusCode::CREATED,
            HeaderMap::new(),
            body::full(r#"{"result":"ok"}"#),
            on_complete,
        );

        let sent = body.collect().await.unwrap().to_bytes();

        assert_eq!(sent, r#"{"result":"ok"}"#);
        let captured = slot.lock().unwrap().take().unwrap();
        assert_eq!(captured.status, StatusCode::CREATED);
        assert_eq!(captured.body, sent);
    }

    #[tokio::test]
    async fn accumulates_chunks_in_order() {
        let (slot, on_complete) = sink();
        let chunks: Vec<Result<Frame<Bytes>, BoxError>> = vec![
            Ok(Frame::data(Bytes::from_static(b"{\"a\":"))),
            Ok(Frame::data(Bytes::from_static(b"1"))),
            Ok(Frame::data(Bytes::from_static(b"}"))),
        ];
        let stream = StreamBody::new(futures_util::stream::iter(chunks));
        let body = CaptureBody::new(StatusCode::OK, HeaderMap::new(), body::boxed(stream), on_complete);

        let sent = body.collect().await.unwrap().to_bytes();

        assert_eq!(sent, "{\"a\":1}");
        assert_eq!(slot.lock().unwrap().take().unwrap().body, "{\"a\":1}");
    }

    #[test]
    fn empty_body_is_reported_immediately() {
        let (slot, on_complete) = sink();
        let _body = CaptureBody::new(StatusCode::NO_CONTENT, HeaderMap::new(), body::empty(), on_complete);

        let captured = slot.lock().unwrap().take().unwrap();
        assert_eq!(captured.status, StatusCode::NO_CONTENT);
        assert!(captured.body.is_empty());
    }
}
