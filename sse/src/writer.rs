//! The response side of a session: something frames can be written to and
//! flushed, plus the streaming `axum` body that implements it.

use crate::error::{Error, ErrorKind};
use async_stream::stream;
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use std::convert::Infallible;
use tokio::sync::{mpsc, oneshot};

/// Flushed chunks that may queue up between the session and hyper before a
/// flush waits on the client.
const BODY_CHANNEL_CAPACITY: usize = 16;

/// A live response that accepts SSE bytes.
///
/// `write` may buffer; nothing is guaranteed to reach the client until `flush`
/// returns.
#[async_trait]
pub trait FrameWriter: Send {
    async fn write(&mut self, buf: &[u8]) -> Result<(), Error>;

    async fn flush(&mut self) -> Result<(), Error>;
}

/// Writes into an `axum` response body. Each flush becomes one body chunk.
pub struct BodyWriter {
    buffer: Vec<u8>,
    chunks: mpsc::Sender<Bytes>,
}

#[async_trait]
impl FrameWriter for BodyWriter {
    async fn write(&mut self, buf: &[u8]) -> Result<(), Error> {
        if self.chunks.is_closed() {
            return Err(Error::new(ErrorKind::Write));
        }
        self.buffer.extend_from_slice(buf);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), Error> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let chunk = Bytes::from(std::mem::take(&mut self.buffer));
        self.chunks.send(chunk).await.map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Write,
        })
    }
}

/// Resolves once the HTTP layer has dropped the response body, which happens
/// when the client goes away or the server drops the connection.
pub struct Disconnect {
    dropped: oneshot::Receiver<()>,
}

impl Disconnect {
    pub async fn wait(self) {
        // The sender is never used; only its drop matters.
        let _ = self.dropped.await;
    }
}

/// Creates a streaming response body together with the writer feeding it and
/// the signal that fires when the body is dropped.
///
/// The body ends once the writer is dropped.
pub fn body_channel() -> (BodyWriter, Body, Disconnect) {
    let (chunks, mut rx) = mpsc::channel::<Bytes>(BODY_CHANNEL_CAPACITY);
    let (guard, dropped) = oneshot::channel::<()>();

    let body = Body::from_stream(stream! {
        let _guard = guard;
        while let Some(chunk) = rx.recv().await {
            yield Ok::<_, Infallible>(chunk);
        }
    });

    let writer = BodyWriter {
        buffer: Vec::new(),
        chunks,
    };

    (writer, body, Disconnect { dropped })
}
