//! The per-request event loop.
//!
//! A session multiplexes five sources into one ordered stream of frames:
//! payloads from handler code, the keep-alive ticker, the absolute session
//! timeout, client disconnect and an explicit stop. It is the only writer to
//! its response, so frames never interleave.

use crate::error::Error;
use crate::frame::{Frame, STREAM_OPENED, STREAM_TIMEOUT};
use crate::options::Options;
use crate::writer::FrameWriter;
use log::*;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

/// Unique identifier for a session, used to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a session's event loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every payload sender was dropped.
    Closed,
    /// The client went away.
    Cancelled,
    /// The host asked the loop to stop, normally because the handler returned.
    Stopped,
    /// The absolute session timeout elapsed. The only path that writes closing frames.
    TimedOut,
}

pub struct Session<T, W> {
    id: SessionId,
    options: Options,
    payloads: mpsc::Receiver<T>,
    writer: W,
}

impl<T, W> Session<T, W>
where
    T: Serialize + Send,
    W: FrameWriter,
{
    pub fn new(id: SessionId, options: Options, payloads: mpsc::Receiver<T>, writer: W) -> Self {
        Self {
            id,
            options,
            payloads,
            writer,
        }
    }

    /// Runs the event loop until one of its terminal sources fires.
    ///
    /// `cancelled` resolves when the client is gone; `stopped` resolves when
    /// the host wants the stream to end. Neither produces closing frames. Write
    /// failures are logged and never end the loop.
    pub async fn run<C, S>(self, cancelled: C, stopped: S) -> Termination
    where
        C: Future<Output = ()>,
        S: Future<Output = ()>,
    {
        let Session {
            id,
            options,
            mut payloads,
            mut writer,
        } = self;

        tokio::pin!(cancelled);
        tokio::pin!(stopped);

        let timeout = time::sleep(options.session_timeout());
        tokio::pin!(timeout);

        let period = options.ping_interval();
        let mut ticker = time::interval_at(Instant::now() + period, period);

        debug!(
            "sse[{id}]: stream opened (ping every {:?}, timeout after {:?})",
            period,
            options.session_timeout()
        );
        emit(&id, &mut writer, &[Frame::Ping, Frame::Event(STREAM_OPENED)]).await;

        // Biased so that identical inputs always yield identical output.
        // Timeout and stop both outrank payloads, so a producer that keeps the
        // channel full can starve neither.
        let termination = loop {
            tokio::select! {
                biased;

                _ = &mut cancelled => break Termination::Cancelled,
                _ = &mut timeout => break Termination::TimedOut,
                _ = &mut stopped => {
                    drain(&id, &mut payloads, &mut writer).await;
                    break Termination::Stopped;
                }
                payload = payloads.recv() => match payload {
                    Some(payload) => {
                        if let Some(frame) = encode(&id, payload) {
                            emit(&id, &mut writer, &[frame]).await;
                        }
                    }
                    None => break Termination::Closed,
                },
                _ = ticker.tick() => {
                    trace!("sse[{id}]: ping");
                    emit(&id, &mut writer, &[Frame::Ping]).await;
                }
            }
        };

        match termination {
            Termination::TimedOut => {
                info!("sse[{id}]: session timed out, closing stream");
                emit(&id, &mut writer, &[Frame::Event(STREAM_TIMEOUT)]).await;
                emit(&id, &mut writer, &[Frame::Eof]).await;
                emit(&id, &mut writer, &[Frame::Closed]).await;
            }
            other => debug!("sse[{id}]: session ended ({other:?})"),
        }

        termination
    }
}

/// Consumes the payload so it is never held across an await.
fn encode<T: Serialize>(id: &SessionId, payload: T) -> Option<Frame> {
    match Frame::data(&payload) {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!("sse[{id}]: dropping payload that failed to serialize: {e}");
            None
        }
    }
}

/// Closes the channel and writes the payloads already queued in it.
///
/// Senders still waiting for capacity fail instead of being delivered, which
/// bounds the drain to what was in flight when the stop arrived.
async fn drain<T, W>(id: &SessionId, payloads: &mut mpsc::Receiver<T>, writer: &mut W)
where
    T: Serialize,
    W: FrameWriter,
{
    payloads.close();
    while let Ok(payload) = payloads.try_recv() {
        if let Some(frame) = encode(id, payload) {
            emit(id, writer, &[frame]).await;
        }
    }
}

/// Writes the frames in order, then flushes once.
async fn emit<W: FrameWriter>(id: &SessionId, writer: &mut W, frames: &[Frame]) {
    for frame in frames {
        if let Err(e) = writer.write(frame.to_string().as_bytes()).await {
            log_write_failure(id, &e);
        }
    }
    if let Err(e) = writer.flush().await {
        log_write_failure(id, &e);
    }
}

fn log_write_failure(id: &SessionId, e: &Error) {
    warn!("sse[{id}]: failed to write to client: {e}");
}
