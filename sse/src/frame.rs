use crate::error::Error;
use serde::Serialize;
use std::fmt;

/// Named events emitted by the session itself.
pub const STREAM_OPENED: &str = "stream opened";
pub const STREAM_TIMEOUT: &str = "stream timeout";
pub const STREAM_CLOSED: &str = "stream closed";

/// One unit of the `text/event-stream` body.
///
/// Named events use the plural `events:` field. Every frame ends with a blank
/// line except [`Frame::Closed`], which is the last thing a timed out session
/// ever writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Keep-alive comment.
    Ping,
    /// `events: <name>`
    Event(&'static str),
    /// `data: <json>`, already encoded.
    Data(String),
    /// `events: error` followed by `data: eof`.
    Eof,
    /// `events: stream closed`, unterminated.
    Closed,
}

impl Frame {
    /// Encodes a payload as a data frame.
    pub fn data<T: Serialize + ?Sized>(payload: &T) -> Result<Self, Error> {
        Ok(Frame::Data(serde_json::to_string(payload)?))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Frame::Ping => f.write_str(": ping\n\n"),
            Frame::Event(name) => write!(f, "events: {name}\n\n"),
            Frame::Data(json) => write!(f, "data: {json}\n\n"),
            Frame::Eof => f.write_str("events: error\ndata: eof\n\n"),
            Frame::Closed => write!(f, "events: {STREAM_CLOSED}"),
        }
    }
}
