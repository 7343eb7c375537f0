//! Error types for the `sse` crate.
use std::error::Error as StdError;
use std::fmt;

/// Errors raised while streaming a session.
///
/// None of these ever reach the HTTP layer. The event loop logs write and
/// serialization failures and keeps running; `SessionEnded` is only returned
/// to handler code that tries to send after the stream is gone.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The response body refused bytes (client gone, broken pipe).
    Write,
    /// A payload could not be encoded as JSON.
    Serialize,
    /// The session's event loop has exited and no longer receives payloads.
    SessionEnded,
}

impl Error {
    pub(crate) fn new(error_kind: ErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "SSE Error ({:?}): {source}", self.error_kind),
            None => write!(f, "SSE Error ({:?})", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Serialize,
        }
    }
}
