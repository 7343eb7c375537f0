//! Server-Sent Events (SSE) sessions, one per HTTP request.
//!
//! This crate turns an `axum` route into a long-lived `text/event-stream`
//! response fed by the route's own handler.
//!
//! # Architecture
//!
//! - **Factory** (`bind`): middleware that sets the SSE headers, creates a
//!   typed payload channel, hands its send side to the handler through the
//!   request extensions, spawns the session and stops and joins it once the
//!   handler returns.
//! - **Session** (`session`): the event loop. It multiplexes payloads, a
//!   keep-alive ticker, an absolute timeout, client disconnect and the stop
//!   signal, and is the only writer to the response.
//! - **Frames** (`frame`): bit-exact SSE encoding. Named events use the plural
//!   `events:` field.
//! - **Writer** (`writer`): the flushable response the session writes to.
//!
//! # Stream lifecycle
//!
//! 1. `: ping` and `events: stream opened` are written as soon as the session
//!    starts.
//! 2. Each payload becomes `data: <json>`; payloads that fail to serialize are
//!    logged and dropped.
//! 3. `: ping` is written every ping interval.
//! 4. The handler returning, the client leaving or every sender being dropped
//!    ends the stream silently.
//! 5. The absolute timeout ends the stream with `events: stream timeout`,
//!    `events: error` / `data: eof` and a final `events: stream closed`.
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::{middleware::from_fn, routing::get, Router};
//! use sse::{Options, PayloadSender};
//!
//! #[derive(serde::Serialize)]
//! struct Tick { sequence: u64 }
//!
//! async fn ticker(events: PayloadSender<Tick>) {
//!     for sequence in 1.. {
//!         if events.send(Tick { sequence }).await.is_err() {
//!             return; // client went away
//!         }
//!         tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!     }
//! }
//!
//! let app: Router = Router::new().route(
//!     "/ticker",
//!     get(ticker).layer(from_fn(sse::bind::<Tick, _>(Some(Options::default())))),
//! );
//! ```

pub mod bind;
pub mod error;
pub mod frame;
pub mod options;
pub mod sender;
pub mod session;
pub mod writer;

pub use bind::{bind, serve};
pub use error::{Error, ErrorKind};
pub use options::Options;
pub use sender::PayloadSender;
pub use session::{Session, SessionId, Termination};
pub use writer::FrameWriter;
