use axum::extract::{Query, State};
use log::*;
use serde::{Deserialize, Serialize};
use service::AppState;
use sse::PayloadSender;
use std::time::Duration;
use tokio::time::{self, Instant};

/// Used when the configured ticker interval is zero.
const FALLBACK_TICKER_INTERVAL: Duration = Duration::from_secs(1);

/// One message on the `/ticker` stream.
#[derive(Debug, Serialize)]
pub struct TickerMessage {
    pub message: String,
    pub sequence: u64,
}

impl TickerMessage {
    fn new(sequence: u64) -> Self {
        Self {
            message: "tick".to_string(),
            sequence,
        }
    }
}

/// The single message on an `/announce` stream.
#[derive(Debug, Deserialize, Serialize)]
pub struct Announcement {
    pub message: String,
}

/// GET an endless stream of numbered ticks, one per configured ticker interval.
///
/// Runs until the client goes away; the session then drops its receiver,
/// which resolves `closed()` here.
pub async fn ticker(State(app_state): State<AppState>, events: PayloadSender<TickerMessage>) {
    let mut period = app_state.config.ticker_interval();
    if period.is_zero() {
        period = FALLBACK_TICKER_INTERVAL;
    }
    let mut interval = time::interval_at(Instant::now() + period, period);
    let mut sequence = 0;

    loop {
        tokio::select! {
            _ = events.closed() => break,
            _ = interval.tick() => {
                sequence += 1;
                if let Err(e) = events.send(TickerMessage::new(sequence)).await {
                    debug!("Ticker stopped sending: {e}");
                    break;
                }
            }
        }
    }

    debug!("Ticker stream finished after {sequence} message(s)");
}

/// GET a stream carrying exactly one announcement, which ends once it is sent.
pub async fn announce(
    Query(announcement): Query<Announcement>,
    events: PayloadSender<Announcement>,
) {
    if let Err(e) = events.send(announcement).await {
        warn!("Announcement could not be streamed: {e}");
    }
}
