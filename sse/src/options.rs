use std::time::Duration;

/// Default time between keep-alive pings.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(10);

/// Default absolute lifetime of a session, measured from its start.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Default number of payloads that may sit in the channel before `send` waits.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Per-session streaming options.
///
/// Passed explicitly to [`crate::bind`] or [`crate::Session::new`]; there are
/// no process-wide defaults to mutate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    ping_interval: Duration,
    session_timeout: Duration,
    channel_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ping_interval: DEFAULT_PING_INTERVAL,
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the first of the supplied options, or the defaults when none are given.
    pub fn first_or_default<I>(options: I) -> Self
    where
        I: IntoIterator<Item = Options>,
    {
        options.into_iter().next().unwrap_or_default()
    }

    pub fn with_ping_interval(mut self, ping_interval: Duration) -> Self {
        self.ping_interval = ping_interval;
        self
    }

    pub fn with_session_timeout(mut self, session_timeout: Duration) -> Self {
        self.session_timeout = session_timeout;
        self
    }

    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    /// The keep-alive period. A zero interval falls back to the default since
    /// a zero-period timer would spin.
    pub fn ping_interval(&self) -> Duration {
        if self.ping_interval.is_zero() {
            DEFAULT_PING_INTERVAL
        } else {
            self.ping_interval
        }
    }

    /// The absolute session ceiling. Zero falls back to the default.
    pub fn session_timeout(&self) -> Duration {
        if self.session_timeout.is_zero() {
            DEFAULT_SESSION_TIMEOUT
        } else {
            self.session_timeout
        }
    }

    /// Payload channel capacity. Bounded tokio channels need at least one
    /// slot, so 0 behaves like 1.
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity.max(1)
    }
}
