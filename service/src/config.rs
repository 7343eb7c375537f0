use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::ffi::OsString;
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Milliseconds between keep-alive pings written to every event stream
    #[arg(long, env, default_value_t = 10_000)]
    pub sse_ping_interval_ms: u64,

    /// Absolute lifetime of an event stream in seconds, after which it is closed
    #[arg(long, env, default_value_t = 3600)]
    pub sse_session_timeout_secs: u64,

    /// Payloads a handler may queue ahead of the stream before sending waits
    #[arg(long, env, default_value_t = 1)]
    pub sse_channel_capacity: usize,

    /// Milliseconds between messages on the demo ticker stream
    #[arg(long, env, default_value_t = 1000)]
    pub ticker_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Parses the given arguments instead of the process's own, without loading `.env`.
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Config::try_parse_from(args)
    }

    pub fn interface(&self) -> &str {
        self.interface.as_deref().expect("No interface provided")
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.sse_ping_interval_ms)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.sse_session_timeout_secs)
    }

    pub fn ticker_interval(&self) -> Duration {
        Duration::from_millis(self.ticker_interval_ms)
    }

    /// Streaming options shared by every event stream route.
    pub fn sse_options(&self) -> sse::Options {
        sse::Options::new()
            .with_ping_interval(self.ping_interval())
            .with_session_timeout(self.session_timeout())
            .with_channel_capacity(self.sse_channel_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_defaults_match_stream_defaults() {
        let config = Config::from_args(["eventline"]).unwrap();

        assert_eq!(config.ping_interval(), Duration::from_secs(10));
        assert_eq!(config.session_timeout(), Duration::from_secs(3600));
        assert_eq!(config.sse_options(), sse::Options::default());
    }

    #[test]
    fn command_line_flags_override_defaults() {
        let config = Config::from_args([
            "eventline",
            "--allowed-origins",
            "https://app.example.com,https://admin.example.com",
            "--interface",
            "0.0.0.0",
            "--port",
            "4100",
            "--log-level-filter",
            "DEBUG",
            "--sse-ping-interval-ms",
            "300",
            "--sse-session-timeout-secs",
            "60",
            "--sse-channel-capacity",
            "4",
            "--ticker-interval-ms",
            "250",
        ])
        .unwrap();

        assert_eq!(
            config.allowed_origins,
            vec!["https://app.example.com", "https://admin.example.com"]
        );
        assert_eq!(config.interface(), "0.0.0.0");
        assert_eq!(config.port, 4100);
        assert_eq!(config.log_level_filter, LevelFilter::Debug);
        assert_eq!(config.ticker_interval(), Duration::from_millis(250));

        let options = config.sse_options();
        assert_eq!(options.ping_interval(), Duration::from_millis(300));
        assert_eq!(options.session_timeout(), Duration::from_secs(60));
        assert_eq!(options.channel_capacity(), 4);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        assert!(Config::from_args(["eventline", "--log-level-filter", "LOUD"]).is_err());
    }
}
