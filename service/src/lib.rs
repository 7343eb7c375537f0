use config::Config;

pub mod config;
pub mod logging;

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config) -> Self {
        Self { config: app_config }
    }

    /// Streaming options for every event stream route, derived from the config.
    pub fn sse_options(&self) -> sse::Options {
        self.config.sse_options()
    }
}
