use std::time::Duration;

/// Default period between two autosave ticks.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Default window title.
pub const DEFAULT_TITLE: &str = "ManjaWord";

/// Configuration of a single editing session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Period of the autosave scheduler
    pub autosave_interval: Duration,
    /// Window title shown while the document is clean
    pub title: String,
}

impl SessionConfig {
    pub fn with_autosave_interval(mut self, interval: Duration) -> Self {
        self.autosave_interval = interval;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}
