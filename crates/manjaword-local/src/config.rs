use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use manjaword_session::SessionConfig;

use crate::error::BackendError;

/// Default LanguageTool endpoint.
pub const DEFAULT_GRAMMAR_URL: &str = "http://localhost:8081/v2/check";

/// Configuration for the manjaword-local editor shell.
#[derive(Parser, Debug, Clone)]
#[command(name = "manjaword-local")]
#[command(about = "ManjaWord editor session over the local filesystem")]
pub struct Config {
    /// Directory holding the crash-recovery snapshot
    #[arg(long, env = "MANJAWORD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Seconds between two autosave snapshots
    #[arg(long, default_value = "30", env = "MANJAWORD_AUTOSAVE_SECS")]
    pub autosave_interval_secs: u64,

    /// LanguageTool check endpoint
    #[arg(long, default_value = DEFAULT_GRAMMAR_URL, env = "MANJAWORD_GRAMMAR_URL")]
    pub grammar_url: String,

    /// Language sent with grammar checks
    #[arg(long, default_value = "en-US")]
    pub language: String,
}

impl Config {
    /// Get the effective data directory.
    pub fn effective_data_dir(&self) -> Result<PathBuf, BackendError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_local_dir()
                .map(|dir| dir.join("manjaword"))
                .ok_or(BackendError::PathUnavailable),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        // A zero period would make the autosave timer panic
        let secs = self.autosave_interval_secs.max(1);
        SessionConfig::default().with_autosave_interval(Duration::from_secs(secs))
    }
}
