use crate::error::ConfigError;
use core_types::TopN;
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: Server,
    pub dashboard: Dashboard,
}

/// Contains the bind address for the web server.
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    /// The interface to bind to (e.g., "127.0.0.1").
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

/// Contains the dashboard defaults applied when a request omits a value.
#[derive(Debug, Clone, Deserialize)]
pub struct Dashboard {
    /// The "top N" ranking size used when a request does not choose one.
    /// Must lie within the slider's range.
    pub default_top_n: usize,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        TopN::new(self.dashboard.default_top_n).map_err(|e| {
            ConfigError::ValidationError(format!("dashboard.default_top_n: {e}"))
        })?;
        Ok(())
    }

    /// The validated default ranking size.
    pub fn default_top_n(&self) -> TopN {
        TopN::new(self.dashboard.default_top_n).unwrap_or_default()
    }
}
