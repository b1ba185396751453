use crate::config::{default_base_url, default_settle_delay_ms, default_timeout_secs};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Echo server connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL; requests go to `{base_url}/echo/`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pause between building the upload and sending it, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl ServerConfig {
    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Settle delay as a `Duration`.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}
