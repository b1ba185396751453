mod playback_config;
#[allow(clippy::module_inception)]
mod config;
mod server_config;
mod storage_config;

pub(crate) use {
    config::Config, playback_config::PlaybackConfig, server_config::ServerConfig,
    storage_config::StorageConfig,
};

pub(crate) const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_SETTLE_DELAY_MS: u64 = 0;
pub(crate) const DEFAULT_FAST_RATE: f32 = 1.5;
pub(crate) const DEFAULT_START_FAST: bool = false;

pub(crate) fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

pub(crate) fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

pub(crate) fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

pub(crate) fn default_fast_rate() -> f32 {
    DEFAULT_FAST_RATE
}

pub(crate) fn default_start_fast() -> bool {
    DEFAULT_START_FAST
}
