use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the recording and echo artifacts live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Override for the artifact directory. Defaults to the platform data
    /// directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<PathBuf>,
}
