//! Session configuration from TOML (`[session]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Idle seconds before a session is forgotten (default: 3600)
    pub ttl_secs: u64,
    /// Prior turns shown to the model (default: 3)
    pub history_window: usize,
    /// Seconds between background sweeps of expired sessions; 0 disables (default: 300)
    pub sweep_interval_secs: u64,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            history_window: 3,
            sweep_interval_secs: 300,
        }
    }
}
