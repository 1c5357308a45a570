//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Lockdown defaults and limits
    #[serde(default)]
    pub lockdown: RawLockdownConfig,

    /// Alias table configuration
    #[serde(default)]
    pub aliases: RawAliases,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path (default: $XDG_RUNTIME_DIR/lockin/lockind.sock)
    pub socket_path: Option<PathBuf>,

    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// Where the rule sink writes the installed rules
    pub rules_path: Option<PathBuf>,

    /// Period of the recurring expiry check
    pub check_interval_minutes: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLockdownConfig {
    /// Allow-list stored on first install
    #[serde(default)]
    pub default_allowlist: Vec<String>,

    /// Longest lockdown a client may request
    pub max_duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawAliases {
    /// Whether the built-in alias groups are loaded
    #[serde(default = "default_true")]
    pub include_builtin: bool,

    #[serde(default)]
    pub groups: Vec<RawAliasGroup>,
}

impl Default for RawAliases {
    fn default() -> Self {
        Self {
            include_builtin: true,
            groups: Vec::new(),
        }
    }
}

/// One set of interchangeable hosts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawAliasGroup {
    pub domains: Vec<String>,
}

fn default_true() -> bool {
    true
}
