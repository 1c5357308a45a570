//! Validated configuration structures

use crate::schema::{RawAliases, RawConfig, RawLockdownConfig, RawServiceConfig};
use lockin_api::Domain;
use lockin_util::{data_dir_without_env, rules_path, socket_path_without_env};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CHECK_INTERVAL_MINUTES: u64 = 1;
pub const DEFAULT_MAX_DURATION_MINUTES: i64 = 12 * 60;

/// Upper bound accepted for `max_duration_minutes` (30 days)
pub const MAX_DURATION_LIMIT_MINUTES: i64 = 30 * 24 * 60;

/// Validated configuration ready for use by the service
#[derive(Debug, Clone, Default)]
pub struct LockinConfig {
    pub service: ServiceConfig,
    pub lockdown: LockdownPolicy,
    pub aliases: AliasConfig,
}

impl LockinConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            lockdown: LockdownPolicy::from_raw(raw.lockdown),
            aliases: AliasConfig::from_raw(raw.aliases),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
    pub rules_path: PathBuf,
    pub check_interval: Duration,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        let data_dir = raw.data_dir.unwrap_or_else(data_dir_without_env);
        Self {
            socket_path: raw.socket_path.unwrap_or_else(socket_path_without_env),
            rules_path: raw.rules_path.unwrap_or_else(|| rules_path(&data_dir)),
            data_dir,
            check_interval: minutes(
                raw.check_interval_minutes
                    .unwrap_or(DEFAULT_CHECK_INTERVAL_MINUTES),
            ),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_raw(RawServiceConfig::default())
    }
}

/// Lockdown defaults and limits
#[derive(Debug, Clone)]
pub struct LockdownPolicy {
    pub default_allowlist: Vec<Domain>,
    pub max_duration_minutes: i64,
}

impl LockdownPolicy {
    fn from_raw(raw: RawLockdownConfig) -> Self {
        Self {
            // Entries were checked during validation
            default_allowlist: raw
                .default_allowlist
                .iter()
                .filter_map(|d| Domain::parse(d).ok())
                .collect(),
            max_duration_minutes: raw
                .max_duration_minutes
                .unwrap_or(DEFAULT_MAX_DURATION_MINUTES),
        }
    }

    /// Whether a requested length is within policy
    pub fn allows_duration(&self, minutes: i64) -> bool {
        minutes > 0 && minutes <= self.max_duration_minutes
    }
}

impl Default for LockdownPolicy {
    fn default() -> Self {
        Self {
            default_allowlist: Vec::new(),
            max_duration_minutes: DEFAULT_MAX_DURATION_MINUTES,
        }
    }
}

/// Alias table inputs
#[derive(Debug, Clone)]
pub struct AliasConfig {
    pub include_builtin: bool,
    pub groups: Vec<Vec<Domain>>,
}

impl AliasConfig {
    fn from_raw(raw: RawAliases) -> Self {
        Self {
            include_builtin: raw.include_builtin,
            groups: raw
                .groups
                .into_iter()
                .map(|g| {
                    g.domains
                        .iter()
                        .filter_map(|d| Domain::parse(d).ok())
                        .collect()
                })
                .collect(),
        }
    }
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            include_builtin: true,
            groups: Vec::new(),
        }
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}
