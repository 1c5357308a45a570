//! Default paths for lockind components
//!
//! Paths are user-writable by default (no root required):
//! - Socket: `$XDG_RUNTIME_DIR/lockin/lockind.sock` or `/tmp/lockin-$USER/lockind.sock`
//! - Data: `$XDG_DATA_HOME/lockin` or `~/.local/share/lockin`
//! - Config: `$XDG_CONFIG_HOME/lockin/config.toml` or `~/.config/lockin/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const LOCKIN_SOCKET_ENV: &str = "LOCKIN_SOCKET";

/// Environment variable for overriding the data directory
pub const LOCKIN_DATA_DIR_ENV: &str = "LOCKIN_DATA_DIR";

const SOCKET_FILENAME: &str = "lockind.sock";
const CONFIG_FILENAME: &str = "config.toml";
const DATABASE_FILENAME: &str = "lockind.db";
const RULES_FILENAME: &str = "rules.json";

/// Application subdirectory name
const APP_DIR: &str = "lockin";

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$LOCKIN_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/lockin/lockind.sock` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/lockin-$USER/lockind.sock` (fallback)
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(LOCKIN_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Get the socket path without checking the LOCKIN_SOCKET env var.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$LOCKIN_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/lockin` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/lockin` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(LOCKIN_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking the LOCKIN_DATA_DIR env var.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the default configuration file path.
///
/// `$XDG_CONFIG_HOME/lockin/config.toml`, falling back to
/// `~/.config/lockin/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Database file inside a data directory
pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(DATABASE_FILENAME)
}

/// Published rule file inside a data directory
pub fn rules_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(RULES_FILENAME)
}

/// Get the parent directory of the socket (for creating it)
pub fn socket_dir() -> PathBuf {
    let socket_path = socket_path_without_env();
    socket_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp").join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_path_contains_app_dir() {
        let path = socket_path_without_env();
        assert!(path.to_string_lossy().contains("lockin"));
        assert!(path.to_string_lossy().ends_with("lockind.sock"));
    }

    #[test]
    fn data_dir_contains_app_dir() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("lockin"));
    }

    #[test]
    fn config_path_is_toml() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("lockin"));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
    }

    #[test]
    fn data_files_live_in_data_dir() {
        let dir = PathBuf::from("/var/lib/lockin");
        assert_eq!(database_path(&dir), dir.join("lockind.db"));
        assert_eq!(rules_path(&dir), dir.join("rules.json"));
    }

    #[test]
    fn socket_dir_is_parent_of_socket_path() {
        let socket = socket_path_without_env();
        let dir = socket_dir();
        assert_eq!(socket.parent().unwrap(), dir);
    }
}
