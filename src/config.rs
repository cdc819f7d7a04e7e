//! Configuration Module
//!
//! Handles loading cache and server configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding disk cache records
    pub cache_dir: PathBuf,
    /// Maximum number of entries the memory tier can hold
    pub max_memory_items: usize,
    /// Whether `put` may persist records to disk
    pub disk_cache_enabled: bool,
    /// HTTP server port
    pub server_port: u16,
    /// Background optimization interval in seconds
    pub optimize_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Disk cache directory, `~` is expanded (default: ./cache)
    /// - `MAX_MEMORY_ITEMS` - Memory tier capacity (default: 1000)
    /// - `DISK_CACHE_ENABLED` - `true`/`false`, `1`/`0` (default: true)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `OPTIMIZE_INTERVAL` - Disk sweep frequency in seconds (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| expand_home(&v))
                .unwrap_or(defaults.cache_dir),
            max_memory_items: env::var("MAX_MEMORY_ITEMS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(defaults.max_memory_items),
            disk_cache_enabled: env::var("DISK_CACHE_ENABLED")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.disk_cache_enabled),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            optimize_interval: env::var("OPTIMIZE_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &u64| *v > 0)
                .unwrap_or(defaults.optimize_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache"),
            max_memory_items: 1000,
            disk_cache_enabled: true,
            server_port: 3000,
            optimize_interval: 300,
        }
    }
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, or when `HOME` is unset, are returned as-is.
pub fn expand_home(path: &str) -> PathBuf {
    let home = env::var_os("HOME").map(PathBuf::from);
    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
