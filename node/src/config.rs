//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::NodeError;

/// Configuration for an hourly-stats node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory of the LMDB environment holding the snapshot.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Token every request must present in the `Authorization` header.
    #[serde(default)]
    pub auth_token: String,

    /// Seconds between periodic snapshot flushes.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_db_path() -> PathBuf {
    PathBuf::from("./hstats_data")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_flush_interval_secs() -> u64 {
    600
}

fn default_map_size_mb() -> usize {
    64
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    /// Check the settings a running node cannot do without.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(NodeError::Config("path to DB not set".into()));
        }
        if self.auth_token.is_empty() {
            return Err(NodeError::Config("auth token not set".into()));
        }
        if self.flush_interval_secs == 0 {
            return Err(NodeError::Config("flush interval must be at least one second".into()));
        }
        if self.map_size_mb == 0 {
            return Err(NodeError::Config("LMDB map size must be non-zero".into()));
        }
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    /// Copy with the token masked, for printing.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.auth_token.is_empty() {
            copy.auth_token = "<redacted>".to_string();
        }
        copy
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            auth_token: String::new(),
            flush_interval_secs: default_flush_interval_secs(),
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
