//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the simulator.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::access_log::store::{DEFAULT_MAX_ENTRIES, DEFAULT_RETAIN_ENTRIES};
use crate::admin::session::DEFAULT_SESSION_TTL_SECS;

/// Placeholder password shipped in the defaults.
pub const DEFAULT_ADMIN_PASSWORD: &str = "changeMe123!";

/// Root configuration for the simulator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SimConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Admin panel and session settings.
    pub admin: AdminConfig,

    /// Durable store locations.
    pub storage: StorageConfig,

    /// Access log rotation policy.
    pub access_log: AccessLogConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Admin panel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared admin password checked by the login form.
    pub password: String,

    /// Path prefix of the admin UI and API.
    pub path_prefix: String,

    /// Session lifetime in seconds.
    pub session_ttl_secs: u64,

    /// Add `Secure` to the session cookie.
    pub secure_cookie: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
            path_prefix: "/control-panel".to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            secure_cookie: false,
        }
    }
}

/// Durable store locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding every store file.
    pub data_dir: PathBuf,

    /// Hostname rules file name.
    pub rules_file: String,

    /// Live access log file name; archives are written beside it.
    pub access_log_file: String,

    /// Report email settings file name.
    pub email_config_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("config"),
            rules_file: "domain-rules.json".to_string(),
            access_log_file: "access-logs.json".to_string(),
            email_config_file: "email-config.json".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn rules_path(&self) -> PathBuf {
        self.data_dir.join(&self.rules_file)
    }

    pub fn access_log_path(&self) -> PathBuf {
        self.data_dir.join(&self.access_log_file)
    }

    pub fn email_config_path(&self) -> PathBuf {
        self.data_dir.join(&self.email_config_file)
    }
}

/// Access log rotation policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessLogConfig {
    /// Live entries allowed before a rotation.
    pub max_entries: usize,

    /// Newest entries kept live after a rotation.
    pub retain_entries: usize,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            retain_entries: DEFAULT_RETAIN_ENTRIES,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.admin.path_prefix, "/control-panel");
        assert_eq!(config.admin.session_ttl_secs, 86_400);
        assert_eq!(config.access_log.max_entries, 10_000);
        assert_eq!(config.access_log.retain_entries, 1_000);
        assert_eq!(config.storage.rules_path(), PathBuf::from("config/domain-rules.json"));
    }

    #[test]
    fn test_partial_toml() {
        let config: SimConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:4000"

            [storage]
            data_dir = "/var/lib/hostsim"
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
        assert_eq!(config.storage.access_log_path(), PathBuf::from("/var/lib/hostsim/access-logs.json"));
        assert_eq!(config.admin.password, DEFAULT_ADMIN_PASSWORD);
    }
}
