//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the console.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the console.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Transport selection and timeouts.
    pub transport: TransportConfig,

    /// Auto-recovery of a stopped dependency.
    pub recovery: RecoveryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Field value persistence.
    pub storage: StorageConfig,

    /// Backend endpoints per service name.
    pub services: BTreeMap<String, ServiceConfig>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let services = [
            ("fabcoin", ServiceConfig::keyed("http://127.0.0.1:7000/rpc", "rpcCall")),
            ("kanbanGO", ServiceConfig::positional("http://127.0.0.1:7100/rpc")),
            (
                "initialization",
                ServiceConfig::keyed("http://127.0.0.1:7000/initialization", "fabcoinInitialization"),
            ),
            (
                "kanbanGOInitialization",
                ServiceConfig::keyed("http://127.0.0.1:7000/initialization/kanbanGO", "rpcCall"),
            ),
        ];
        Self {
            transport: TransportConfig::default(),
            recovery: RecoveryConfig::default(),
            observability: ObservabilityConfig::default(),
            storage: StorageConfig::default(),
            services: services
                .into_iter()
                .map(|(name, service)| (name.to_string(), service))
                .collect(),
        }
    }
}

/// Transport configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub timeout_secs: u64,

    /// Bodies longer than this many bytes are POSTed.
    pub post_threshold: usize,

    /// POST every request regardless of size.
    pub force_post: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            post_threshold: 1000,
            force_post: false,
        }
    }
}

/// Auto-recovery configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub enabled: bool,

    /// Backend error text meaning "dependency not started".
    pub sentinel: String,

    /// Service and call label of the bootstrap call.
    pub bootstrap_service: String,
    pub bootstrap_call: String,

    /// Consecutive bootstraps allowed per call label.
    pub max_attempts: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sentinel: "Fabcoind was never started".to_string(),
            bootstrap_service: "initialization".to_string(),
            bootstrap_call: "runFabcoind".to_string(),
            max_attempts: 1,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Persistence of field values between sessions.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding field values. `None` disables persistence.
    pub path: Option<PathBuf>,
}

/// Request body layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// `{ <method_field>: method, ...arguments }`
    #[default]
    Keyed,
    /// JSON-RPC 2.0 with ordered `params`.
    Positional,
}

/// One backend service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Instances; broadcast calls go to all, single-node calls to the first.
    pub urls: Vec<String>,

    pub wire: WireFormat,

    /// Key carrying the method name in the keyed form.
    pub method_field: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            wire: WireFormat::Keyed,
            method_field: "rpcCall".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn keyed(url: &str, method_field: &str) -> Self {
        Self {
            urls: vec![url.to_string()],
            wire: WireFormat::Keyed,
            method_field: method_field.to_string(),
        }
    }

    pub fn positional(url: &str) -> Self {
        Self {
            urls: vec![url.to_string()],
            wire: WireFormat::Positional,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ConsoleConfig = toml::from_str("").unwrap();
        assert_eq!(config.transport.post_threshold, 1000);
        assert_eq!(config.recovery.max_attempts, 1);
        assert_eq!(config.services["kanbanGO"].wire, WireFormat::Positional);
        assert_eq!(config.services["initialization"].method_field, "fabcoinInitialization");
        let kanban_init = &config.services["kanbanGOInitialization"];
        assert_eq!(kanban_init.method_field, "rpcCall");
        assert_ne!(kanban_init.urls, config.services["initialization"].urls);
    }

    #[test]
    fn test_service_section() {
        let config: ConsoleConfig = toml::from_str(
            r#"
            [transport]
            force_post = true

            [services.fabcoin]
            urls = ["http://10.0.0.1:7000/rpc", "http://10.0.0.2:7000/rpc"]
            "#,
        )
        .unwrap();
        assert!(config.transport.force_post);
        let fab = &config.services["fabcoin"];
        assert_eq!(fab.urls.len(), 2);
        assert_eq!(fab.method_field, "rpcCall");
        // A services table replaces the built-in endpoints.
        assert!(!config.services.contains_key("kanbanGO"));
    }
}
