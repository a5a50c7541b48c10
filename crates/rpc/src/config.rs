//! Configuration for RPC clients and servers.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sigrpc_bus::NAMESPACE_SEPARATOR;
use sigrpc_transport::TransportConfig;

use crate::error::{RpcError, RpcResult};

/// Configuration for an RPC node.
///
/// ```toml
/// root = "sigrpc"
/// default_timeout_secs = 60
/// receive_timeout_secs = 60
///
/// [transport]
/// root = "sigrpc_rmi"
/// max_message_size = 2048
/// strategy = "chunked"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Prefix of every server namespace (`<root>_<namespace>`).
    #[serde(default = "default_root")]
    pub root: String,

    /// Call timeout when the caller does not give one, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Bound on reconstructing one incoming request, in seconds.
    #[serde(default = "default_receive_timeout_secs")]
    pub receive_timeout_secs: u64,

    /// Transport settings.
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            default_timeout_secs: default_timeout_secs(),
            receive_timeout_secs: default_receive_timeout_secs(),
            transport: TransportConfig::default(),
        }
    }
}

impl RpcConfig {
    /// Create a new config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> RpcResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| RpcError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> RpcResult<String> {
        toml::to_string(self).map_err(|e| RpcError::config(e.to_string()))
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid.
    pub fn validate(&self) -> RpcResult<()> {
        if self.root.is_empty() {
            return Err(RpcError::config("root must not be empty"));
        }

        if self.root.contains(NAMESPACE_SEPARATOR) {
            return Err(RpcError::config(format!(
                "root must not contain '{NAMESPACE_SEPARATOR}'"
            )));
        }

        if self.default_timeout_secs == 0 {
            return Err(RpcError::config("default_timeout_secs must be greater than 0"));
        }

        if self.receive_timeout_secs == 0 {
            return Err(RpcError::config("receive_timeout_secs must be greater than 0"));
        }

        self.transport.validate().map_err(RpcError::config)
    }

    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    #[must_use]
    pub const fn receive_timeout(&self) -> Duration {
        Duration::from_secs(self.receive_timeout_secs)
    }
}

fn default_root() -> String {
    "sigrpc".to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_receive_timeout_secs() -> u64 {
    60
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use sigrpc_transport::Strategy;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RpcConfig::new();
        assert_eq!(config.root, "sigrpc");
        assert_eq!(config.default_timeout(), Duration::from_secs(60));
        assert_eq!(config.receive_timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        assert_eq!(RpcConfig::from_toml_str("").unwrap(), RpcConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = RpcConfig::from_toml_str(
            r#"
            default_timeout_secs = 5

            [transport]
            strategy = "blackboard"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_timeout_secs, 5);
        assert_eq!(config.root, "sigrpc");
        assert_eq!(config.transport.strategy, Strategy::Blackboard);
        assert_eq!(config.transport.max_message_size, 2048);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = RpcConfig {
            root: "game".into(),
            ..RpcConfig::default()
        };
        let rendered = config.to_toml_string().unwrap();
        assert_eq!(RpcConfig::from_toml_str(&rendered).unwrap(), config);
    }

    #[test]
    fn test_rejects_invalid_values() {
        for source in [
            r#"root = """#,
            r#"root = "a:b""#,
            "default_timeout_secs = 0",
            "receive_timeout_secs = 0",
            "[transport]\nmax_message_size = 1",
            "default_timeout_secs = \"soon\"",
        ] {
            assert!(
                matches!(RpcConfig::from_toml_str(source), Err(RpcError::Config { .. })),
                "accepted: {source}"
            );
        }
    }
}
