//! Configuration for the transport layer.

use serde::{Deserialize, Serialize};
use sigrpc_bus::{MAX_MESSAGE_SIZE, NAMESPACE_SEPARATOR};

/// How payloads that do not fit in one signal are moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Split into padded chunks over the bus, with an ack handshake.
    #[default]
    Chunked,
    /// Stage on the blackboard with an expiry; the header points at it.
    Blackboard,
}

/// Configuration for a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Namespace reserved for acknowledgment and chunk channels.
    #[serde(default = "default_root")]
    pub root: String,

    /// Largest signal, in characters.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,

    /// Payload strategy.
    #[serde(default)]
    pub strategy: Strategy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            max_message_size: default_max_message_size(),
            strategy: Strategy::default(),
        }
    }
}

impl TransportConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.root.is_empty() {
            return Err("transport.root must not be empty".to_string());
        }

        if self.root.contains(NAMESPACE_SEPARATOR) {
            return Err(format!(
                "transport.root must not contain '{NAMESPACE_SEPARATOR}'"
            ));
        }

        // one character is reserved for the chunk padding
        if self.max_message_size < 2 {
            return Err("transport.max_message_size must be at least 2".to_string());
        }

        Ok(())
    }

    /// Largest chunk body, leaving room for the padding character.
    #[must_use]
    pub const fn max_chunk_chars(&self) -> usize {
        self.max_message_size.saturating_sub(1)
    }
}

fn default_root() -> String {
    "sigrpc_rmi".to_string()
}

const fn default_max_message_size() -> usize {
    MAX_MESSAGE_SIZE
}
