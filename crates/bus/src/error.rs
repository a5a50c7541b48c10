//! Error types for the signal bus.

use thiserror::Error;

/// Result type alias for bus operations.
pub type BusResult<T> = std::result::Result<T, BusError>;

/// Signal bus error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// Payload exceeds the per-message limit.
    #[error("message too large: {actual} characters exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },

    /// Outbound sink rejected the message.
    #[error("signal sink failed: {reason}")]
    SinkFailed { reason: String },

    /// Subscription has been unsubscribed or the bus is gone.
    #[error("signal channel closed")]
    Closed,

    /// Channel name is not `namespace:local-name`.
    #[error("malformed channel name '{channel}': {reason}")]
    MalformedChannel { channel: String, reason: String },

    /// Builder was given an unusable setting.
    #[error("invalid bus configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl BusError {
    /// Create a message too large error.
    #[must_use]
    pub const fn message_too_large(actual: usize, max: usize) -> Self {
        Self::MessageTooLarge { actual, max }
    }

    /// Create a sink failure error.
    pub fn sink_failed(reason: impl Into<String>) -> Self {
        Self::SinkFailed {
            reason: reason.into(),
        }
    }

    /// Create a malformed channel error.
    pub fn malformed_channel(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedChannel {
            channel: channel.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
