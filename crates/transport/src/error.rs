//! Transport layer errors.

use sigrpc_bus::BusError;
use thiserror::Error;

/// Result type alias for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Transport layer errors.
///
/// Every variant is fatal to the exchange it occurred in and to nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Serialized transport header does not fit in one signal.
    ///
    /// Headers are never chunked, so this fails before anything is sent.
    #[error("Transport header is bigger than {max} ({actual} characters)")]
    HeaderTooLarge { actual: usize, max: usize },

    /// Incoming header has no correlation id.
    #[error("transport header is missing its exchange id")]
    MissingId,

    /// Incoming header is not a JSON transport header.
    #[error("malformed transport header: {reason}")]
    MalformedHeader { reason: String },

    /// Payload could not be serialized.
    #[error("payload serialization failed: {cause}")]
    Serialization { cause: String },

    /// Reassembled payload is not valid JSON.
    #[error("payload deserialization failed: {cause}")]
    Deserialization { cause: String },

    /// Staged payload was gone when the receiver looked for it.
    #[error("staged payload '{key}' expired before it was read")]
    PayloadExpired { key: String },

    /// Subscription ended before the exchange completed.
    #[error("transport channel closed")]
    Closed,

    /// Underlying bus rejected a signal.
    #[error(transparent)]
    Bus(BusError),
}

impl TransportError {
    /// Create a header too large error.
    #[must_use]
    pub const fn header_too_large(actual: usize, max: usize) -> Self {
        Self::HeaderTooLarge { actual, max }
    }

    /// Create a malformed header error.
    pub fn malformed_header(reason: impl ToString) -> Self {
        Self::MalformedHeader {
            reason: reason.to_string(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(cause: impl ToString) -> Self {
        Self::Serialization {
            cause: cause.to_string(),
        }
    }

    /// Create a deserialization error.
    pub fn deserialization(cause: impl ToString) -> Self {
        Self::Deserialization {
            cause: cause.to_string(),
        }
    }

    /// Create a payload expired error.
    pub fn payload_expired(key: impl Into<String>) -> Self {
        Self::PayloadExpired { key: key.into() }
    }

    /// Check if this is a protocol violation by the remote side.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::HeaderTooLarge { .. } | Self::MissingId | Self::MalformedHeader { .. }
        )
    }
}

impl From<BusError> for TransportError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::Closed => Self::Closed,
            other => Self::Bus(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_too_large_keeps_legacy_prefix() {
        let err = TransportError::header_too_large(3000, 2048);
        assert!(err.to_string().starts_with("Transport header is bigger than 2048"));
        assert!(err.is_protocol_error());
    }

    #[test]
    fn test_bus_closed_maps_to_closed() {
        assert_eq!(TransportError::from(BusError::Closed), TransportError::Closed);
        assert!(matches!(
            TransportError::from(BusError::message_too_large(3, 2)),
            TransportError::Bus(BusError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn test_payload_errors_are_not_protocol_errors() {
        assert!(!TransportError::deserialization("eof").is_protocol_error());
        assert!(!TransportError::payload_expired("k").is_protocol_error());
    }
}
