//! Error types for RPC calls and servers.

use std::time::Duration;

use sigrpc_bus::BusError;
use sigrpc_transport::TransportError;
use thiserror::Error;

/// Result type alias for RPC operations.
pub type RpcResult<T> = std::result::Result<T, RpcError>;

/// RPC error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// Namespace contains the channel-name separator.
    #[error("`:` is not a legal character for a namespace in: {namespace}")]
    InvalidNamespace { namespace: String },

    /// Namespace maps onto the channels the transport uses for its exchanges.
    #[error("namespace {namespace} is reserved for the transport")]
    ReservedNamespace { namespace: String },

    /// No response arrived within the call's window.
    #[error("Timeout: Timed out trying to run {endpoint} of {namespace}")]
    Timeout {
        endpoint: String,
        namespace: String,
        timeout: Duration,
    },

    /// Server reported a failure; the message is the server's, verbatim.
    #[error("{message}")]
    Remote { message: String },

    /// Transport exchange failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Bus rejected a signal. A closed subscription is reported as
    /// [`TransportError::Closed`] instead.
    #[error(transparent)]
    Bus(BusError),

    /// Request or response envelope could not be decoded.
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope { reason: String },

    /// Configuration is invalid.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    /// Server registration outside a tokio runtime.
    #[error("no tokio runtime available to run the server")]
    NoRuntime,
}

impl From<BusError> for RpcError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::Closed => Self::Transport(TransportError::Closed),
            other => Self::Bus(other),
        }
    }
}

impl RpcError {
    /// Create an invalid namespace error.
    pub fn invalid_namespace(namespace: impl Into<String>) -> Self {
        Self::InvalidNamespace {
            namespace: namespace.into(),
        }
    }

    /// Create a reserved namespace error.
    pub fn reserved_namespace(namespace: impl Into<String>) -> Self {
        Self::ReservedNamespace {
            namespace: namespace.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(endpoint: impl Into<String>, namespace: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            endpoint: endpoint.into(),
            namespace: namespace.into(),
            timeout,
        }
    }

    /// Create a remote error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Create a malformed envelope error.
    pub fn malformed_envelope(reason: impl ToString) -> Self {
        Self::MalformedEnvelope {
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Check if this error is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if a subscription or the bus went away mid-call.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Closed))
    }

    /// Check if the server reported this error.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}
