//! Channel names for servers, requests and replies.
//!
//! ```text
//! <root>_<namespace>:rmi.event-payload     requests into a server
//! <root>_<namespace>:rmi.event-stop        stop signal for a server
//! <root>_<namespace>_<callId>:<endpoint>   reply to one call
//! ```

use sigrpc_bus::NAMESPACE_SEPARATOR;

use crate::config::RpcConfig;
use crate::envelope::CallId;
use crate::error::{RpcError, RpcResult};

/// Local name of a server's request channel.
pub const PAYLOAD_CHANNEL: &str = "rmi.event-payload";

/// Local name of a server's stop channel.
pub const STOP_CHANNEL: &str = "rmi.event-stop";

/// Reject namespaces that would break the channel-name grammar or land on
/// the transport's own namespace.
pub fn validate_namespace(config: &RpcConfig, namespace: &str) -> RpcResult<()> {
    if namespace.contains(NAMESPACE_SEPARATOR) {
        return Err(RpcError::invalid_namespace(namespace));
    }
    if server_namespace(&config.root, namespace) == config.transport.root {
        return Err(RpcError::reserved_namespace(namespace));
    }
    Ok(())
}

#[must_use]
pub fn server_namespace(root: &str, namespace: &str) -> String {
    format!("{root}_{namespace}")
}

#[must_use]
pub fn input_channel(root: &str, namespace: &str) -> String {
    format!("{}:{PAYLOAD_CHANNEL}", server_namespace(root, namespace))
}

#[must_use]
pub fn stop_channel(root: &str, namespace: &str) -> String {
    format!("{}:{STOP_CHANNEL}", server_namespace(root, namespace))
}

/// Namespace private to one call.
#[must_use]
pub fn reply_namespace(root: &str, namespace: &str, id: CallId) -> String {
    format!("{}_{id}", server_namespace(root, namespace))
}

#[must_use]
pub fn reply_channel(root: &str, namespace: &str, id: CallId, endpoint: &str) -> String {
    format!("{}:{endpoint}", reply_namespace(root, namespace, id))
}

#[cfg(test)]
mod tests {
    use sigrpc_bus::{NamespaceFilter, namespace_of};

    use super::*;

    #[test]
    fn test_channel_grammar() {
        assert_eq!(input_channel("sigrpc", "game"), "sigrpc_game:rmi.event-payload");
        assert_eq!(stop_channel("sigrpc", "game"), "sigrpc_game:rmi.event-stop");

        let id = CallId::new();
        assert_eq!(
            reply_channel("sigrpc", "game", id, "stuff"),
            format!("sigrpc_game_{id}:stuff")
        );
    }

    #[test]
    fn test_replies_outside_server_namespace() {
        let server = NamespaceFilter::namespace(server_namespace("sigrpc", "game"));
        let id = CallId::new();
        let reply = reply_channel("sigrpc", "game", id, "stuff");

        assert!(!server.matches(&reply));
        assert!(server.matches(&input_channel("sigrpc", "game")));
        assert_eq!(
            namespace_of(&reply),
            Some(reply_namespace("sigrpc", "game", id).as_str())
        );
    }

    #[test]
    fn test_validate_namespace() {
        let config = RpcConfig::default();
        assert!(validate_namespace(&config, "game").is_ok());
        assert!(validate_namespace(&config, "").is_ok());
        assert_eq!(
            validate_namespace(&config, "ga:me"),
            Err(RpcError::invalid_namespace("ga:me"))
        );
    }

    #[test]
    fn test_transport_namespace_is_reserved() {
        let mut config = RpcConfig::default();
        assert_eq!(
            validate_namespace(&config, "rmi"),
            Err(RpcError::reserved_namespace("rmi"))
        );
        assert!(validate_namespace(&config, "rmi2").is_ok());

        config.transport.root = "chunks".to_owned();
        assert!(validate_namespace(&config, "rmi").is_ok());
    }
}
