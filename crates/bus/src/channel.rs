//! Channel names and namespace filters.

use crate::error::{BusError, BusResult};

/// Hard per-message payload limit, in characters.
pub const MAX_MESSAGE_SIZE: usize = 2048;

/// Separates the namespace from the local name in a channel name.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Namespace part of a channel name: everything before the first separator.
///
/// Returns `None` when the name has no separator.
#[must_use]
pub fn namespace_of(channel: &str) -> Option<&str> {
    channel
        .split_once(NAMESPACE_SEPARATOR)
        .map(|(namespace, _)| namespace)
}

/// Split `namespace:local-name` at the first separator.
///
/// The namespace must be non-empty; the local name may contain anything,
/// including further separators.
pub fn parse_channel(channel: &str) -> BusResult<(&str, &str)> {
    let (namespace, local) = channel.split_once(NAMESPACE_SEPARATOR).ok_or_else(|| {
        BusError::malformed_channel(channel, format!("missing '{NAMESPACE_SEPARATOR}' separator"))
    })?;
    if namespace.is_empty() {
        return Err(BusError::malformed_channel(channel, "empty namespace"));
    }
    Ok((namespace, local))
}

/// Which channels a subscription receives, by namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceFilter {
    /// Every channel.
    All,
    /// Channels in exactly this namespace.
    Namespace(String),
}

impl NamespaceFilter {
    /// Filter for a single namespace.
    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self::Namespace(namespace.into())
    }

    /// Check if a channel falls inside this filter.
    #[must_use]
    pub fn matches(&self, channel: &str) -> bool {
        match (self, namespace_of(channel)) {
            (Self::All, _) => true,
            (_, None) => false,
            (Self::Namespace(ns), Some(namespace)) => ns == namespace,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn should_split_at_first_separator() {
        assert_eq!(
            parse_channel("sigrpc_rmi:01H.sender").unwrap(),
            ("sigrpc_rmi", "01H.sender")
        );
        assert_eq!(parse_channel("ns:a:b").unwrap(), ("ns", "a:b"));
        assert_eq!(parse_channel("ns:").unwrap(), ("ns", ""));
    }

    #[test]
    fn should_reject_names_without_namespace() {
        assert!(matches!(
            parse_channel("no-separator"),
            Err(BusError::MalformedChannel { .. })
        ));
        assert!(matches!(
            parse_channel(":local"),
            Err(BusError::MalformedChannel { .. })
        ));
    }

    #[test]
    fn should_match_namespace_exactly() {
        let filter = NamespaceFilter::namespace("sigrpc_game");

        assert!(filter.matches("sigrpc_game:rmi.event-payload"));
        assert!(!filter.matches("sigrpc_game_01H:stuff"));
        assert!(!filter.matches("sigrpc_gamex:rmi.event-payload"));
        assert!(!filter.matches("sigrpc_game"));
    }

    #[test]
    fn should_match_everything_with_all() {
        assert!(NamespaceFilter::All.matches("a:x"));
        assert!(NamespaceFilter::All.matches("anything"));
    }
}
