//! Blackboard staging transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sigrpc_bus::{Blackboard, SignalBus, stage_with_expiry};
use tracing::{debug, error, warn};

use crate::config::TransportConfig;
use crate::error::{TransportError, TransportResult};
use crate::header::{ExchangeId, TransportHeader, payload_key};
use crate::{Received, Transport};

/// Moves payloads through a shared blackboard.
///
/// The payload is written under `<root>:<id>.payload` and the header,
/// flagged `staged`, is the only signal sent. No acknowledgments are
/// exchanged, so the payload survives the sender going away, but every
/// staged entry lives until its ttl elapses whether or not it was read.
pub struct BlackboardTransport {
    bus: Arc<SignalBus>,
    board: Arc<dyn Blackboard>,
    config: TransportConfig,
}

impl BlackboardTransport {
    #[must_use]
    pub fn new(bus: Arc<SignalBus>, board: Arc<dyn Blackboard>, config: TransportConfig) -> Self {
        Self { bus, board, config }
    }
}

#[async_trait]
impl Transport for BlackboardTransport {
    async fn send(
        &self,
        channel: &str,
        header: Value,
        payload: Option<&Value>,
        ttl: Duration,
    ) -> TransportResult<()> {
        let id = ExchangeId::new();
        let serialized = payload
            .map(serde_json::to_string)
            .transpose()
            .map_err(TransportError::serialization)?;

        let mut transport_header = TransportHeader::new(id, header);
        if serialized.is_some() {
            transport_header = transport_header.with_staged_payload();
        }
        let raw = transport_header.encode()?;

        let actual = raw.chars().count();
        let max = self.config.max_message_size;
        if actual > max {
            error!(exchange_id = %id, actual, max, "Transport header too large");
            return Err(TransportError::header_too_large(actual, max));
        }

        if let Some(data) = serialized {
            let key = payload_key(&self.config.root, id);
            debug!(exchange_id = %id, key = %key, "Staging payload");
            // the expiry task owns its own handle
            let _expiry = stage_with_expiry(Arc::clone(&self.board), key, data, ttl).await?;
        }

        self.bus.emit(channel, &raw)?;
        Ok(())
    }

    async fn receive(&self, raw_header: &str) -> TransportResult<Received> {
        let header = TransportHeader::parse(raw_header).inspect_err(|e| {
            error!(error = %e, "Rejected incoming transport header");
        })?;

        if !header.is_staged() {
            if header.expected_chunks().is_some() {
                warn!(exchange_id = %header.id, "Ignoring chunked payload on blackboard transport");
            }
            return Ok(Received {
                header: header.header,
                payload: None,
            });
        }

        let key = payload_key(&self.config.root, header.id);
        let data = self
            .board
            .get(&key)
            .await?
            .ok_or_else(|| TransportError::payload_expired(key.as_str()))?;
        let payload = serde_json::from_str(&data).map_err(TransportError::deserialization)?;

        Ok(Received {
            header: header.header,
            payload: Some(payload),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;
    use sigrpc_bus::{InMemoryBlackboard, NamespaceFilter};

    use super::*;

    fn setup() -> (Arc<SignalBus>, Arc<InMemoryBlackboard>, BlackboardTransport) {
        let bus = Arc::new(SignalBus::new());
        let board = InMemoryBlackboard::new_arc();
        let transport = BlackboardTransport::new(
            Arc::clone(&bus),
            board.clone(),
            TransportConfig::default(),
        );
        (bus, board, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn should_stage_and_read_large_payload() {
        let (bus, board, transport) = setup();
        let mut inbox = bus.subscribe(NamespaceFilter::namespace("app"));
        let big = json!({ "blob": "q".repeat(8000) });

        transport
            .send("app:in", json!("h"), Some(&big), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(board.len().await.unwrap(), 1);

        let raw = inbox.recv_on("app:in").await.unwrap();
        assert!(raw.chars().count() <= 2048);
        assert!(raw.contains(r#""staged":true"#));

        let received = transport.receive(&raw).await.unwrap();
        assert_eq!(received.header, json!("h"));
        assert_eq!(received.payload, Some(big));
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_expired_payload() {
        let (bus, board, transport) = setup();
        let mut inbox = bus.subscribe(NamespaceFilter::namespace("app"));

        transport
            .send("app:in", Value::Null, Some(&json!(42)), Duration::from_secs(5))
            .await
            .unwrap();
        let raw = inbox.recv_on("app:in").await.unwrap();

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(board.len().await.unwrap(), 0);

        let err = transport.receive(&raw).await.unwrap_err();
        assert!(matches!(err, TransportError::PayloadExpired { .. }));
    }

    #[tokio::test]
    async fn should_not_stage_without_payload() {
        let (bus, board, transport) = setup();
        let mut inbox = bus.subscribe(NamespaceFilter::namespace("app"));

        transport
            .send("app:in", json!({ "a": 1 }), None, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(board.len().await.unwrap(), 0);
        let raw = inbox.recv_on("app:in").await.unwrap();
        let received = transport.receive(&raw).await.unwrap();
        assert_eq!(received.payload, None);
    }

    #[tokio::test]
    async fn should_not_stage_when_header_too_large() {
        let (_bus, board, transport) = setup();

        let err = transport
            .send("app:in", json!("h".repeat(3000)), Some(&json!(1)), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::HeaderTooLarge { .. }));
        assert_eq!(board.len().await.unwrap(), 0);
    }
}
