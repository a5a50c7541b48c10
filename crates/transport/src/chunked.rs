//! Chunk-and-acknowledge transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sigrpc_bus::{NamespaceFilter, SignalBus};
use tracing::{debug, error};

use crate::chunk::{ChunkAccumulator, chunk_payload, pad_chunk};
use crate::config::TransportConfig;
use crate::error::{TransportError, TransportResult};
use crate::header::{ExchangeId, TransportHeader, receiver_channel, sender_channel};
use crate::{Received, Transport};

/// Moves payloads as padded chunks over the bus.
///
/// Sender and receiver must both be live for the whole exchange:
///
/// ```text
/// sender                                receiver
///   | -- header {id, chunkCount} ------->  |  (caller channel)
///   | <------------------- ack ---------- |  <root>:<id>.sender
///   | -- -chunk 1 .. -chunk N ----------> |  <root>:<id>.receiver
///   | <------------------- ack ---------- |  <root>:<id>.sender
/// ```
///
/// Without a payload only the header and the first ack are exchanged.
pub struct ChunkedTransport {
    bus: Arc<SignalBus>,
    config: TransportConfig,
}

impl ChunkedTransport {
    #[must_use]
    pub const fn new(bus: Arc<SignalBus>, config: TransportConfig) -> Self {
        Self { bus, config }
    }

    fn acks(&self) -> NamespaceFilter {
        NamespaceFilter::namespace(self.config.root.as_str())
    }

    fn check_header_size(&self, raw: &str, id: ExchangeId) -> TransportResult<()> {
        let actual = raw.chars().count();
        let max = self.config.max_message_size;
        if actual > max {
            error!(exchange_id = %id, actual, max, "Transport header too large");
            return Err(TransportError::header_too_large(actual, max));
        }
        Ok(())
    }

    fn ack(&self, sender: &str) -> TransportResult<()> {
        self.bus.emit(sender, "")?;
        Ok(())
    }
}

#[async_trait]
impl Transport for ChunkedTransport {
    async fn send(
        &self,
        channel: &str,
        header: Value,
        payload: Option<&Value>,
        _ttl: Duration,
    ) -> TransportResult<()> {
        let id = ExchangeId::new();
        let serialized = payload
            .map(serde_json::to_string)
            .transpose()
            .map_err(TransportError::serialization)?;
        let chunks = serialized
            .as_deref()
            .map(|data| chunk_payload(data, self.config.max_chunk_chars()))
            .unwrap_or_default();
        let chunk_count = u32::try_from(chunks.len()).map_err(TransportError::serialization)?;

        let raw = TransportHeader::new(id, header)
            .with_chunk_count(chunk_count)
            .encode()?;
        self.check_header_size(&raw, id)?;

        // subscribe before emitting so the first ack cannot be missed
        let mut acks = self.bus.subscribe(self.acks());
        let sender = sender_channel(&self.config.root, id);

        debug!(exchange_id = %id, channel, chunk_count, "Sending transport header");
        self.bus.emit(channel, &raw)?;
        acks.recv_on(&sender).await?;

        if chunks.is_empty() {
            return Ok(());
        }

        let receiver = receiver_channel(&self.config.root, id);
        for chunk in &chunks {
            self.bus.emit(&receiver, &pad_chunk(chunk))?;
        }
        acks.recv_on(&sender).await?;

        debug!(exchange_id = %id, chunk_count, "Transport exchange complete");
        Ok(())
    }

    async fn receive(&self, raw_header: &str) -> TransportResult<Received> {
        let header = TransportHeader::parse(raw_header).inspect_err(|e| {
            error!(error = %e, "Rejected incoming transport header");
        })?;
        let sender = sender_channel(&self.config.root, header.id);

        let Some(expected) = header.expected_chunks() else {
            self.ack(&sender)?;
            return Ok(Received {
                header: header.header,
                payload: None,
            });
        };

        let mut chunks = self.bus.subscribe(self.acks());
        self.ack(&sender)?;

        let receiver = receiver_channel(&self.config.root, header.id);
        let mut accumulator = ChunkAccumulator::new(expected);
        let data = loop {
            let chunk = chunks.recv_on(&receiver).await?;
            if let Some(data) = accumulator.push(&chunk) {
                break data;
            }
        };
        chunks.unsubscribe();

        // ack only a payload that decodes
        let payload = serde_json::from_str(&data).map_err(|e| {
            error!(exchange_id = %header.id, error = %e, "Reassembled payload is not valid JSON");
            TransportError::deserialization(e)
        })?;
        debug!(exchange_id = %header.id, chunk_count = expected, "Reassembled payload");
        self.ack(&sender)?;

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
    use sigrpc_bus::BusError;

    use super::*;

    fn setup() -> (Arc<SignalBus>, Arc<ChunkedTransport>) {
        let bus = Arc::new(SignalBus::new());
        let transport = Arc::new(ChunkedTransport::new(
            Arc::clone(&bus),
            TransportConfig::default(),
        ));
        (bus, transport)
    }

    async fn exchange(payload: Option<Value>) -> Received {
        let (bus, transport) = setup();
        let mut inbox = bus.subscribe(NamespaceFilter::namespace("app"));

        let sender = {
            let transport = Arc::clone(&transport);
            tokio::spawn(async move {
                transport
                    .send("app:in", json!({ "kind": "test" }), payload.as_ref(), Duration::from_secs(5))
                    .await
            })
        };

        let raw = inbox.recv_on("app:in").await.unwrap();
        let received = transport.receive(&raw).await.unwrap();
        sender.await.unwrap().unwrap();
        received
    }

    #[tokio::test]
    async fn should_exchange_header_without_payload() {
        let received = exchange(None).await;
        assert_eq!(received.header, json!({ "kind": "test" }));
        assert_eq!(received.payload, None);
    }

    #[tokio::test]
    async fn should_distinguish_null_from_absent() {
        let received = exchange(Some(Value::Null)).await;
        assert_eq!(received.payload, Some(Value::Null));
    }

    #[tokio::test]
    async fn should_reassemble_payload_over_limit() {
        let big = json!({ "blob": "z".repeat(10_000), "n": [1, 2, 3] });
        let received = exchange(Some(big.clone())).await;
        assert_eq!(received.payload, Some(big));
    }

    #[tokio::test]
    async fn should_fail_fast_on_oversized_header() {
        let (bus, transport) = setup();
        let mut inbox = bus.subscribe(NamespaceFilter::namespace("app"));

        let err = transport
            .send("app:in", json!("h".repeat(3000)), None, Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::HeaderTooLarge { max: 2048, .. }));
        assert_eq!(inbox.try_recv().unwrap(), None);
    }

    #[tokio::test]
    async fn should_reject_header_without_id() {
        let (bus, transport) = setup();
        let mut acks = bus.subscribe(NamespaceFilter::All);

        let err = transport.receive(r#"{"header":{}}"#).await.unwrap_err();

        assert_eq!(err, TransportError::MissingId);
        assert_eq!(acks.try_recv().unwrap(), None);
    }

    #[tokio::test]
    async fn should_surface_bus_rejection() {
        let bus = Arc::new(SignalBus::builder().with_max_message_size(64).build().unwrap());
        let config = TransportConfig {
            max_message_size: 4096,
            ..TransportConfig::default()
        };
        let transport = ChunkedTransport::new(bus, config);

        let err = transport
            .send("app:in", json!("h".repeat(100)), None, Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Bus(BusError::MessageTooLarge { .. })));
    }

    #[tokio::test]
    async fn should_withhold_final_ack_when_payload_does_not_decode() {
        let (bus, transport) = setup();
        let id = ExchangeId::new();
        let raw = TransportHeader::new(id, json!({}))
            .with_chunk_count(1)
            .encode()
            .unwrap();
        let sender = sender_channel("sigrpc_rmi", id);
        let mut acks = bus.subscribe(NamespaceFilter::namespace("sigrpc_rmi"));

        let receiver = {
            let transport = Arc::clone(&transport);
            tokio::spawn(async move { transport.receive(&raw).await })
        };

        acks.recv_on(&sender).await.unwrap();
        bus.emit(&receiver_channel("sigrpc_rmi", id), &pad_chunk("{not json"))
            .unwrap();

        let err = receiver.await.unwrap().unwrap_err();
        assert!(matches!(err, TransportError::Deserialization { .. }));

        let mut later = Vec::new();
        while let Some(notification) = acks.try_recv().unwrap() {
            later.push(notification.channel);
        }
        assert!(!later.contains(&sender), "second ack sent for undecodable payload");
    }
}
