//! Reliable header + payload exchange over a size-limited signal bus.
//!
//! The bus carries at most `max_message_size` characters per signal and
//! never acknowledges anything. A transport moves one small inline header
//! plus an arbitrarily large JSON payload per exchange, so that the receiver
//! reconstructs exactly what the sender serialized or one side observes a
//! failure.
//!
//! Two strategies implement [`Transport`]:
//!
//! - [`ChunkedTransport`]: padded chunks over the bus with a two-step
//!   acknowledgment handshake (the default)
//! - [`BlackboardTransport`]: the payload is staged on a shared blackboard
//!   with an expiry and the header points at it
//!
//! A node uses exactly one strategy; [`build_transport`] picks it from
//! [`TransportConfig::strategy`].
//!
//! # Protocol
//!
//! Every exchange has a fresh [`ExchangeId`]. Its acknowledgment and chunk
//! channels live in the transport's reserved namespace and are scoped by that
//! id, so concurrent exchanges never see each other's traffic:
//!
//! ```text
//! <root>:<id>.sender     acknowledgments, receiver -> sender
//! <root>:<id>.receiver   chunks, sender -> receiver
//! <root>:<id>.payload    blackboard key for staged payloads
//! ```
//!
//! Headers are never chunked: a header that does not fit in one signal fails
//! the exchange before anything is sent. There is no chunk-level timeout;
//! callers bound each exchange with their own deadline.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sigrpc_bus::{Blackboard, InMemoryBlackboard, SignalBus};

pub mod chunk;
pub mod chunked;
pub mod config;
pub mod error;
pub mod header;
pub mod staged;

pub use chunk::{CHUNK_PADDING, ChunkAccumulator, chunk_payload};
pub use chunked::ChunkedTransport;
pub use config::{Strategy, TransportConfig};
pub use error::{TransportError, TransportResult};
pub use header::{ExchangeId, TransportHeader};
pub use staged::BlackboardTransport;

/// What the receiving side reconstructs from one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Received {
    /// Caller metadata from the transport header.
    pub header: Value,
    /// Payload, or `None` when the sender had none.
    pub payload: Option<Value>,
}

/// One side of a header + payload exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `header` and an optional payload to whoever listens on `channel`.
    ///
    /// `ttl` bounds how long staged data may outlive the exchange. Returns
    /// once the exchange is complete from the sender's point of view.
    async fn send(
        &self,
        channel: &str,
        header: Value,
        payload: Option<&Value>,
        ttl: Duration,
    ) -> TransportResult<()>;

    /// Complete an exchange whose header signal was `raw_header`.
    async fn receive(&self, raw_header: &str) -> TransportResult<Received>;
}

/// Build the transport selected by `config.strategy`.
///
/// The blackboard strategy uses `board`, or a fresh in-memory one when none
/// is given.
#[must_use]
pub fn build_transport(
    bus: Arc<SignalBus>,
    config: TransportConfig,
    board: Option<Arc<dyn Blackboard>>,
) -> Arc<dyn Transport> {
    match config.strategy {
        Strategy::Chunked => Arc::new(ChunkedTransport::new(bus, config)),
        Strategy::Blackboard => {
            let board: Arc<dyn Blackboard> = match board {
                Some(board) => board,
                None => InMemoryBlackboard::new_arc(),
            };
            Arc::new(BlackboardTransport::new(bus, board, config))
        }
    }
}
