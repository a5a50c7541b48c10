//! Exchange ids, transport headers and per-exchange channel names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

use crate::error::{TransportError, TransportResult};

/// Unique identifier for one transport exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(Ulid);

impl ExchangeId {
    /// Create a new random exchange id.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExchangeId {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s)
            .map(Self)
            .map_err(|e| TransportError::malformed_header(format!("invalid exchange id '{s}': {e}")))
    }
}

/// Channel the sender waits on for acknowledgments.
#[must_use]
pub fn sender_channel(root: &str, id: ExchangeId) -> String {
    format!("{root}:{id}.sender")
}

/// Channel chunks are delivered on.
#[must_use]
pub fn receiver_channel(root: &str, id: ExchangeId) -> String {
    format!("{root}:{id}.receiver")
}

/// Blackboard key a staged payload is stored under.
#[must_use]
pub fn payload_key(root: &str, id: ExchangeId) -> String {
    format!("{root}:{id}.payload")
}

/// First signal of every exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportHeader {
    pub id: ExchangeId,

    /// Number of payload chunks that follow. Absent when there is no payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<u32>,

    /// Payload was staged on the blackboard instead of chunked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staged: Option<bool>,

    /// Caller metadata, carried inline.
    pub header: Value,
}

/// Lenient wire form so a missing id is reported as such.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireHeader {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    chunk_count: Option<u32>,
    #[serde(default)]
    staged: Option<bool>,
    #[serde(default)]
    header: Value,
}

impl TransportHeader {
    /// Header for a new exchange with no payload.
    #[must_use]
    pub const fn new(id: ExchangeId, header: Value) -> Self {
        Self {
            id,
            chunk_count: None,
            staged: None,
            header,
        }
    }

    /// Declare how many chunks follow. Zero leaves the count unset.
    #[must_use]
    pub const fn with_chunk_count(mut self, count: u32) -> Self {
        self.chunk_count = if count > 0 { Some(count) } else { None };
        self
    }

    /// Mark the payload as staged on the blackboard.
    #[must_use]
    pub const fn with_staged_payload(mut self) -> Self {
        self.staged = Some(true);
        self
    }

    /// Chunks to expect, if any.
    #[must_use]
    pub fn expected_chunks(&self) -> Option<u32> {
        self.chunk_count.filter(|&count| count > 0)
    }

    #[must_use]
    pub fn is_staged(&self) -> bool {
        self.staged.unwrap_or(false)
    }

    /// Serialize for the wire.
    pub fn encode(&self) -> TransportResult<String> {
        serde_json::to_string(self).map_err(TransportError::serialization)
    }

    /// Parse a raw header signal.
    pub fn parse(raw: &str) -> TransportResult<Self> {
        let wire: WireHeader = serde_json::from_str(raw).map_err(TransportError::malformed_header)?;
        let id = match wire.id.as_deref() {
            None | Some("") => return Err(TransportError::MissingId),
            Some(id) => id.parse()?,
        };

        Ok(Self {
            id,
            chunk_count: wire.chunk_count,
            staged: wire.staged,
            header: wire.header,
        })
    }
}
