//! Payload chunking and reassembly.
//!
//! A serialized payload larger than one signal is split on character
//! boundaries. Each chunk travels with a one-character `-` prefix so the host
//! never mistakes a chunk that happens to look like JSON for structured data;
//! the receiver strips it before concatenating.
//!
//! ```text
//! payload:  {"items":[1,2,3,...]}
//! signal 1: -{"items":[1,2,
//! signal 2: -3,...]}
//! ```
//!
//! Reassembly is positional: chunks are concatenated in arrival order, which
//! relies on the bus delivering a single sender's signals in order.

/// Prefix carried by every chunk signal.
pub const CHUNK_PADDING: char = '-';

/// Split `data` into chunks of at most `max_chars` characters.
///
/// Never splits inside a UTF-8 sequence. Empty input yields no chunks.
#[must_use]
pub fn chunk_payload(data: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::with_capacity(data.len() / max_chars + 1);
    let mut rest = data;

    while !rest.is_empty() {
        let split = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(index, _)| index);
        let (chunk, tail) = rest.split_at(split);
        chunks.push(chunk);
        rest = tail;
    }

    chunks
}

/// Prefix a chunk for the wire.
#[must_use]
pub fn pad_chunk(chunk: &str) -> String {
    let mut padded = String::with_capacity(chunk.len() + CHUNK_PADDING.len_utf8());
    padded.push(CHUNK_PADDING);
    padded.push_str(chunk);
    padded
}

/// Collects padded chunks until the declared count has arrived.
#[derive(Debug)]
pub struct ChunkAccumulator {
    expected: u32,
    received: u32,
    buffer: String,
}

impl ChunkAccumulator {
    #[must_use]
    pub const fn new(expected: u32) -> Self {
        Self {
            expected,
            received: 0,
            buffer: String::new(),
        }
    }

    /// Feed one padded chunk.
    ///
    /// Returns `Some(payload)` once the final chunk has arrived.
    pub fn push(&mut self, padded: &str) -> Option<String> {
        let mut chars = padded.chars();
        chars.next();
        self.buffer.push_str(chars.as_str());
        self.received += 1;

        (self.received >= self.expected).then(|| std::mem::take(&mut self.buffer))
    }
}
