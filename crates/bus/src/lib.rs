//! Broadcast signalling primitives the RPC stack is built on.
//!
//! This crate provides the narrow channel every higher layer talks through:
//!
//! - **Signal bus**: fire a named signal carrying a short string payload;
//!   every subscriber whose namespace filter matches gets a copy
//! - **Channel names**: `namespace:local-name` strings, filtered by namespace
//! - **Blackboard**: a key/value store with time-boxed entries for staging
//!   payloads that do not fit in one signal
//!
//! The bus enforces a hard per-message limit (2048 characters by default) and
//! gives no delivery acknowledgment and no request/response correlation.
//!
//! # Example
//!
//! ```rust
//! use sigrpc_bus::{NamespaceFilter, SignalBus};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = SignalBus::new();
//! let mut sub = bus.subscribe(NamespaceFilter::namespace("game"));
//!
//! bus.emit("game:player.join", "Steve")?;
//! bus.emit("chat:message", "ignored")?;
//!
//! let notification = sub.recv().await?;
//! assert_eq!(notification.channel, "game:player.join");
//! assert_eq!(notification.payload, "Steve");
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod blackboard;
pub mod bus;
pub mod channel;
pub mod error;

pub use blackboard::{Blackboard, InMemoryBlackboard, stage_with_expiry};
pub use bus::{Notification, SignalBus, SignalBusBuilder, SignalSink, Subscription};
pub use channel::{
    MAX_MESSAGE_SIZE, NAMESPACE_SEPARATOR, NamespaceFilter, namespace_of, parse_channel,
};
pub use error::{BusError, BusResult};
