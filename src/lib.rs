#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # sigrpc
//!
//! Remote procedure calls over a size-limited, one-way broadcast channel.
//!
//! This library re-exports the workspace crates for convenience.

pub use sigrpc_bus as bus;
pub use sigrpc_rpc as rpc;
pub use sigrpc_schema as schema;
pub use sigrpc_transport as transport;

pub mod cli;
pub mod commands;
