//! Remote procedure calls over a size-limited broadcast bus.
//!
//! This crate correlates calls and responses on top of a
//! [`sigrpc_transport::Transport`]:
//!
//! - **Server registry**: named endpoints with optional argument and return
//!   schemas, served in a namespace until a stop signal arrives
//! - **Client**: one private reply channel per call, a timeout, and explicit
//!   settlement on every exit path
//! - **Envelopes**: request/response metadata carried as transport headers
//!
//! Server-side failures (unknown endpoint, schema mismatch, handler error or
//! panic) always come back to the caller as [`RpcError::Remote`]; they never
//! take the server down.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use sigrpc_bus::SignalBus;
//! use sigrpc_rpc::{Endpoint, RpcConfig, RpcRuntime, Server};
//! use sigrpc_schema::SchemaEntry;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = RpcRuntime::new(Arc::new(SignalBus::new()), RpcConfig::default())?;
//!
//! let server = Server::new("math").endpoint(
//!     "double",
//!     Endpoint::sync(|args| Ok(args.first().and_then(|v| v.as_f64()).map(|n| json!(n * 2.0))))
//!         .with_arguments([SchemaEntry::number()]),
//! );
//! let handle = runtime.start_server(server)?;
//!
//! let value = runtime.client().call("math", "double", Some(vec![json!(21)])).await?;
//! assert_eq!(value, Some(json!(42.0)));
//!
//! handle.stop()?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod client;
pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod naming;
pub mod runtime;
pub mod server;

pub use client::{CallState, Client};
pub use config::RpcConfig;
pub use endpoint::{Endpoint, EndpointSchema, Handler, HandlerResult};
pub use envelope::{CallId, RequestEnvelope, ResponseEnvelope};
pub use error::{RpcError, RpcResult};
pub use runtime::RpcRuntime;
pub use server::{Server, ServerHandle, stop_server};
