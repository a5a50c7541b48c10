//! Wiring of bus, transport and configuration for one node.

use std::sync::Arc;

use sigrpc_bus::{Blackboard, SignalBus};
use sigrpc_transport::{Transport, build_transport};

use crate::client::Client;
use crate::config::RpcConfig;
use crate::error::{RpcError, RpcResult};
use crate::server::{Server, ServerHandle, spawn_server, stop_server};

/// Shared handles every client and server on one node uses.
///
/// Cheap to clone; all clones talk over the same bus and transport.
#[derive(Clone)]
pub struct RpcRuntime {
    bus: Arc<SignalBus>,
    transport: Arc<dyn Transport>,
    config: Arc<RpcConfig>,
}

impl RpcRuntime {
    /// Runtime using the transport strategy named in `config`.
    pub fn new(bus: Arc<SignalBus>, config: RpcConfig) -> RpcResult<Self> {
        validate_for_bus(&config, &bus)?;
        let transport = build_transport(Arc::clone(&bus), config.transport.clone(), None);
        Ok(Self {
            bus,
            transport,
            config: Arc::new(config),
        })
    }

    /// Runtime whose blackboard strategy stages payloads on `board`.
    pub fn with_blackboard(
        bus: Arc<SignalBus>,
        config: RpcConfig,
        board: Arc<dyn Blackboard>,
    ) -> RpcResult<Self> {
        validate_for_bus(&config, &bus)?;
        let transport = build_transport(Arc::clone(&bus), config.transport.clone(), Some(board));
        Ok(Self {
            bus,
            transport,
            config: Arc::new(config),
        })
    }

    /// Runtime with a caller-supplied transport.
    pub fn with_transport(
        bus: Arc<SignalBus>,
        transport: Arc<dyn Transport>,
        config: RpcConfig,
    ) -> RpcResult<Self> {
        validate_for_bus(&config, &bus)?;
        Ok(Self {
            bus,
            transport,
            config: Arc::new(config),
        })
    }

    #[must_use]
    pub fn client(&self) -> Client {
        Client::new(
            Arc::clone(&self.bus),
            Arc::clone(&self.transport),
            Arc::clone(&self.config),
        )
    }

    /// Register `server` and start serving its namespace.
    ///
    /// Fails synchronously, before subscribing, when the namespace contains
    /// `:`. Must be called from within a tokio runtime.
    pub fn start_server(&self, server: Server) -> RpcResult<ServerHandle> {
        spawn_server(
            server,
            Arc::clone(&self.bus),
            Arc::clone(&self.transport),
            Arc::clone(&self.config),
        )
    }

    /// Broadcast the stop signal for `namespace`.
    pub fn stop_server(&self, namespace: &str) -> RpcResult<()> {
        stop_server(&self.bus, &self.config, namespace)
    }

    #[must_use]
    pub const fn bus(&self) -> &Arc<SignalBus> {
        &self.bus
    }

    #[must_use]
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }
}

/// Validate `config` and check it fits the limit `bus` enforces.
fn validate_for_bus(config: &RpcConfig, bus: &SignalBus) -> RpcResult<()> {
    config.validate()?;

    let configured = config.transport.max_message_size;
    let enforced = bus.max_message_size();
    if configured > enforced {
        return Err(RpcError::config(format!(
            "transport.max_message_size ({configured}) exceeds the bus limit ({enforced})"
        )));
    }
    Ok(())
}

impl std::fmt::Debug for RpcRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcRuntime")
            .field("bus", &self.bus)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
