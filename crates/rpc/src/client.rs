//! Client call site.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use sigrpc_bus::{NamespaceFilter, SignalBus, Subscription};
use sigrpc_transport::{Transport, TransportError};
use tracing::debug;

use crate::config::RpcConfig;
use crate::envelope::{CallId, RequestEnvelope, ResponseEnvelope};
use crate::error::{RpcError, RpcResult};
use crate::naming::{input_channel, reply_channel, reply_namespace, validate_namespace};

/// Lifecycle of one call.
///
/// ```text
/// Idle -> AwaitingResponse -> Resolved
///                          -> Rejected  (error response, transport failure, timeout)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    AwaitingResponse,
    Resolved,
    Rejected,
}

impl CallState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }
}

/// Bookkeeping for one in-flight call.
///
/// Owns the reply subscription; settling the call drops it.
struct PendingCall {
    id: CallId,
    reply_namespace: String,
    reply_channel: String,
    state: CallState,
    replies: Option<Subscription>,
}

impl PendingCall {
    fn new(root: &str, namespace: &str, endpoint: &str) -> Self {
        let id = CallId::new();
        Self {
            id,
            reply_namespace: reply_namespace(root, namespace, id),
            reply_channel: reply_channel(root, namespace, id, endpoint),
            state: CallState::Idle,
            replies: None,
        }
    }

    fn begin(&mut self, bus: &SignalBus) {
        self.replies = Some(bus.subscribe(NamespaceFilter::namespace(self.reply_namespace.as_str())));
        self.state = CallState::AwaitingResponse;
    }

    async fn next_reply(&mut self) -> RpcResult<String> {
        let replies = self
            .replies
            .as_mut()
            .ok_or(RpcError::Transport(TransportError::Closed))?;
        Ok(replies.recv_on(&self.reply_channel).await?)
    }

    fn settle<T>(&mut self, outcome: &RpcResult<T>) {
        self.state = if outcome.is_ok() {
            CallState::Resolved
        } else {
            CallState::Rejected
        };
        if let Some(replies) = self.replies.take() {
            replies.unsubscribe();
        }
    }
}

/// Issues calls to servers on the same bus.
#[derive(Clone)]
pub struct Client {
    bus: Arc<SignalBus>,
    transport: Arc<dyn Transport>,
    config: Arc<RpcConfig>,
}

impl Client {
    #[must_use]
    pub fn new(bus: Arc<SignalBus>, transport: Arc<dyn Transport>, config: Arc<RpcConfig>) -> Self {
        Self {
            bus,
            transport,
            config,
        }
    }

    /// Call `endpoint` in `namespace` with the default timeout.
    pub async fn call(
        &self,
        namespace: &str,
        endpoint: &str,
        args: Option<Vec<Value>>,
    ) -> RpcResult<Option<Value>> {
        self.call_with_timeout(namespace, endpoint, args, self.config.default_timeout())
            .await
    }

    /// Call `endpoint` in `namespace`.
    ///
    /// Resolves with the return value, `None` when the endpoint returned
    /// nothing, or fails with the server's error message
    /// ([`RpcError::Remote`]) or [`RpcError::Timeout`] once `timeout` has
    /// elapsed without a response. A timed out call does not stop the remote
    /// handler; its late response is dropped.
    pub async fn call_with_timeout(
        &self,
        namespace: &str,
        endpoint: &str,
        args: Option<Vec<Value>>,
        timeout: Duration,
    ) -> RpcResult<Option<Value>> {
        validate_namespace(&self.config, namespace)?;

        let mut call = PendingCall::new(&self.config.root, namespace, endpoint);
        debug!(call_id = %call.id, namespace, endpoint, ?timeout, "Calling endpoint");

        let outcome = match tokio::time::timeout(
            timeout,
            self.run(&mut call, namespace, endpoint, args, timeout),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(RpcError::timeout(endpoint, namespace, timeout)),
        };

        call.settle(&outcome);
        debug!(call_id = %call.id, state = ?call.state, "Call settled");
        outcome
    }

    async fn run(
        &self,
        call: &mut PendingCall,
        namespace: &str,
        endpoint: &str,
        args: Option<Vec<Value>>,
        timeout: Duration,
    ) -> RpcResult<Option<Value>> {
        call.begin(&self.bus);

        let request = RequestEnvelope::new(call.id, endpoint, args.is_some(), timeout);
        let header = serde_json::to_value(&request).map_err(RpcError::malformed_envelope)?;
        let payload = args.map(Value::Array);

        self.transport
            .send(
                &input_channel(&self.config.root, namespace),
                header,
                payload.as_ref(),
                timeout,
            )
            .await?;

        let raw = call.next_reply().await?;
        let received = self.transport.receive(&raw).await?;
        let response: ResponseEnvelope =
            serde_json::from_value(received.header).map_err(RpcError::malformed_envelope)?;

        if response.is_error {
            return Err(RpcError::remote(error_message(received.payload)));
        }
        if response.has_return {
            Ok(received.payload)
        } else {
            Ok(None)
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("root", &self.config.root)
            .finish_non_exhaustive()
    }
}

fn error_message(payload: Option<Value>) -> String {
    match payload {
        Some(Value::String(message)) => message,
        Some(other) => other.to_string(),
        None => "remote call failed".to_string(),
    }
}
