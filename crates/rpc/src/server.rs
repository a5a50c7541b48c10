//! Server registry and request dispatch.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use sigrpc_bus::{NamespaceFilter, SignalBus, Subscription};
use sigrpc_schema::{validate, validate_array};
use sigrpc_transport::Transport;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RpcConfig;
use crate::endpoint::Endpoint;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::error::{RpcError, RpcResult};
use crate::naming::{input_channel, reply_channel, server_namespace, stop_channel};

/// A namespace and the endpoints served in it.
#[derive(Debug, Clone, Default)]
pub struct Server {
    namespace: String,
    endpoints: HashMap<String, Endpoint>,
}

impl Server {
    /// Server with no endpoints.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            endpoints: HashMap::new(),
        }
    }

    /// Add or replace an endpoint.
    #[must_use]
    pub fn endpoint(mut self, name: impl Into<String>, endpoint: Endpoint) -> Self {
        self.endpoints.insert(name.into(), endpoint);
        self
    }

    /// Add every endpoint from a map.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: HashMap<String, Endpoint>) -> Self {
        self.endpoints.extend(endpoints);
        self
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Names of the registered endpoints, sorted.
    #[must_use]
    pub fn endpoint_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.endpoints.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run one call against this server's endpoints.
    ///
    /// `Ok` carries the handler's return value ("no value" is `None`), `Err`
    /// the message to send back as an error response. The handler is not
    /// invoked when the arguments fail validation.
    pub async fn dispatch(&self, name: &str, arguments: Option<Value>) -> Result<Option<Value>, String> {
        let Some(endpoint) = self.endpoints.get(name) else {
            return Err(format!("Endpoint {name} not found"));
        };

        let args = match arguments {
            None => Vec::new(),
            Some(Value::Array(args)) => args,
            Some(_) => return Err(format!("Invalid arguments for {name}: expected an array")),
        };

        if let Some(schemas) = &endpoint.schema().arguments {
            validate_array(schemas, &args)
                .map_err(|e| format!("Failed schema validation for arguments: {e}"))?;
        }

        let result = AssertUnwindSafe(async { endpoint.invoke(args).await })
            .catch_unwind()
            .await
            .map_err(|_| format!("Endpoint {name} panicked"))?
            .map_err(|e| format!("{e:#}"))?;

        if let Some(schema) = &endpoint.schema().return_value {
            validate(schema, result.as_ref())
                .map_err(|e| format!("Failed schema validation for return value: {e}"))?;
        }

        Ok(result)
    }
}

/// Everything a running server's tasks share.
struct ServerContext {
    server: Server,
    transport: Arc<dyn Transport>,
    config: Arc<RpcConfig>,
}

/// Handle to a running server.
///
/// Dropping the handle leaves the server running; stop it with
/// [`ServerHandle::stop`] or a stop signal from anywhere on the bus.
#[derive(Debug)]
pub struct ServerHandle {
    namespace: String,
    stop_channel: String,
    bus: Arc<SignalBus>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Broadcast the stop signal for this server's namespace.
    pub fn stop(&self) -> RpcResult<()> {
        self.bus.emit(&self.stop_channel, "")?;
        Ok(())
    }

    /// Whether the dispatch loop has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the dispatch loop to end.
    pub async fn stopped(self) {
        if let Err(e) = self.task.await {
            warn!(namespace = %self.namespace, error = %e, "Server task ended abnormally");
        }
    }
}

/// Broadcast the stop signal for `namespace`.
pub fn stop_server(bus: &SignalBus, config: &RpcConfig, namespace: &str) -> RpcResult<()> {
    bus.emit(&stop_channel(&config.root, namespace), "")?;
    Ok(())
}

/// Subscribe to the server namespace and spawn the dispatch loop.
///
/// The subscription exists before this returns, so requests sent right after
/// registration are not missed.
pub(crate) fn spawn_server(
    server: Server,
    bus: Arc<SignalBus>,
    transport: Arc<dyn Transport>,
    config: Arc<RpcConfig>,
) -> RpcResult<ServerHandle> {
    crate::naming::validate_namespace(&config, server.namespace())?;
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| RpcError::NoRuntime)?;

    let namespace = server.namespace().to_owned();
    let events = bus.subscribe(NamespaceFilter::namespace(server_namespace(
        &config.root,
        &namespace,
    )));
    info!(
        namespace = %namespace,
        endpoints = ?server.endpoint_names(),
        "Server started"
    );

    let context = Arc::new(ServerContext {
        server,
        transport,
        config: Arc::clone(&config),
    });
    let task = runtime.spawn(serve(context, events));

    Ok(ServerHandle {
        stop_channel: stop_channel(&config.root, &namespace),
        namespace,
        bus,
        task,
    })
}

async fn serve(context: Arc<ServerContext>, mut events: Subscription) {
    let root = &context.config.root;
    let namespace = context.server.namespace();
    let stop = stop_channel(root, namespace);
    let input = input_channel(root, namespace);

    loop {
        let notification = match events.recv().await {
            Ok(notification) => notification,
            Err(e) => {
                warn!(namespace, error = %e, "Server subscription closed");
                break;
            }
        };

        if notification.channel == stop {
            break;
        }
        if notification.channel == input {
            tokio::spawn(handle_request(Arc::clone(&context), notification.payload));
        }
    }

    events.unsubscribe();
    info!(namespace, "Server stopped");
}

async fn handle_request(context: Arc<ServerContext>, raw_header: String) {
    let namespace = context.server.namespace();
    let config = &context.config;

    let received = match tokio::time::timeout(
        config.receive_timeout(),
        context.transport.receive(&raw_header),
    )
    .await
    {
        Ok(Ok(received)) => received,
        Ok(Err(e)) => {
            warn!(namespace, error = %e, "Failed to receive request");
            return;
        }
        Err(_) => {
            warn!(namespace, "Timed out receiving request");
            return;
        }
    };

    let request: RequestEnvelope = match serde_json::from_value(received.header) {
        Ok(request) => request,
        Err(e) => {
            warn!(namespace, error = %e, "Unknown data received");
            return;
        }
    };
    debug!(namespace, call_id = %request.id, endpoint = %request.endpoint, "Dispatching call");

    let (response, payload) = match context.server.dispatch(&request.endpoint, received.payload).await {
        Ok(value) => (ResponseEnvelope::success(&request, value.is_some()), value),
        Err(message) => {
            debug!(namespace, call_id = %request.id, error = %message, "Call failed");
            (ResponseEnvelope::error(&request), Some(Value::String(message)))
        }
    };

    let header = match serde_json::to_value(&response) {
        Ok(header) => header,
        Err(e) => {
            warn!(namespace, call_id = %request.id, error = %e, "Failed to encode response");
            return;
        }
    };

    let reply = reply_channel(&config.root, namespace, request.id, &request.endpoint);
    let deadline = request
        .timeout_duration()
        .unwrap_or_else(|| config.default_timeout());

    match tokio::time::timeout(
        deadline,
        context.transport.send(&reply, header, payload.as_ref(), deadline),
    )
    .await
    {
        Ok(Ok(())) => debug!(namespace, call_id = %request.id, "Response sent"),
        Ok(Err(e)) => warn!(namespace, call_id = %request.id, error = %e, "Failed to send response"),
        Err(_) => debug!(namespace, call_id = %request.id, "Caller stopped listening for response"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;
    use serde_json::json;
    use sigrpc_schema::{SchemaEntry, SchemaType};

    use super::*;

    #[tokio::test]
    async fn should_report_unknown_endpoint() {
        let server = Server::new("game");
        assert_eq!(
            server.dispatch("stuff", None).await,
            Err("Endpoint stuff not found".to_owned())
        );
    }

    #[tokio::test]
    async fn should_pass_positional_arguments() {
        let server = Server::new("game").endpoint(
            "sum",
            Endpoint::sync(|args| Ok(Some(json!(args.iter().filter_map(Value::as_f64).sum::<f64>())))),
        );

        assert_eq!(
            server.dispatch("sum", Some(json!([1, 2, 3.5]))).await,
            Ok(Some(json!(6.5)))
        );
        assert_eq!(server.dispatch("sum", None).await, Ok(Some(json!(0.0))));
    }

    #[tokio::test]
    async fn should_not_invoke_handler_after_argument_validation_fails() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let server = Server::new("game").endpoint(
            "stuff",
            Endpoint::sync(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .with_arguments([SchemaEntry::number(), SchemaEntry::string()]),
        );

        let err = server
            .dispatch("stuff", Some(json!(["foo", 3])))
            .await
            .unwrap_err();

        assert!(err.starts_with("Failed schema validation for arguments:"));
        assert!(err.contains("not a number"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_reject_non_array_arguments() {
        let server = Server::new("game").endpoint("stuff", Endpoint::sync(|_| Ok(None)));
        let err = server.dispatch("stuff", Some(json!({ "a": 1 }))).await.unwrap_err();
        assert!(err.contains("expected an array"));
    }

    #[tokio::test]
    async fn should_report_handler_error_chain() {
        let server = Server::new("game").endpoint(
            "fail",
            Endpoint::sync(|_| Err(anyhow!("disk full").context("saving world"))),
        );

        assert_eq!(
            server.dispatch("fail", None).await,
            Err("saving world: disk full".to_owned())
        );
    }

    #[tokio::test]
    async fn should_contain_handler_panic() {
        let server = Server::new("game").endpoint(
            "boom",
            Endpoint::sync(|_| panic!("handler exploded")),
        );

        assert_eq!(
            server.dispatch("boom", None).await,
            Err("Endpoint boom panicked".to_owned())
        );
    }

    #[tokio::test]
    async fn should_validate_return_value() {
        let server = Server::new("game")
            .endpoint(
                "bad",
                Endpoint::sync(|_| Ok(Some(json!("yes")))).with_return_value(SchemaType::Bool),
            )
            .endpoint(
                "good",
                Endpoint::sync(|_| Ok(Some(json!(false)))).with_return_value(SchemaType::Bool),
            );

        let err = server.dispatch("bad", None).await.unwrap_err();
        assert_eq!(
            err,
            "Failed schema validation for return value: Invalid schema, not a bool"
        );
        assert_eq!(server.dispatch("good", None).await, Ok(Some(json!(false))));
    }

    #[tokio::test]
    async fn should_distinguish_no_value_from_null() {
        let server = Server::new("game")
            .endpoint("nothing", Endpoint::sync(|_| Ok(None)))
            .endpoint("null", Endpoint::sync(|_| Ok(Some(Value::Null))));

        assert_eq!(server.dispatch("nothing", None).await, Ok(None));
        assert_eq!(server.dispatch("null", None).await, Ok(Some(Value::Null)));
    }

    #[test]
    fn should_copy_endpoints_on_registration() {
        let mut endpoints = HashMap::new();
        endpoints.insert("a".to_owned(), Endpoint::sync(|_| Ok(None)));
        let server = Server::new("game").with_endpoints(endpoints.clone());

        endpoints.insert("b".to_owned(), Endpoint::sync(|_| Ok(None)));

        assert_eq!(server.endpoint_names(), vec!["a"]);
    }

    #[test]
    fn should_require_runtime_to_start() {
        let bus = Arc::new(SignalBus::new());
        let config = Arc::new(RpcConfig::default());
        let transport =
            sigrpc_transport::build_transport(Arc::clone(&bus), config.transport.clone(), None);

        let err = spawn_server(Server::new("game"), bus, transport, config).unwrap_err();
        assert_eq!(err, RpcError::NoRuntime);
    }
}
