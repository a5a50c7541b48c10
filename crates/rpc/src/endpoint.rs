//! Endpoints and their schemas.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sigrpc_schema::SchemaEntry;

/// What an endpoint handler eventually produces: a value, "no value", or a
/// failure whose message is sent back to the caller.
pub type HandlerResult = anyhow::Result<Option<Value>>;

/// Type-erased endpoint handler taking positional arguments.
pub type Handler = Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Optional boundary checks for an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSchema {
    /// Positional argument schemas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<SchemaEntry>>,

    /// Return value schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<SchemaEntry>,
}

/// A named operation a server exposes.
#[derive(Clone)]
pub struct Endpoint {
    handler: Handler,
    schema: EndpointSchema,
}

impl Endpoint {
    /// Endpoint with an async handler.
    ///
    /// ```rust
    /// use serde_json::{json, Value};
    /// use sigrpc_rpc::Endpoint;
    ///
    /// let greet = Endpoint::new(|args: Vec<Value>| async move {
    ///     let name = args.first().and_then(Value::as_str).unwrap_or("stranger");
    ///     Ok(Some(json!(format!("hello {name}"))))
    /// });
    /// ```
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |args: Vec<Value>| -> BoxFuture<'static, HandlerResult> {
                Box::pin(handler(args))
            }),
            schema: EndpointSchema::default(),
        }
    }

    /// Endpoint with a synchronous handler.
    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(move |args| std::future::ready(handler(args)))
    }

    /// Require positional arguments to match these schemas.
    #[must_use]
    pub fn with_arguments(mut self, arguments: impl IntoIterator<Item = SchemaEntry>) -> Self {
        self.schema.arguments = Some(arguments.into_iter().collect());
        self
    }

    /// Require the return value to match this schema.
    #[must_use]
    pub fn with_return_value(mut self, schema: impl Into<SchemaEntry>) -> Self {
        self.schema.return_value = Some(schema.into());
        self
    }

    #[must_use]
    pub const fn schema(&self) -> &EndpointSchema {
        &self.schema
    }

    /// Run the handler.
    pub fn invoke(&self, args: Vec<Value>) -> BoxFuture<'static, HandlerResult> {
        (self.handler)(args)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;
    use sigrpc_schema::SchemaType;

    use super::*;

    #[tokio::test]
    async fn should_invoke_async_handler() {
        let endpoint = Endpoint::new(|args: Vec<Value>| async move { Ok(Some(json!(args.len()))) });
        assert_eq!(endpoint.invoke(vec![json!(1), json!(2)]).await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn should_invoke_sync_handler() {
        let endpoint = Endpoint::sync(|_| Ok(None));
        assert_eq!(endpoint.invoke(Vec::new()).await.unwrap(), None);
    }

    #[test]
    fn should_collect_schemas() {
        let endpoint = Endpoint::sync(|_| Ok(None))
            .with_arguments([SchemaEntry::number(), SchemaEntry::string()])
            .with_return_value(SchemaType::Bool);

        assert_eq!(endpoint.schema().arguments.as_ref().map(Vec::len), Some(2));
        assert_eq!(endpoint.schema().return_value, Some(SchemaEntry::bool()));
    }

    #[test]
    fn should_load_schema_from_json() {
        let schema: EndpointSchema = serde_json::from_value(json!({
            "arguments": ["NUMBER", { "type": "STRING", "isOptional": true }],
            "returnValue": "ANY"
        }))
        .unwrap();

        assert_eq!(schema.arguments.map(|args| args.len()), Some(2));
        assert_eq!(schema.return_value, Some(SchemaEntry::any()));
    }
}
