//! Shared key/value blackboard with time-boxed entries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::BusResult;

/// Trait for blackboard backends.
#[async_trait]
pub trait Blackboard: Send + Sync {
    /// Store a value, replacing any previous one.
    async fn put(&self, key: &str, value: String) -> BusResult<()>;

    /// Read a value.
    async fn get(&self, key: &str) -> BusResult<Option<String>>;

    /// Remove a value. Returns whether it was present.
    async fn delete(&self, key: &str) -> BusResult<bool>;

    /// Number of stored entries.
    async fn len(&self) -> BusResult<usize>;
}

/// In-memory blackboard.
#[derive(Default)]
pub struct InMemoryBlackboard {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryBlackboard {
    /// Create a new in-memory blackboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new in-memory blackboard wrapped in an Arc.
    #[must_use]
    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl Blackboard for InMemoryBlackboard {
    async fn put(&self, key: &str, value: String) -> BusResult<()> {
        self.entries.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> BusResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> BusResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn len(&self) -> BusResult<usize> {
        Ok(self.entries.read().await.len())
    }
}

/// Write `value` under `key` and delete it once `ttl` has elapsed.
///
/// The entry is removed whether or not anyone read it. The returned handle
/// completes after the deletion; dropping it does not cancel the expiry.
/// Must be called from within a tokio runtime.
pub async fn stage_with_expiry(
    board: Arc<dyn Blackboard>,
    key: String,
    value: String,
    ttl: Duration,
) -> BusResult<JoinHandle<()>> {
    board.put(&key, value).await?;
    debug!(key = %key, ttl_ms = ttl.as_millis(), "Staged blackboard entry");

    Ok(tokio::spawn(async move {
        tokio::time::sleep(ttl).await;
        match board.delete(&key).await {
            Ok(true) => debug!(key = %key, "Expired blackboard entry"),
            Ok(false) => {}
            Err(e) => debug!(key = %key, error = %e, "Failed to expire blackboard entry"),
        }
    }))
}
