// # Memory Store
//
// In-memory implementation of LastKnownStore.
//
// ## Crash Behavior
//
// - The value is lost on restart
// - The first cycle after a restart treats the IP as changed and re-upserts,
//   which is harmless because upserts are idempotent
//
// ## When to Use
//
// - Testing environments
// - Container deployments where an extra upsert per restart is acceptable

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::cancel::run_cancellable;
use crate::error::Result;
use crate::traits::LastKnownStore;

/// In-memory store for one record target
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<String>>,
}

impl MemoryStore {
    /// Create an empty store (reads as "no prior value")
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `ip`
    pub fn with_value(ip: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ip.into())),
        }
    }

    /// Current value without going through the trait
    pub async fn value(&self) -> String {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl LastKnownStore for MemoryStore {
    async fn read(&self, cancel: &CancellationToken) -> Result<String> {
        run_cancellable(cancel, async { Ok(self.inner.read().await.clone()) }).await
    }

    async fn write(&self, cancel: &CancellationToken, ip: &str) -> Result<()> {
        run_cancellable(cancel, async {
            *self.inner.write().await = ip.to_string();
            Ok(())
        })
        .await
    }
}
