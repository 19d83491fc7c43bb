use crate::db::Store;
use async_trait::async_trait;
use tracing::warn;

/// Fire-and-forget sink for user-facing activity events.
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn record(&self, kind: &str, message: &str);
}

pub struct StoreActivitySink {
    store: Store,
}

impl StoreActivitySink {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ActivitySink for StoreActivitySink {
    async fn record(&self, kind: &str, message: &str) {
        if let Err(e) = self.store.add_activity(kind, message).await {
            warn!(kind = %kind, error = %e, "Failed to record activity");
        }
    }
}
