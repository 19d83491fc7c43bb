use crate::db::Store;
use crate::models::GlobalFilterSettings;
use async_trait::async_trait;

/// Source of the process-wide filter lists. Read once per scan.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn snapshot(&self) -> anyhow::Result<GlobalFilterSettings>;
}

pub struct StoreSettingsProvider {
    store: Store,
}

impl StoreSettingsProvider {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SettingsProvider for StoreSettingsProvider {
    async fn snapshot(&self) -> anyhow::Result<GlobalFilterSettings> {
        self.store.get_global_settings().await
    }
}

/// Fixed settings, handy for one-off runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub GlobalFilterSettings);

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn snapshot(&self) -> anyhow::Result<GlobalFilterSettings> {
        Ok(self.0.clone())
    }
}
