use crate::domain::{CatalogId, FeedId};
use crate::models::{FeedSource, GlobalFilterSettings};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use crate::entities::activities::Model as Activity;
pub use repositories::catalog::{CatalogEntry, CatalogRequest, CatalogUpsert, PosterRef};
pub use repositories::episode::{EpisodeRecord, NewEpisodeRecord};
pub use repositories::feed::NewFeedSource;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn feed_repo(&self) -> repositories::feed::FeedRepository {
        repositories::feed::FeedRepository::new(self.conn.clone())
    }

    fn settings_repo(&self) -> repositories::settings::SettingsRepository {
        repositories::settings::SettingsRepository::new(self.conn.clone())
    }

    fn catalog_repo(&self) -> repositories::catalog::CatalogRepository {
        repositories::catalog::CatalogRepository::new(self.conn.clone())
    }

    fn episode_repo(&self) -> repositories::episode::EpisodeRepository {
        repositories::episode::EpisodeRepository::new(self.conn.clone())
    }

    fn activity_repo(&self) -> repositories::activity::ActivityRepository {
        repositories::activity::ActivityRepository::new(self.conn.clone())
    }

    pub async fn add_feed_source(&self, feed: &NewFeedSource) -> Result<FeedId> {
        self.feed_repo().add(feed).await
    }

    pub async fn get_feed_source(&self, id: FeedId) -> Result<Option<FeedSource>> {
        self.feed_repo().get(id).await
    }

    pub async fn list_feed_sources(&self) -> Result<Vec<FeedSource>> {
        self.feed_repo().list().await
    }

    pub async fn mark_feed_updated(&self, id: FeedId, at: DateTime<Utc>) -> Result<()> {
        self.feed_repo().mark_updated(id, at).await
    }

    pub async fn remove_feed_source(&self, id: FeedId) -> Result<bool> {
        self.feed_repo().remove(id).await
    }

    pub async fn get_global_settings(&self) -> Result<GlobalFilterSettings> {
        self.settings_repo().get_or_create().await
    }

    pub async fn update_global_settings(
        &self,
        include: &str,
        exclude: &str,
        blacklist: &str,
    ) -> Result<()> {
        self.settings_repo()
            .update(include, exclude, blacklist)
            .await
    }

    pub async fn get_catalog_entry(&self, id: CatalogId) -> Result<Option<CatalogEntry>> {
        self.catalog_repo().get(id).await
    }

    pub async fn find_catalog_entry(
        &self,
        official_title: &str,
        season: i32,
    ) -> Result<Option<CatalogEntry>> {
        self.catalog_repo()
            .find_by_title_season(official_title, season)
            .await
    }

    pub async fn find_catalog_entry_by_poster_hash(
        &self,
        hash: &str,
        exclude: CatalogId,
    ) -> Result<Option<CatalogEntry>> {
        self.catalog_repo()
            .find_other_by_poster_hash(hash, exclude)
            .await
    }

    pub async fn list_catalog_entries(&self) -> Result<Vec<CatalogEntry>> {
        self.catalog_repo().list().await
    }

    pub async fn upsert_catalog_entry(&self, request: &CatalogRequest) -> Result<CatalogUpsert> {
        self.catalog_repo().upsert(request).await
    }

    pub async fn episode_exists(
        &self,
        catalog_id: CatalogId,
        feed_id: FeedId,
        torrent_url: &str,
    ) -> Result<bool> {
        self.episode_repo()
            .exists(catalog_id, feed_id, torrent_url)
            .await
    }

    pub async fn insert_episode(&self, record: &NewEpisodeRecord) -> Result<bool> {
        self.episode_repo().insert(record).await
    }

    pub async fn episodes_for_catalog(&self, catalog_id: CatalogId) -> Result<Vec<EpisodeRecord>> {
        self.episode_repo().list_for_catalog(catalog_id).await
    }

    pub async fn episode_count(&self) -> Result<u64> {
        self.episode_repo().count().await
    }

    pub async fn add_activity(&self, kind: &str, content: &str) -> Result<()> {
        self.activity_repo().add(kind, content).await
    }

    pub async fn recent_activities(&self, limit: u64) -> Result<Vec<Activity>> {
        self.activity_repo().recent(limit).await
    }
}
