use crate::domain::{CatalogId, FeedId};
use crate::entities::{episode_records, prelude::*};
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

pub use crate::entities::episode_records::Model as EpisodeRecord;

/// Repository for episode availability records.
pub struct EpisodeRepository {
    conn: DatabaseConnection,
}

impl EpisodeRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(
        &self,
        catalog_id: CatalogId,
        feed_id: FeedId,
        torrent_url: &str,
    ) -> Result<bool> {
        let count = EpisodeRecords::find()
            .filter(episode_records::Column::BangumiId.eq(catalog_id.value()))
            .filter(episode_records::Column::FeedId.eq(feed_id.value()))
            .filter(episode_records::Column::TorrentUrl.eq(torrent_url))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }

    /// Inserts the record unless its dedup key already exists.
    ///
    /// Returns `false` when the unique index swallowed the insert.
    pub async fn insert(&self, record: &NewEpisodeRecord) -> Result<bool> {
        let active_model = episode_records::ActiveModel {
            bangumi_id: Set(record.catalog_id.value()),
            feed_id: Set(record.feed_id.value()),
            title: Set(record.title.clone()),
            episode: Set(record.episode),
            resolution: Set(record.resolution.clone()),
            release_group: Set(record.release_group.clone()),
            subtitle: Set(record.subtitle.clone()),
            source: Set(record.source.clone()),
            release_date: Set(record.release_date.clone()),
            torrent_url: Set(record.torrent_url.clone()),
            magnet_link: Set(record.magnet_link.clone()),
            homepage: Set(record.homepage.clone()),
            downloaded: Set(false),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let rows = EpisodeRecords::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    episode_records::Column::BangumiId,
                    episode_records::Column::FeedId,
                    episode_records::Column::TorrentUrl,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(rows > 0)
    }

    pub async fn list_for_catalog(&self, catalog_id: CatalogId) -> Result<Vec<EpisodeRecord>> {
        Ok(EpisodeRecords::find()
            .filter(episode_records::Column::BangumiId.eq(catalog_id.value()))
            .order_by_asc(episode_records::Column::Episode)
            .all(&self.conn)
            .await?)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(EpisodeRecords::find().count(&self.conn).await?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEpisodeRecord {
    pub catalog_id: CatalogId,
    pub feed_id: FeedId,
    pub title: String,
    pub episode: f64,
    pub resolution: Option<String>,
    pub release_group: Option<String>,
    pub subtitle: Option<String>,
    pub source: Option<String>,
    pub release_date: Option<String>,
    pub torrent_url: String,
    pub magnet_link: Option<String>,
    pub homepage: Option<String>,
}
