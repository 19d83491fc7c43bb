use crate::domain::FeedId;
use crate::entities::{feed_sources, prelude::*};
use crate::models::feed::{FeedSource, split_keywords};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

/// Repository for feed source operations
pub struct FeedRepository {
    conn: DatabaseConnection,
}

impl FeedRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: feed_sources::Model) -> FeedSource {
        FeedSource {
            id: FeedId::new(m.id),
            name: m.name,
            url: m.url,
            parser_kind: m.parser_kind,
            update_interval_hours: m.update_interval_hours,
            include_keywords: split_keywords(&m.include_keywords),
            exclude_keywords: split_keywords(&m.exclude_keywords),
            priority: m.priority,
            page_start: m.page_start,
            page_end: m.page_end,
            last_updated: m
                .last_updated
                .as_deref()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .map(|ts| ts.with_timezone(&Utc)),
        }
    }

    pub async fn add(&self, feed: &NewFeedSource) -> Result<FeedId> {
        let active_model = feed_sources::ActiveModel {
            name: Set(feed.name.clone()),
            url: Set(feed.url.clone()),
            parser_kind: Set(feed.parser_kind.clone()),
            update_interval_hours: Set(feed.update_interval_hours),
            include_keywords: Set(feed.include_keywords.clone()),
            exclude_keywords: Set(feed.exclude_keywords.clone()),
            priority: Set(feed.priority),
            page_start: Set(feed.page_start),
            page_end: Set(feed.page_end),
            last_updated: Set(None),
            created_at: Set(Some(Utc::now().to_rfc3339())),
            ..Default::default()
        };

        let res = FeedSources::insert(active_model).exec(&self.conn).await?;
        info!("Added feed source {}: {}", feed.name, feed.url);
        Ok(FeedId::new(res.last_insert_id))
    }

    pub async fn get(&self, id: FeedId) -> Result<Option<FeedSource>> {
        let row = FeedSources::find_by_id(id.value()).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    /// All sources, highest priority first.
    pub async fn list(&self) -> Result<Vec<FeedSource>> {
        let rows = FeedSources::find()
            .order_by_desc(feed_sources::Column::Priority)
            .order_by_asc(feed_sources::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn mark_updated(&self, id: FeedId, at: DateTime<Utc>) -> Result<()> {
        FeedSources::update_many()
            .col_expr(
                feed_sources::Column::LastUpdated,
                sea_orm::sea_query::Expr::value(at.to_rfc3339()),
            )
            .filter(feed_sources::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn remove(&self, id: FeedId) -> Result<bool> {
        let result = FeedSources::delete_by_id(id.value())
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[derive(Debug, Clone)]
pub struct NewFeedSource {
    pub name: String,
    pub url: String,
    pub parser_kind: String,
    pub update_interval_hours: i32,
    /// Comma-separated.
    pub include_keywords: String,
    /// Comma-separated.
    pub exclude_keywords: String,
    pub priority: i32,
    pub page_start: Option<i32>,
    pub page_end: Option<i32>,
}

impl NewFeedSource {
    #[must_use]
    pub fn tracker(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            parser_kind: crate::models::ParserKind::Tracker.as_str().to_string(),
            update_interval_hours: 1,
            include_keywords: String::new(),
            exclude_keywords: String::new(),
            priority: 0,
            page_start: None,
            page_end: None,
        }
    }
}
