use crate::domain::CatalogId;
use crate::entities::{bangumi, prelude::*};
use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

pub use crate::entities::bangumi::Model as CatalogEntry;

/// Repository for catalog entries.
pub struct CatalogRepository {
    conn: DatabaseConnection,
}

impl CatalogRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: CatalogId) -> Result<Option<CatalogEntry>> {
        Ok(Bangumi::find_by_id(id.value()).one(&self.conn).await?)
    }

    pub async fn find_by_title_season(
        &self,
        official_title: &str,
        season: i32,
    ) -> Result<Option<CatalogEntry>> {
        Ok(Bangumi::find()
            .filter(bangumi::Column::OfficialTitle.eq(official_title))
            .filter(bangumi::Column::Season.eq(season))
            .one(&self.conn)
            .await?)
    }

    /// Another entry carrying the same poster content hash, if any.
    pub async fn find_other_by_poster_hash(
        &self,
        hash: &str,
        exclude: CatalogId,
    ) -> Result<Option<CatalogEntry>> {
        Ok(Bangumi::find()
            .filter(bangumi::Column::PosterHash.eq(hash))
            .filter(bangumi::Column::Id.ne(exclude.value()))
            .one(&self.conn)
            .await?)
    }

    pub async fn list(&self) -> Result<Vec<CatalogEntry>> {
        Ok(Bangumi::find()
            .order_by_asc(bangumi::Column::OfficialTitle)
            .order_by_asc(bangumi::Column::Season)
            .all(&self.conn)
            .await?)
    }

    /// Finds or creates the entry for `(title, season)` and merges new
    /// information into it, all inside one transaction.
    ///
    /// The insert runs first so the transaction takes the write lock before
    /// it reads; a concurrent creator of the same entry leaves the insert a
    /// no-op and the row is merged instead.
    pub async fn upsert(&self, request: &CatalogRequest) -> Result<CatalogUpsert> {
        let txn = self.conn.begin().await?;

        let now = Utc::now().to_rfc3339();
        let active = bangumi::ActiveModel {
            official_title: Set(request.official_title.clone()),
            season: Set(request.season),
            year: Set(request.year),
            source: Set(request.source.clone()),
            poster_link: Set(request.poster.as_ref().and_then(|p| non_empty(&p.link))),
            poster_hash: Set(request.poster.as_ref().and_then(|p| p.hash.clone())),
            view_count: Set(0),
            favorite_count: Set(0),
            rating_avg: Set(0.0),
            rating_count: Set(0),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = Bangumi::insert(active)
            .on_conflict(
                OnConflict::columns([bangumi::Column::OfficialTitle, bangumi::Column::Season])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        let entry = Bangumi::find()
            .filter(bangumi::Column::OfficialTitle.eq(request.official_title.as_str()))
            .filter(bangumi::Column::Season.eq(request.season))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                anyhow!(
                    "Catalog entry '{}' season {} missing after insert",
                    request.official_title,
                    request.season
                )
            })?;
        let id = CatalogId::new(entry.id);

        if inserted > 0 {
            txn.commit().await?;
            return Ok(CatalogUpsert::Created(id));
        }

        let mut active: bangumi::ActiveModel = entry.clone().into();
        let mut changed = false;

        if entry.year.is_none()
            && let Some(year) = request.year
        {
            active.year = Set(Some(year));
            changed = true;
        }

        if let Some(poster) = &request.poster
            && entry.poster_link.as_deref().unwrap_or_default() != poster.link
        {
            active.poster_link = Set(non_empty(&poster.link));
            active.poster_hash = Set(poster.hash.clone());
            changed = true;
        }

        if entry.source.is_none()
            && let Some(source) = &request.source
        {
            active.source = Set(Some(source.clone()));
            changed = true;
        }

        let outcome = if changed {
            active.updated_at = Set(Utc::now().to_rfc3339());
            active.update(&txn).await?;
            CatalogUpsert::Updated(id)
        } else {
            CatalogUpsert::Unchanged(id)
        };

        txn.commit().await?;
        Ok(outcome)
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Poster information offered to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterRef {
    /// Remote URL or local file path. An empty link clears the stored one.
    pub link: String,

    /// MD5 hex digest of the image, when it was downloaded.
    pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    pub official_title: String,

    /// Always >= 1.
    pub season: i32,

    pub year: Option<i32>,

    /// Tracker tag, set only when the entry has none.
    pub source: Option<String>,

    /// `None` leaves the stored poster untouched.
    pub poster: Option<PosterRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogUpsert {
    Created(CatalogId),
    Updated(CatalogId),
    Unchanged(CatalogId),
}

impl CatalogUpsert {
    #[must_use]
    pub const fn id(&self) -> CatalogId {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Unchanged(id) => *id,
        }
    }
}
