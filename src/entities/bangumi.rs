use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Catalog entry: one season of one series. `(official_title, season)` is unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "bangumi")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub official_title: String,
    pub season: i32,
    pub year: Option<i32>,
    pub source: Option<String>,
    pub poster_link: Option<String>,
    pub poster_hash: Option<String>,
    pub view_count: i64,
    pub favorite_count: i64,
    pub rating_avg: f64,
    pub rating_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::episode_records::Entity")]
    EpisodeRecords,
}

impl Related<super::episode_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EpisodeRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
