use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "feed_sources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub url: String,
    pub parser_kind: String,
    pub update_interval_hours: i32,
    pub include_keywords: String,
    pub exclude_keywords: String,
    pub priority: i32,
    pub page_start: Option<i32>,
    pub page_end: Option<i32>,
    pub last_updated: Option<String>,
    pub created_at: Option<String>,
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
