use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "episode_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub bangumi_id: i32,
    pub feed_id: i32,
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
    pub downloaded: bool,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bangumi::Entity",
        from = "Column::BangumiId",
        to = "super::bangumi::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Bangumi,
    #[sea_orm(
        belongs_to = "super::feed_sources::Entity",
        from = "Column::FeedId",
        to = "super::feed_sources::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    FeedSource,
}

impl Related<super::bangumi::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bangumi.def()
    }
}

impl Related<super::feed_sources::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeedSource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
