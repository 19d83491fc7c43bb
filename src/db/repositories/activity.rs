use crate::entities::{activities, prelude::*};
use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};

pub struct ActivityRepository {
    conn: DatabaseConnection,
}

impl ActivityRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(&self, kind: &str, content: &str) -> Result<()> {
        let active_model = activities::ActiveModel {
            kind: Set(kind.to_string()),
            content: Set(content.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        Activities::insert(active_model).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<activities::Model>> {
        Ok(Activities::find()
            .order_by_desc(activities::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?)
    }
}
