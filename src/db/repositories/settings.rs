use crate::entities::{global_settings, prelude::*};
use crate::models::GlobalFilterSettings;
use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set};

pub struct SettingsRepository {
    conn: DatabaseConnection,
}

impl SettingsRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: &global_settings::Model) -> GlobalFilterSettings {
        GlobalFilterSettings::from_raw(&m.include_keywords, &m.exclude_keywords, &m.group_blacklist)
    }

    /// Returns the singleton row, creating it with empty lists on first use.
    pub async fn get_or_create(&self) -> Result<GlobalFilterSettings> {
        if let Some(row) = self.first().await? {
            return Ok(Self::map_model(&row));
        }

        let active_model = global_settings::ActiveModel {
            include_keywords: Set(String::new()),
            exclude_keywords: Set(String::new()),
            group_blacklist: Set(String::new()),
            updated_at: Set(Some(chrono::Utc::now().to_rfc3339())),
            ..Default::default()
        };
        GlobalSettings::insert(active_model).exec(&self.conn).await?;

        Ok(GlobalFilterSettings::default())
    }

    pub async fn update(&self, include: &str, exclude: &str, blacklist: &str) -> Result<()> {
        let row = self.first().await?;

        let mut active_model = global_settings::ActiveModel {
            include_keywords: Set(include.to_string()),
            exclude_keywords: Set(exclude.to_string()),
            group_blacklist: Set(blacklist.to_string()),
            updated_at: Set(Some(chrono::Utc::now().to_rfc3339())),
            ..Default::default()
        };

        if let Some(row) = row {
            active_model.id = Set(row.id);
            GlobalSettings::update(active_model).exec(&self.conn).await?;
        } else {
            GlobalSettings::insert(active_model).exec(&self.conn).await?;
        }

        Ok(())
    }

    async fn first(&self) -> Result<Option<global_settings::Model>> {
        Ok(GlobalSettings::find()
            .order_by_asc(global_settings::Column::Id)
            .one(&self.conn)
            .await?)
    }
}
