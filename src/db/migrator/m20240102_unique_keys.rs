use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_bangumi_title_season ON bangumi(official_title, season)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_episode_records_dedup ON episode_records(bangumi_id, feed_id, torrent_url)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_bangumi_poster_hash ON bangumi(poster_hash)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_bangumi_poster_hash")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_episode_records_dedup")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_bangumi_title_season")
            .await?;

        Ok(())
    }
}
