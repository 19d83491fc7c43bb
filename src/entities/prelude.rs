pub use super::activities::Entity as Activities;
pub use super::bangumi::Entity as Bangumi;
pub use super::episode_records::Entity as EpisodeRecords;
pub use super::feed_sources::Entity as FeedSources;
pub use super::global_settings::Entity as GlobalSettings;
