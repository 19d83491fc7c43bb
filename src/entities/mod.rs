pub mod prelude;

pub mod activities;
pub mod bangumi;
pub mod episode_records;
pub mod feed_sources;
pub mod global_settings;
