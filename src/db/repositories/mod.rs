pub mod activity;
pub mod catalog;
pub mod episode;
pub mod feed;
pub mod settings;
