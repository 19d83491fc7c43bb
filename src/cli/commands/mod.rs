mod check;
mod feeds;
mod parse;
mod scrape;
mod settings;

pub use check::{cmd_check, cmd_update};
pub use feeds::{cmd_feeds_add, cmd_feeds_list, cmd_feeds_remove};
pub use parse::cmd_parse;
pub use scrape::cmd_scrape;
pub use settings::{cmd_settings_set, cmd_settings_show};
