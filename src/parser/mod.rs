pub mod feed;
pub mod title;

pub use feed::{FeedParseError, parse_item_links};
pub use title::{TitleParseError, parse_title};
