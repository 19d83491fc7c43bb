pub mod feed;
pub mod release;
pub mod settings;

pub use feed::{FeedSource, ParserKind};
pub use release::ParsedRelease;
pub use settings::{FilterSet, GlobalFilterSettings};
