use serde::{Deserialize, Serialize};

use crate::domain::EpisodeNumber;

/// Structured fields recovered from a raw fansub release title.
///
/// Empty strings mean "not present in the title"; at least one of the three
/// name fields is always non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ParsedRelease {
    pub name_en: String,

    pub name_zh: String,

    pub name_jp: String,

    pub season: i32,

    /// Season marker exactly as written, e.g. `第二季` or `S2`.
    pub season_raw: String,

    pub episode: EpisodeNumber,

    pub subtitle: String,

    pub group: String,

    pub resolution: String,

    pub source: String,
}

impl ParsedRelease {
    /// Best display name, preferring Chinese, then English, then Japanese.
    #[must_use]
    pub fn display_name(&self) -> &str {
        [&self.name_zh, &self.name_en, &self.name_jp]
            .into_iter()
            .find(|name| !name.is_empty())
            .map_or("", String::as_str)
    }

    #[must_use]
    pub fn effective_season(&self) -> i32 {
        self.season.max(1)
    }
}
