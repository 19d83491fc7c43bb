use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::FeedId;

/// How the items of a feed are turned into episodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// Feed of a tracker whose item links point at scrapeable episode pages.
    Tracker,

    /// Plain syndication feed. Not supported by the pipeline.
    Generic,
}

impl ParserKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tracker => "tracker",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tracker" | "mikanani" => Ok(Self::Tracker),
            "generic" | "generic_rss" => Ok(Self::Generic),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSource {
    pub id: FeedId,

    pub name: String,

    pub url: String,

    /// Stored parser kind; kept as text so unknown kinds surface as an
    /// error when the source is processed rather than when it is loaded.
    pub parser_kind: String,

    pub update_interval_hours: i32,

    pub include_keywords: Vec<String>,

    pub exclude_keywords: Vec<String>,

    pub priority: i32,

    pub page_start: Option<i32>,

    pub page_end: Option<i32>,

    pub last_updated: Option<DateTime<Utc>>,
}

impl FeedSource {
    /// A source is due when forced, never scanned, or its interval has elapsed.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>, force: bool) -> bool {
        if force {
            return true;
        }

        self.last_updated.is_none_or(|last| {
            now.signed_duration_since(last).num_hours() >= i64::from(self.update_interval_hours)
        })
    }

    /// Inclusive page range; collapses to a single page when the stored range
    /// is missing or inverted.
    #[must_use]
    pub fn page_range(&self) -> (i32, i32) {
        let start = self.page_start.unwrap_or(1).max(1);
        let end = self.page_end.unwrap_or(start);

        if end >= start { (start, end) } else { (start, start) }
    }

    /// URLs of every page to fetch, in page order.
    #[must_use]
    pub fn page_urls(&self) -> Vec<String> {
        let (start, end) = self.page_range();
        (start..=end).map(|page| page_url(&self.url, page)).collect()
    }

    /// True when the feed is served by the recognized tracker.
    #[must_use]
    pub fn is_known_tracker(&self) -> bool {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .is_some_and(|host| host.contains(crate::constants::tracker::HOST_MARKER))
    }
}

/// Page 1 is the feed URL itself; later pages append the page number as a
/// path segment.
#[must_use]
pub fn page_url(base: &str, page: i32) -> String {
    if page <= 1 {
        base.to_string()
    } else {
        format!("{}/{page}", base.trim_end_matches('/'))
    }
}

/// Splits a comma-separated keyword list, trimming entries and dropping
/// empty ones.
#[must_use]
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect()
}
