//! Keyword filtering for scraped feed items.

use crate::constants::subtitles::CHINESE_ALLOW_LIST;
use crate::models::FilterSet;

/// Fields of an item the filter looks at.
#[derive(Debug, Clone, Copy)]
pub struct FilterInput<'a> {
    pub raw_title: &'a str,

    pub official_title: &'a str,

    pub release_group: &'a str,

    pub subtitle: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Accept { reason: AcceptReason },

    Reject { reason: RejectReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptReason {
    /// The subtitle tag names a Chinese subtitle track.
    ChineseSubtitle(String),

    Keyword(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    ExcludedKeyword(String),

    BlacklistedGroup(String),

    NoIncludeKeywords,

    NoKeywordMatch,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExcludedKeyword(keyword) => write!(f, "excluded keyword '{keyword}'"),
            Self::BlacklistedGroup(group) => write!(f, "blacklisted group '{group}'"),
            Self::NoIncludeKeywords => f.write_str("no include keywords configured"),
            Self::NoKeywordMatch => f.write_str("no include keyword matched"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    filters: FilterSet,
}

impl KeywordFilter {
    #[must_use]
    pub const fn new(filters: FilterSet) -> Self {
        Self { filters }
    }

    /// The first exclude keyword found in either title. Needs no parsed
    /// fields, so it can run before the raw title is parsed.
    #[must_use]
    pub fn excluded(&self, raw_title: &str, official_title: &str) -> Option<RejectReason> {
        self.filters
            .exclude
            .iter()
            .find(|k| raw_title.contains(k.as_str()) || official_title.contains(k.as_str()))
            .map(|k| RejectReason::ExcludedKeyword(k.clone()))
    }

    /// Exclusion always wins over inclusion; a Chinese subtitle tag lets an
    /// item through without any include keyword.
    #[must_use]
    pub fn decide(&self, item: &FilterInput<'_>) -> FilterDecision {
        let in_titles =
            |keyword: &str| item.raw_title.contains(keyword) || item.official_title.contains(keyword);

        if let Some(reason) = self.excluded(item.raw_title, item.official_title) {
            return FilterDecision::Reject { reason };
        }

        if !item.release_group.is_empty()
            && let Some(group) = self
                .filters
                .group_blacklist
                .iter()
                .find(|g| item.release_group.contains(g.as_str()))
        {
            return FilterDecision::Reject {
                reason: RejectReason::BlacklistedGroup(group.clone()),
            };
        }

        if is_chinese_subtitle(item.subtitle) {
            return FilterDecision::Accept {
                reason: AcceptReason::ChineseSubtitle(item.subtitle.to_string()),
            };
        }

        if self.filters.include.is_empty() {
            return FilterDecision::Reject {
                reason: RejectReason::NoIncludeKeywords,
            };
        }

        self.filters.include.iter().find(|k| in_titles(k)).map_or(
            FilterDecision::Reject {
                reason: RejectReason::NoKeywordMatch,
            },
            |keyword| FilterDecision::Accept {
                reason: AcceptReason::Keyword(keyword.clone()),
            },
        )
    }
}

/// True when the subtitle tag contains one of the Chinese subtitle markers.
#[must_use]
pub fn is_chinese_subtitle(subtitle: &str) -> bool {
    !subtitle.is_empty() && CHINESE_ALLOW_LIST.iter().any(|m| subtitle.contains(m))
}
