use serde::{Deserialize, Serialize};

use super::feed::{FeedSource, split_keywords};

/// Process-wide filter lists, merged into every feed source's own lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobalFilterSettings {
    pub include_keywords: Vec<String>,

    pub exclude_keywords: Vec<String>,

    /// Release groups whose items are always dropped.
    pub group_blacklist: Vec<String>,
}

impl GlobalFilterSettings {
    #[must_use]
    pub fn from_raw(include: &str, exclude: &str, blacklist: &str) -> Self {
        Self {
            include_keywords: split_keywords(include),
            exclude_keywords: split_keywords(exclude),
            group_blacklist: split_keywords(blacklist),
        }
    }
}

/// Effective filter lists for one feed source: the union of the source's
/// lists and the global ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub include: Vec<String>,

    pub exclude: Vec<String>,

    pub group_blacklist: Vec<String>,
}

impl FilterSet {
    #[must_use]
    pub fn merge(source: &FeedSource, global: &GlobalFilterSettings) -> Self {
        Self {
            include: union(&source.include_keywords, &global.include_keywords),
            exclude: union(&source.exclude_keywords, &global.exclude_keywords),
            group_blacklist: global.group_blacklist.clone(),
        }
    }
}

fn union(own: &[String], global: &[String]) -> Vec<String> {
    let mut merged = own.to_vec();
    for keyword in global {
        if !merged.contains(keyword) {
            merged.push(keyword.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeedId;

    #[test]
    fn test_merge_is_union() {
        let source = FeedSource {
            id: FeedId::new(1),
            name: "s".into(),
            url: "https://mikanani.me/RSS/x".into(),
            parser_kind: "tracker".into(),
            update_interval_hours: 1,
            include_keywords: vec!["1080p".into(), "简体".into()],
            exclude_keywords: vec!["720p".into()],
            priority: 0,
            page_start: None,
            page_end: None,
            last_updated: None,
        };
        let global = GlobalFilterSettings::from_raw("简体, 繁体", "合集", "BadSubs");

        let set = FilterSet::merge(&source, &global);
        assert_eq!(set.include, vec!["1080p", "简体", "繁体"]);
        assert_eq!(set.exclude, vec!["720p", "合集"]);
        assert_eq!(set.group_blacklist, vec!["BadSubs"]);
    }
}
