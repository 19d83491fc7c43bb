//! Syndication document parsing.
//!
//! Only `rss/channel/item/link` is used; every other element is ignored.

use quick_xml::de::from_str;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedParseError {
    #[error("Malformed feed document: {0}")]
    Xml(#[from] quick_xml::DeError),
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    link: Option<String>,
}

/// Extracts the item links of an RSS 2.0 document, in document order.
///
/// Items without a link are skipped.
pub fn parse_item_links(xml: &str) -> Result<Vec<String>, FeedParseError> {
    let rss: Rss = from_str(xml)?;

    Ok(rss
        .channel
        .items
        .into_iter()
        .filter_map(|item| item.link)
        .map(|link| link.trim().to_string())
        .filter(|link| !link.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0">
  <channel>
    <title>Mikan Project - 我的番组</title>
    <link>http://mikanani.me/RSS/MyBangumi</link>
    <description>Mikan Project - 我的番组</description>
    <item>
      <guid isPermaLink="false">[LoliHouse] Title - 01 [1080p]</guid>
      <link>https://mikanani.me/Home/Episode/aaa111</link>
      <title>[LoliHouse] Title - 01 [1080p]</title>
      <enclosure type="application/x-bittorrent" length="1" url="https://mikanani.me/Download/aaa111.torrent" />
    </item>
    <item>
      <title>No link here</title>
    </item>
    <item>
      <link> https://mikanani.me/Home/Episode/bbb222 </link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_extracts_item_links() {
        let links = parse_item_links(FEED).unwrap();
        assert_eq!(
            links,
            vec![
                "https://mikanani.me/Home/Episode/aaa111".to_string(),
                "https://mikanani.me/Home/Episode/bbb222".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_channel() {
        let links = parse_item_links("<rss><channel><title>x</title></channel></rss>").unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_malformed_document() {
        assert!(parse_item_links("<html><body>not a feed").is_err());
    }
}
