//! Episode detail page scraper for the Mikan tracker.
//!
//! Feed items only carry a link; the episode page holds the official series
//! title, the publishing group, the raw release filename, the publish date and
//! the download links.

use chrono::{Datelike, Duration, Local, NaiveDate};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};
use url::Url;

use super::http::{Fetch, FetchError};

/// Publish date of an episode, decomposed for catalog bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDate {
    /// Date text as shown on the page, or `YYYY/MM/DD` for relative dates.
    pub text: String,

    pub year: i32,

    pub month: u32,

    pub day: u32,
}

impl ReleaseDate {
    fn from_date(date: NaiveDate) -> Self {
        Self {
            text: date.format("%Y/%m/%d").to_string(),
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailInfo {
    pub official_title: String,

    pub release_group: String,

    pub raw_title: String,

    pub release_date: Option<ReleaseDate>,

    pub torrent_url: String,

    pub magnet_link: String,
}

fn get_selector(cell: &'static OnceLock<Selector>, css: &str) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(css).expect("Invalid CSS selector defined in code"))
}

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of the last element matching `selector`, mirroring how the page
/// repeats some blocks for mobile layouts.
fn last_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .last()
        .map(element_text)
        .unwrap_or_default()
}

fn last_href<'a>(document: &'a Html, selector: &Selector) -> Option<&'a str> {
    document
        .select(selector)
        .filter_map(|element| element.value().attr("href"))
        .last()
}

/// Extracts episode details from a detail page body.
///
/// `host` is used to make relative download links absolute and `today`
/// anchors relative publish dates.
#[must_use]
pub fn parse_detail_page(html: &str, host: &str, today: NaiveDate) -> DetailInfo {
    static TITLE: OnceLock<Selector> = OnceLock::new();
    static GROUP: OnceLock<Selector> = OnceLock::new();
    static RAW_TITLE: OnceLock<Selector> = OnceLock::new();
    static INFO: OnceLock<Selector> = OnceLock::new();
    static TORRENT: OnceLock<Selector> = OnceLock::new();
    static MAGNET: OnceLock<Selector> = OnceLock::new();
    static SEASON_SUFFIX: OnceLock<Regex> = OnceLock::new();

    let document = Html::parse_document(html);

    let season_suffix = get_regex(&SEASON_SUFFIX, r"第.*[季期]|Season\s*\d+");
    let official_title = last_text(
        &document,
        get_selector(&TITLE, "p.bangumi-title a[href^='/Home/Bangumi/']"),
    );
    let official_title = season_suffix
        .replace_all(&official_title, "")
        .trim()
        .to_string();

    let release_group = last_text(
        &document,
        get_selector(
            &GROUP,
            "p.bangumi-info a.magnet-link-wrap[href^='/Home/PublishGroup/']",
        ),
    );

    let raw_title = last_text(
        &document,
        get_selector(
            &RAW_TITLE,
            "div.central-container div.episode-header p.episode-title",
        ),
    );

    let release_date = document
        .select(get_selector(&INFO, "p.bangumi-info"))
        .map(element_text)
        .find_map(|text| {
            text.strip_prefix("发布日期：")
                .map(|date| parse_release_date(date.trim(), today))
        })
        .flatten();

    let torrent_url = last_href(
        &document,
        get_selector(&TORRENT, "div.leftbar-nav a.episode-btn[href$='.torrent']"),
    )
    .map(|href| absolute(host, href))
    .unwrap_or_default();

    let magnet_link = last_href(
        &document,
        get_selector(&MAGNET, "div.leftbar-nav a.episode-btn[href^='magnet:']"),
    )
    .map(str::to_string)
    .unwrap_or_default();

    DetailInfo {
        official_title,
        release_group,
        raw_title,
        release_date,
        torrent_url,
        magnet_link,
    }
}

/// Parses `今天`/`昨天`/`前天` or a positional `YYYY/MM/DD[ hh:mm]` date.
#[must_use]
pub fn parse_release_date(text: &str, today: NaiveDate) -> Option<ReleaseDate> {
    if text.contains('天') {
        let days_ago = if text.contains("前天") {
            2
        } else if text.contains("昨天") {
            1
        } else if text.contains("今天") {
            0
        } else {
            debug!(date = %text, "Unrecognized relative publish date");
            return None;
        };
        return today
            .checked_sub_signed(Duration::days(days_ago))
            .map(ReleaseDate::from_date);
    }

    let mut parts = text.split('/');
    let (Some(year), Some(month), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
        debug!(date = %text, "Unrecognized publish date");
        return None;
    };
    let day = rest.split_whitespace().next().unwrap_or_default();

    Some(ReleaseDate {
        text: text.to_string(),
        year: year.trim().parse().ok()?,
        month: month.trim().parse().ok()?,
        day: day.parse().ok()?,
    })
}

/// Extracts the poster image URL from the inline background style.
#[must_use]
pub fn parse_poster_url(html: &str, host: &str) -> Option<String> {
    static POSTER: OnceLock<Selector> = OnceLock::new();
    static STYLE_URL: OnceLock<Regex> = OnceLock::new();

    let document = Html::parse_document(html);
    let style = document
        .select(get_selector(&POSTER, "div.bangumi-poster"))
        .next()?
        .value()
        .attr("style")?;

    let caps = get_regex(&STYLE_URL, r"url\('([^']+)'\)").captures(style)?;
    let path = caps.get(1)?.as_str();
    let path = path.split('?').next().unwrap_or(path);

    Some(absolute(host, path))
}

fn absolute(host: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("https://{host}{path}")
    }
}

fn host_of(page_url: &str) -> Result<String, FetchError> {
    Url::parse(page_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .ok_or_else(|| FetchError::Transport {
            url: page_url.to_string(),
            message: "URL has no host".to_string(),
        })
}

#[derive(Clone)]
pub struct MikanScraper {
    fetcher: Arc<dyn Fetch>,
}

impl MikanScraper {
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self { fetcher }
    }

    /// Fetches an episode page and extracts its details.
    pub async fn fetch_detail(&self, page_url: &str) -> Result<DetailInfo, FetchError> {
        let host = host_of(page_url)?;
        let html = self.fetcher.get_text(page_url).await?;
        Ok(parse_detail_page(&html, &host, Local::now().date_naive()))
    }

    /// Fetches an episode page again and extracts the poster URL.
    ///
    /// Kept separate from [`Self::fetch_detail`] so filtered-out items never
    /// pay for it. Failures are logged and reported as no poster.
    pub async fn fetch_poster_url(&self, page_url: &str) -> Option<String> {
        let host = host_of(page_url).ok()?;
        match self.fetcher.get_text(page_url).await {
            Ok(html) => parse_poster_url(&html, &host),
            Err(e) => {
                warn!(url = %page_url, error = %e, "Failed to fetch poster");
                None
            }
        }
    }
}
