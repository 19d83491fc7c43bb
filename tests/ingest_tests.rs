//! Integration tests for the ingestion pipeline.
//!
//! Feeds and episode pages are served from memory; the store is a
//! temporary SQLite file per test.

use async_trait::async_trait;
use bangumi_rss::clients::{Fetch, FetchError};
use bangumi_rss::db::{NewFeedSource, Store};
use bangumi_rss::domain::{CatalogId, FeedId};
use bangumi_rss::models::GlobalFilterSettings;
use bangumi_rss::services::ingest::IngestError;
use bangumi_rss::services::{
    IngestOptions, IngestService, PosterStore, StaticSettings, StoreActivitySink,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const FEED_URL: &str = "https://mikanani.me/RSS/MyBangumi";

#[derive(Default)]
struct StaticFetcher {
    pages: HashMap<String, String>,
    hits: Mutex<HashMap<String, usize>>,
    delay: Duration,
}

impl StaticFetcher {
    fn with(mut self, url: &str, body: String) -> Self {
        self.pages.insert(url.to_string(), body);
        self
    }

    const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetch for StaticFetcher {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.get_text(url).await.map(String::into_bytes)
    }
}

fn rss(links: &[&str]) -> String {
    let items: String = links
        .iter()
        .map(|link| format!("<item><title>t</title><link>{link}</link></item>"))
        .collect();
    format!(r#"<?xml version="1.0"?><rss version="2.0"><channel><title>f</title>{items}</channel></rss>"#)
}

fn episode_page(official: &str, group: &str, raw: &str, torrent: &str) -> String {
    format!(
        r#"<html><body>
<div class="bangumi-poster" style="background-image: url('/images/Bangumi/202310/poster.jpg?width=400');"></div>
<div class="central-container"><div class="episode-header"><p class="episode-title">{raw}</p></div></div>
<div class="leftbar-nav">
  <p class="bangumi-title"><a href="/Home/Bangumi/3141">{official}</a></p>
  <p class="bangumi-info">字幕组：<a href="/Home/PublishGroup/1" class="magnet-link-wrap">{group}</a></p>
  <p class="bangumi-info">发布日期：2024/03/22 20:31</p>
  <a class="episode-btn" href="/Download/{torrent}.torrent">下载种子</a>
  <a class="episode-btn" href="magnet:?xt=urn:btih:{torrent}">磁力链接</a>
</div>
</body></html>"#
    )
}

fn item_url(id: &str) -> String {
    format!("https://mikanani.me/Home/Episode/{id}")
}

/// One Chinese-subtitled item and one English-only item.
fn default_fetcher() -> StaticFetcher {
    StaticFetcher::default()
        .with(FEED_URL, rss(&[&item_url("a"), &item_url("b")]))
        .with(
            &item_url("a"),
            episode_page(
                "葬送的芙莉莲",
                "喵萌奶茶屋",
                "[喵萌奶茶屋] 葬送的芙莉莲 / Sousou no Frieren - 28 [1080p][简繁内封字幕]",
                "aaa",
            ),
        )
        .with(
            &item_url("b"),
            episode_page(
                "葬送的芙莉莲",
                "SubsPlease",
                "[SubsPlease] Sousou no Frieren - 28 (1080p) [ENG]",
                "bbb",
            ),
        )
}

async fn setup_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("bangumi-ingest-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to create store")
}

fn service(
    store: &Store,
    fetcher: Arc<StaticFetcher>,
    settings: GlobalFilterSettings,
) -> IngestService {
    service_with_workers(store, fetcher, settings, 2)
}

fn service_with_workers(
    store: &Store,
    fetcher: Arc<StaticFetcher>,
    settings: GlobalFilterSettings,
    page_workers: usize,
) -> IngestService {
    let fetcher: Arc<dyn Fetch> = fetcher;
    IngestService::new(
        store.clone(),
        Arc::clone(&fetcher),
        PosterStore::new(fetcher, "unused-posters", false),
        Arc::new(StaticSettings(settings)),
        Arc::new(StoreActivitySink::new(store.clone())),
        IngestOptions {
            source_workers: 2,
            page_workers,
            fetch_attempts: 2,
            retry_delay: Duration::ZERO,
        },
    )
}

async fn add_feed(store: &Store, feed: NewFeedSource) -> FeedId {
    store.add_feed_source(&feed).await.expect("failed to add feed")
}

#[tokio::test]
async fn test_scan_records_episode_once() {
    let store = setup_store().await;
    let fetcher = Arc::new(default_fetcher());
    let feed_id = add_feed(&store, NewFeedSource::tracker("Frieren", FEED_URL)).await;
    let ingest = service(&store, Arc::clone(&fetcher), GlobalFilterSettings::default());

    let report = ingest.update_all(true).await.unwrap();
    assert_eq!(report.sources.len(), 1);
    let source = &report.sources[0];
    assert_eq!(source.items, 2);
    assert_eq!(source.inserted, 1);
    assert_eq!(source.filtered, 1);
    assert_eq!(source.failed, 0);

    let again = ingest.update_one(feed_id).await.unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(again.duplicates, 1);

    assert_eq!(store.episode_count().await.unwrap(), 1);

    let entry = store
        .find_catalog_entry("葬送的芙莉莲", 1)
        .await
        .unwrap()
        .expect("catalog entry missing");
    assert_eq!(entry.year, Some(2024));
    assert_eq!(entry.source.as_deref(), Some("mikan"));
    assert_eq!(
        entry.poster_link.as_deref(),
        Some("https://mikanani.me/images/Bangumi/202310/poster.jpg")
    );

    let episodes = store
        .episodes_for_catalog(CatalogId::new(entry.id))
        .await
        .unwrap();
    assert_eq!(episodes.len(), 1);
    let episode = &episodes[0];
    assert!((episode.episode - 28.0).abs() < f64::EPSILON);
    assert_eq!(episode.torrent_url, "https://mikanani.me/Download/aaa.torrent");
    assert_eq!(episode.release_group.as_deref(), Some("喵萌奶茶屋"));
    assert_eq!(episode.subtitle.as_deref(), Some("简繁内封字幕"));
    assert_eq!(episode.source.as_deref(), Some("mikan"));
    assert_eq!(episode.release_date.as_deref(), Some("2024/03/22 20:31"));

    let feed = store.get_feed_source(feed_id).await.unwrap().unwrap();
    assert!(feed.last_updated.is_some());

    let activities = store.recent_activities(10).await.unwrap();
    assert_eq!(activities.len(), 2);
    assert!(activities.iter().all(|a| a.kind == "rss"));
}

#[tokio::test]
async fn test_include_keyword_admits_item() {
    let store = setup_store().await;
    let fetcher = Arc::new(default_fetcher());
    add_feed(&store, NewFeedSource::tracker("Frieren", FEED_URL)).await;
    let settings = GlobalFilterSettings::from_raw("Sousou", "", "");
    let ingest = service(&store, fetcher, settings);

    let report = ingest.update_all(true).await.unwrap();
    assert_eq!(report.sources[0].inserted, 2);
    assert_eq!(store.episode_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_exclusion_dominates_inclusion_and_bypass() {
    let store = setup_store().await;
    let fetcher = Arc::new(default_fetcher());

    let mut feed = NewFeedSource::tracker("Frieren", FEED_URL);
    feed.include_keywords = "Sousou".to_string();
    feed.exclude_keywords = "ENG".to_string();
    add_feed(&store, feed).await;

    let settings = GlobalFilterSettings::from_raw("", "", "喵萌奶茶屋");
    let ingest = service(&store, fetcher, settings);

    let report = ingest.update_all(true).await.unwrap();
    assert_eq!(report.sources[0].inserted, 0);
    assert_eq!(report.sources[0].filtered, 2);
    assert_eq!(store.episode_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_without_pagination_fetches_one_page() {
    let store = setup_store().await;
    let fetcher = Arc::new(default_fetcher());
    add_feed(&store, NewFeedSource::tracker("Frieren", FEED_URL)).await;
    let ingest = service(&store, Arc::clone(&fetcher), GlobalFilterSettings::default());

    let report = ingest.update_all(true).await.unwrap();
    assert_eq!(report.sources[0].pages, 1);
    assert_eq!(fetcher.hits(FEED_URL), 1);
    assert_eq!(fetcher.hits(&format!("{FEED_URL}/2")), 0);
}

#[tokio::test]
async fn test_failed_page_does_not_abort_source() {
    let store = setup_store().await;
    let fetcher = Arc::new(default_fetcher());

    let mut feed = NewFeedSource::tracker("Frieren", FEED_URL);
    feed.page_start = Some(1);
    feed.page_end = Some(2);
    let feed_id = add_feed(&store, feed).await;
    let ingest = service(&store, Arc::clone(&fetcher), GlobalFilterSettings::default());

    let report = ingest.update_one(feed_id).await.unwrap();
    assert_eq!(report.pages, 2);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.inserted, 1);

    assert_eq!(fetcher.hits(&format!("{FEED_URL}/2")), 2);

    let feed = store.get_feed_source(feed_id).await.unwrap().unwrap();
    assert!(feed.last_updated.is_some());
}

#[tokio::test]
async fn test_unsupported_parser_kind() {
    let store = setup_store().await;
    let fetcher = Arc::new(default_fetcher());

    let mut feed = NewFeedSource::tracker("Generic", FEED_URL);
    feed.parser_kind = "generic".to_string();
    let feed_id = add_feed(&store, feed).await;
    let ingest = service(&store, Arc::clone(&fetcher), GlobalFilterSettings::default());

    let err = ingest.update_one(feed_id).await.unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedParserKind { .. }));

    let report = ingest.update_all(true).await.unwrap();
    assert!(report.sources.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(fetcher.hits(FEED_URL), 0);
}

#[tokio::test]
async fn test_sources_not_due_are_skipped() {
    let store = setup_store().await;
    let fetcher = Arc::new(default_fetcher());
    add_feed(&store, NewFeedSource::tracker("Frieren", FEED_URL)).await;
    let ingest = service(&store, Arc::clone(&fetcher), GlobalFilterSettings::default());

    let first = ingest.update_all(false).await.unwrap();
    assert_eq!(first.sources.len(), 1);

    let second = ingest.update_all(false).await.unwrap();
    assert!(second.sources.is_empty());
    assert_eq!(fetcher.hits(FEED_URL), 1);
}

#[tokio::test]
async fn test_update_one_unknown_feed() {
    let store = setup_store().await;
    let ingest = service(
        &store,
        Arc::new(StaticFetcher::default()),
        GlobalFilterSettings::default(),
    );

    let err = ingest.update_one(FeedId::new(42)).await.unwrap_err();
    assert!(matches!(err, IngestError::FeedNotFound(_)));
}

#[tokio::test]
async fn test_unparseable_title_is_counted_as_failed() {
    let store = setup_store().await;
    let fetcher = Arc::new(
        StaticFetcher::default()
            .with(FEED_URL, rss(&[&item_url("c")]))
            .with(
                &item_url("c"),
                episode_page("某番", "G", "[G] 没有集数的标题 [1080p]", "ccc"),
            ),
    );
    add_feed(&store, NewFeedSource::tracker("Broken", FEED_URL)).await;
    let ingest = service(&store, fetcher, GlobalFilterSettings::default());

    let report = ingest.update_all(true).await.unwrap();
    assert_eq!(report.sources[0].items, 1);
    assert_eq!(report.sources[0].failed, 1);
    assert_eq!(store.episode_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_subtitle_bypass_with_unmatched_include_keyword() {
    let store = setup_store().await;
    let fetcher = Arc::new(default_fetcher());
    add_feed(&store, NewFeedSource::tracker("Frieren", FEED_URL)).await;
    let settings = GlobalFilterSettings::from_raw("Marginal", "", "");
    let ingest = service(&store, fetcher, settings);

    let report = ingest.update_all(true).await.unwrap();
    assert_eq!(report.sources[0].inserted, 1);
    assert_eq!(report.sources[0].filtered, 1);

    let entry = store
        .find_catalog_entry("葬送的芙莉莲", 1)
        .await
        .unwrap()
        .expect("catalog entry missing");
    let episodes = store
        .episodes_for_catalog(CatalogId::new(entry.id))
        .await
        .unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].subtitle.as_deref(), Some("简繁内封字幕"));
}

#[tokio::test]
async fn test_excluded_item_is_filtered_before_parsing() {
    let store = setup_store().await;
    let fetcher = Arc::new(
        StaticFetcher::default()
            .with(FEED_URL, rss(&[&item_url("batch")]))
            .with(
                &item_url("batch"),
                episode_page("葬送的芙莉莲", "G", "[G] 葬送的芙莉莲 全集 合集 [1080p]", "batch"),
            ),
    );

    let mut feed = NewFeedSource::tracker("Frieren", FEED_URL);
    feed.exclude_keywords = "合集".to_string();
    add_feed(&store, feed).await;
    let ingest = service(&store, fetcher, GlobalFilterSettings::default());

    let report = ingest.update_all(true).await.unwrap();
    assert_eq!(report.sources[0].items, 1);
    assert_eq!(report.sources[0].filtered, 1);
    assert_eq!(report.sources[0].failed, 0);
}

#[tokio::test]
async fn test_concurrent_pages_share_new_catalog_entry() {
    const PAGES: i32 = 8;

    let store = setup_store().await;
    let mut fetcher = StaticFetcher::default();
    for page in 1..=PAGES {
        let page_url = if page == 1 {
            FEED_URL.to_string()
        } else {
            format!("{FEED_URL}/{page}")
        };
        let id = format!("ep{page}");
        fetcher = fetcher.with(&page_url, rss(&[&item_url(&id)])).with(
            &item_url(&id),
            episode_page(
                "新番剧",
                "喵萌奶茶屋",
                &format!("[喵萌奶茶屋] 葬送的芙莉莲 / Sousou no Frieren - {page:02} [1080p][简繁内封字幕]"),
                &id,
            ),
        );
    }

    let mut feed = NewFeedSource::tracker("New show", FEED_URL);
    feed.page_start = Some(1);
    feed.page_end = Some(PAGES);
    let feed_id = add_feed(&store, feed).await;
    let ingest = service_with_workers(
        &store,
        Arc::new(fetcher),
        GlobalFilterSettings::default(),
        8,
    );

    let report = ingest.update_one(feed_id).await.unwrap();
    assert_eq!(report.pages, 8);
    assert_eq!(report.failed, 0);
    assert_eq!(report.inserted, 8);

    let entries = store.list_catalog_entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].official_title, "新番剧");
    assert_eq!(store.episode_count().await.unwrap(), 8);
}

async fn wait_for_activity(store: &Store) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while store.recent_activities(10).await.unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("triggered scan did not finish");
}

#[tokio::test]
async fn test_trigger_update_all_runs_in_background() {
    let store = setup_store().await;
    let fetcher = Arc::new(default_fetcher().with_delay(Duration::from_millis(200)));
    add_feed(&store, NewFeedSource::tracker("Frieren", FEED_URL)).await;
    let ingest = service(&store, Arc::clone(&fetcher), GlobalFilterSettings::default());

    ingest.trigger_update_all(true);
    assert_eq!(fetcher.hits(FEED_URL), 0);
    assert_eq!(store.episode_count().await.unwrap(), 0);

    wait_for_activity(&store).await;
    assert_eq!(fetcher.hits(FEED_URL), 1);
    assert_eq!(store.episode_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_trigger_update_one_runs_in_background() {
    let store = setup_store().await;
    let fetcher = Arc::new(default_fetcher().with_delay(Duration::from_millis(200)));
    let feed_id = add_feed(&store, NewFeedSource::tracker("Frieren", FEED_URL)).await;
    let ingest = service(&store, Arc::clone(&fetcher), GlobalFilterSettings::default());

    ingest.trigger_update_one(feed_id);
    let feed = store.get_feed_source(feed_id).await.unwrap().unwrap();
    assert!(feed.last_updated.is_none());

    wait_for_activity(&store).await;
    let feed = store.get_feed_source(feed_id).await.unwrap().unwrap();
    assert!(feed.last_updated.is_some());
    assert_eq!(store.episode_count().await.unwrap(), 1);
}
