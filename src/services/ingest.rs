//! Feed ingestion: fetch feed pages, scrape every item's episode page, filter,
//! resolve the catalog entry and record the episode.

use crate::clients::http::{Fetch, FetchError, HttpClient, fetch_with_retry};
use crate::clients::mikan::MikanScraper;
use crate::config::{Config, IngestConfig};
use crate::constants::{ingest::ACTIVITY_KIND_RSS, tracker::SOURCE_TAG};
use crate::db::{CatalogRequest, NewEpisodeRecord, Store};
use crate::domain::{CatalogId, EpisodeNumber, FeedId};
use crate::models::{FeedSource, FilterSet, GlobalFilterSettings, ParserKind};
use crate::parser::{TitleParseError, parse_item_links, parse_title};
use crate::services::activity::{ActivitySink, StoreActivitySink};
use crate::services::catalog::{CatalogResolver, ResolveError};
use crate::services::filter::{FilterDecision, FilterInput, KeywordFilter, RejectReason};
use crate::services::image::PosterStore;
use crate::services::settings::{SettingsProvider, StoreSettingsProvider};
use crate::services::worker_pool::WorkerPool;
use chrono::Utc;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Feed source {feed_id} uses unsupported parser kind '{kind}'")]
    UnsupportedParserKind { feed_id: FeedId, kind: String },

    #[error("Feed source not found: {0}")]
    FeedNotFound(FeedId),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl From<sea_orm::DbErr> for IngestError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for IngestError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Failure of a single feed item. The item is skipped, the run continues.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] TitleParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ItemError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Inserted {
        catalog_id: CatalogId,
        episode: EpisodeNumber,
    },

    Duplicate,

    Filtered(RejectReason),

    /// The episode page carried no official title or no download link.
    Incomplete,
}

impl ItemOutcome {
    const fn label(&self) -> &'static str {
        match self {
            Self::Inserted { .. } => "inserted",
            Self::Duplicate => "duplicate",
            Self::Filtered(_) => "filtered",
            Self::Incomplete => "incomplete",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceReport {
    pub feed_id: i32,
    pub name: String,
    pub pages: usize,
    pub pages_failed: usize,
    pub items: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub filtered: usize,
    pub failed: usize,
}

impl SourceReport {
    fn merge_page(&mut self, page: &PageReport) {
        self.pages += 1;
        if page.failed_fetch {
            self.pages_failed += 1;
        }
        self.items += page.items;
        self.inserted += page.inserted;
        self.duplicates += page.duplicates;
        self.filtered += page.filtered;
        self.failed += page.failed;
    }
}

/// A feed source that could not be processed at all.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub feed_id: i32,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub sources: Vec<SourceReport>,
    pub failures: Vec<SourceFailure>,
}

impl ScanReport {
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.sources.iter().map(|s| s.inserted).sum()
    }
}

#[derive(Debug, Default)]
struct PageReport {
    failed_fetch: bool,
    items: usize,
    inserted: usize,
    duplicates: usize,
    filtered: usize,
    failed: usize,
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub source_workers: usize,
    pub page_workers: usize,
    pub fetch_attempts: u32,
    pub retry_delay: Duration,
}

impl IngestOptions {
    #[must_use]
    pub const fn from_config(config: &IngestConfig) -> Self {
        Self {
            source_workers: config.source_workers,
            page_workers: config.page_workers,
            fetch_attempts: config.fetch_attempts,
            retry_delay: Duration::from_secs(config.retry_delay_seconds),
        }
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

/// Per-source state shared by the page workers.
struct SourceContext {
    feed_id: FeedId,
    known_tracker: bool,
    filter: KeywordFilter,
}

#[derive(Clone)]
pub struct IngestService {
    store: Store,
    fetcher: Arc<dyn Fetch>,
    scraper: MikanScraper,
    posters: PosterStore,
    catalog: CatalogResolver,
    settings: Arc<dyn SettingsProvider>,
    activity: Arc<dyn ActivitySink>,
    options: IngestOptions,
}

impl IngestService {
    #[must_use]
    pub fn new(
        store: Store,
        fetcher: Arc<dyn Fetch>,
        posters: PosterStore,
        settings: Arc<dyn SettingsProvider>,
        activity: Arc<dyn ActivitySink>,
        options: IngestOptions,
    ) -> Self {
        Self {
            scraper: MikanScraper::new(Arc::clone(&fetcher)),
            catalog: CatalogResolver::new(store.clone()),
            store,
            fetcher,
            posters,
            settings,
            activity,
            options,
        }
    }

    /// Wires the service to the real HTTP client and store-backed
    /// settings and activity log.
    pub fn from_config(store: Store, config: &Config) -> anyhow::Result<Self> {
        let fetcher: Arc<dyn Fetch> = Arc::new(HttpClient::from_config(&config.http)?);
        let posters = PosterStore::from_config(Arc::clone(&fetcher), config);

        Ok(Self::new(
            store.clone(),
            fetcher,
            posters,
            Arc::new(StoreSettingsProvider::new(store.clone())),
            Arc::new(StoreActivitySink::new(store)),
            IngestOptions::from_config(&config.ingest),
        ))
    }

    /// Scans every due feed source. Sources failing as a whole are logged
    /// and listed in the report; they never abort the scan.
    pub async fn update_all(&self, force: bool) -> Result<ScanReport, IngestError> {
        let start = Instant::now();
        let settings = self.settings.snapshot().await?;
        let now = Utc::now();

        let due: Vec<FeedSource> = self
            .store
            .list_feed_sources()
            .await?
            .into_iter()
            .filter(|source| source.is_due(now, force))
            .collect();

        info!(
            event = "scan_started",
            due_sources = due.len(),
            force,
            "Starting feed scan"
        );

        let settings = Arc::new(settings);
        let service = self.clone();
        let results = WorkerPool::new("sources", self.options.source_workers)
            .run(due, move |source| {
                let service = service.clone();
                let settings = Arc::clone(&settings);
                async move {
                    let result = service.process_source(&source, &settings).await;
                    (source, result)
                }
            })
            .await;

        let mut report = ScanReport::default();
        for (source, result) in results {
            match result {
                Ok(source_report) => report.sources.push(source_report),
                Err(e) => {
                    error!(
                        event = "source_failed",
                        feed_id = %source.id,
                        name = %source.name,
                        error = %e,
                        "Feed source failed"
                    );
                    report.failures.push(SourceFailure {
                        feed_id: source.id.value(),
                        name: source.name,
                        error: e.to_string(),
                    });
                }
            }
        }
        report.sources.sort_by_key(|s| s.feed_id);

        info!(
            event = "scan_finished",
            sources = report.sources.len(),
            failed_sources = report.failures.len(),
            inserted = report.inserted(),
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Feed scan finished"
        );

        Ok(report)
    }

    /// Scans one feed source regardless of its schedule.
    pub async fn update_one(&self, feed_id: FeedId) -> Result<SourceReport, IngestError> {
        let source = self
            .store
            .get_feed_source(feed_id)
            .await?
            .ok_or(IngestError::FeedNotFound(feed_id))?;

        let settings = self.settings.snapshot().await?;
        self.process_source(&source, &settings).await
    }

    /// Runs [`Self::update_all`] in the background.
    pub fn trigger_update_all(&self, force: bool) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.update_all(force).await {
                error!(error = %e, "Triggered feed scan failed");
            }
        });
    }

    /// Runs [`Self::update_one`] in the background.
    pub fn trigger_update_one(&self, feed_id: FeedId) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.update_one(feed_id).await {
                error!(feed_id = %feed_id, error = %e, "Triggered feed update failed");
            }
        });
    }

    pub async fn process_source(
        &self,
        source: &FeedSource,
        settings: &GlobalFilterSettings,
    ) -> Result<SourceReport, IngestError> {
        match ParserKind::from_str(&source.parser_kind) {
            Ok(ParserKind::Tracker) => {}
            Ok(ParserKind::Generic) | Err(_) => {
                return Err(IngestError::UnsupportedParserKind {
                    feed_id: source.id,
                    kind: source.parser_kind.clone(),
                });
            }
        }

        let start = Instant::now();
        let page_urls = source.page_urls();

        info!(
            event = "source_started",
            feed_id = %source.id,
            name = %source.name,
            pages = page_urls.len(),
            "Processing feed source"
        );

        let context = Arc::new(SourceContext {
            feed_id: source.id,
            known_tracker: source.is_known_tracker(),
            filter: KeywordFilter::new(FilterSet::merge(source, settings)),
        });

        let service = self.clone();
        let pages = WorkerPool::new("pages", self.options.page_workers)
            .run(page_urls, move |url| {
                let service = service.clone();
                let context = Arc::clone(&context);
                async move { service.process_page(&context, &url).await }
            })
            .await;

        let mut report = SourceReport {
            feed_id: source.id.value(),
            name: source.name.clone(),
            ..SourceReport::default()
        };
        for page in &pages {
            report.merge_page(page);
        }

        self.store.mark_feed_updated(source.id, Utc::now()).await?;

        self.activity
            .record(
                ACTIVITY_KIND_RSS,
                &format!(
                    "Updated feed \"{}\": {} new episodes from {} items",
                    source.name, report.inserted, report.items
                ),
            )
            .await;

        info!(
            event = "source_finished",
            feed_id = %source.id,
            name = %source.name,
            pages = report.pages,
            pages_failed = report.pages_failed,
            items = report.items,
            inserted = report.inserted,
            duplicates = report.duplicates,
            filtered = report.filtered,
            failed = report.failed,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Feed source processed"
        );

        Ok(report)
    }

    async fn process_page(&self, context: &SourceContext, url: &str) -> PageReport {
        let mut report = PageReport::default();

        let links = match fetch_with_retry(
            self.fetcher.as_ref(),
            url,
            self.options.fetch_attempts,
            self.options.retry_delay,
        )
        .await
        {
            Ok(xml) => match parse_item_links(&xml) {
                Ok(links) => links,
                Err(e) => {
                    warn!(url = %url, error = %e, "Skipping unparseable feed page");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(
                    event = "page_failed",
                    feed_id = %context.feed_id,
                    url = %url,
                    error = %e,
                    "Skipping feed page"
                );
                metrics::counter!("ingest_pages_total", "status" => "failed").increment(1);
                report.failed_fetch = true;
                return report;
            }
        };

        metrics::counter!("ingest_pages_total", "status" => "fetched").increment(1);
        debug!(url = %url, items = links.len(), "Fetched feed page");

        for link in links {
            report.items += 1;
            match self.process_item(context, &link).await {
                Ok(outcome) => {
                    metrics::counter!("ingest_items_total", "outcome" => outcome.label())
                        .increment(1);
                    match outcome {
                        ItemOutcome::Inserted { .. } => report.inserted += 1,
                        ItemOutcome::Duplicate => report.duplicates += 1,
                        ItemOutcome::Filtered(_) | ItemOutcome::Incomplete => {
                            report.filtered += 1;
                        }
                    }
                }
                Err(e) => {
                    metrics::counter!("ingest_items_total", "outcome" => "failed").increment(1);
                    warn!(
                        event = "item_failed",
                        feed_id = %context.feed_id,
                        link = %link,
                        error = %e,
                        "Skipping feed item"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn process_item(
        &self,
        context: &SourceContext,
        link: &str,
    ) -> Result<ItemOutcome, ItemError> {
        let detail = self.scraper.fetch_detail(link).await?;
        if detail.official_title.is_empty() {
            debug!(link = %link, "Episode page has no official title");
            return Ok(ItemOutcome::Incomplete);
        }

        if let Some(reason) = context
            .filter
            .excluded(&detail.raw_title, &detail.official_title)
        {
            debug!(title = %detail.raw_title, reason = %reason, "Item filtered out");
            return Ok(ItemOutcome::Filtered(reason));
        }

        let parsed = parse_title(&detail.raw_title)?;

        let release_group = if detail.release_group.is_empty() {
            parsed.group.clone()
        } else {
            detail.release_group.clone()
        };

        let decision = context.filter.decide(&FilterInput {
            raw_title: &detail.raw_title,
            official_title: &detail.official_title,
            release_group: &release_group,
            subtitle: &parsed.subtitle,
        });
        if let FilterDecision::Reject { reason } = decision {
            debug!(title = %detail.raw_title, reason = %reason, "Item filtered out");
            return Ok(ItemOutcome::Filtered(reason));
        }

        let torrent_url = if detail.torrent_url.is_empty() {
            detail.magnet_link.clone()
        } else {
            detail.torrent_url.clone()
        };
        if torrent_url.is_empty() {
            debug!(link = %link, "Episode page has no download link");
            return Ok(ItemOutcome::Incomplete);
        }

        let poster = match self.scraper.fetch_poster_url(link).await {
            Some(url) => Some(self.posters.resolve(&url).await),
            None => None,
        };

        let catalog_id = self
            .catalog
            .resolve(&CatalogRequest {
                official_title: detail.official_title.clone(),
                season: parsed.effective_season(),
                year: detail.release_date.as_ref().map(|d| d.year),
                source: context.known_tracker.then(|| SOURCE_TAG.to_string()),
                poster,
            })
            .await?;

        if self
            .store
            .episode_exists(catalog_id, context.feed_id, &torrent_url)
            .await?
        {
            debug!(
                catalog_id = %catalog_id,
                torrent_url = %torrent_url,
                "Episode already recorded"
            );
            return Ok(ItemOutcome::Duplicate);
        }

        let source = if context.known_tracker {
            Some(SOURCE_TAG.to_string())
        } else {
            non_empty(&parsed.source)
        };

        let record = NewEpisodeRecord {
            catalog_id,
            feed_id: context.feed_id,
            title: detail.official_title.clone(),
            episode: parsed.episode.value(),
            resolution: non_empty(&parsed.resolution),
            release_group: non_empty(&release_group),
            subtitle: non_empty(&parsed.subtitle),
            source,
            release_date: detail.release_date.map(|d| d.text),
            torrent_url,
            magnet_link: non_empty(&detail.magnet_link),
            homepage: Some(link.to_string()),
        };

        if !self.store.insert_episode(&record).await? {
            info!(
                catalog_id = %catalog_id,
                torrent_url = %record.torrent_url,
                "Episode inserted concurrently by another worker"
            );
            return Ok(ItemOutcome::Duplicate);
        }

        info!(
            event = "episode_added",
            catalog_id = %catalog_id,
            title = %record.title,
            episode = %parsed.episode,
            group = %release_group,
            "New episode recorded"
        );

        Ok(ItemOutcome::Inserted {
            catalog_id,
            episode: parsed.episode,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
