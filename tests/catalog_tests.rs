//! Integration tests for catalog resolution and episode dedup.

use bangumi_rss::db::{CatalogRequest, NewEpisodeRecord, NewFeedSource, PosterRef, Store};
use bangumi_rss::domain::{CatalogId, FeedId};
use bangumi_rss::services::CatalogResolver;

async fn setup_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("bangumi-catalog-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to create store")
}

fn request(title: &str, season: i32) -> CatalogRequest {
    CatalogRequest {
        official_title: title.to_string(),
        season,
        year: None,
        source: None,
        poster: None,
    }
}

fn poster(link: &str, hash: Option<&str>) -> Option<PosterRef> {
    Some(PosterRef {
        link: link.to_string(),
        hash: hash.map(str::to_string),
    })
}

#[tokio::test]
async fn test_resolve_is_stable_per_title_and_season() {
    let store = setup_store().await;
    let resolver = CatalogResolver::new(store.clone());

    let first = resolver.resolve(&request("葬送的芙莉莲", 1)).await.unwrap();
    let again = resolver.resolve(&request("葬送的芙莉莲", 1)).await.unwrap();
    let zero = resolver.resolve(&request("葬送的芙莉莲", 0)).await.unwrap();
    let second_season = resolver.resolve(&request("葬送的芙莉莲", 2)).await.unwrap();

    assert_eq!(first, again);
    assert_eq!(first, zero);
    assert_ne!(first, second_season);
    assert_eq!(store.list_catalog_entries().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_concurrent_resolves_agree_on_one_entry() {
    let store = setup_store().await;
    let resolver = CatalogResolver::new(store.clone());
    let req = request("新番剧", 1);

    let ids = futures::future::join_all((0..8).map(|_| resolver.resolve(&req))).await;
    let ids: Vec<CatalogId> = ids.into_iter().map(Result::unwrap).collect();

    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(store.list_catalog_entries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_merge_never_loses_year_or_poster() {
    let store = setup_store().await;
    let resolver = CatalogResolver::new(store.clone());

    let id = resolver.resolve(&request("Show", 1)).await.unwrap();

    let mut enrich = request("Show", 1);
    enrich.year = Some(2024);
    enrich.source = Some("mikan".to_string());
    enrich.poster = poster("https://mikanani.me/images/a.jpg", None);
    assert_eq!(resolver.resolve(&enrich).await.unwrap(), id);

    let mut later = request("Show", 1);
    later.year = Some(2019);
    later.source = Some("other".to_string());
    resolver.resolve(&later).await.unwrap();

    let entry = store.get_catalog_entry(id).await.unwrap().unwrap();
    assert_eq!(entry.year, Some(2024));
    assert_eq!(entry.source.as_deref(), Some("mikan"));
    assert_eq!(
        entry.poster_link.as_deref(),
        Some("https://mikanani.me/images/a.jpg")
    );
}

#[tokio::test]
async fn test_poster_replaced_only_when_link_differs() {
    let store = setup_store().await;
    let resolver = CatalogResolver::new(store.clone());

    let mut first = request("Show", 1);
    first.poster = poster("images/posters/aaa.jpg", Some("aaa"));
    let id = resolver.resolve(&first).await.unwrap();
    let created = store.get_catalog_entry(id).await.unwrap().unwrap();

    resolver.resolve(&first).await.unwrap();
    let unchanged = store.get_catalog_entry(id).await.unwrap().unwrap();
    assert_eq!(created.updated_at, unchanged.updated_at);

    let mut replaced = request("Show", 1);
    replaced.poster = poster("images/posters/bbb.jpg", Some("bbb"));
    resolver.resolve(&replaced).await.unwrap();
    let entry = store.get_catalog_entry(id).await.unwrap().unwrap();
    assert_eq!(entry.poster_link.as_deref(), Some("images/posters/bbb.jpg"));
    assert_eq!(entry.poster_hash.as_deref(), Some("bbb"));

    let mut cleared = request("Show", 1);
    cleared.poster = poster("", None);
    resolver.resolve(&cleared).await.unwrap();
    let entry = store.get_catalog_entry(id).await.unwrap().unwrap();
    assert!(entry.poster_link.is_none());
}

#[tokio::test]
async fn test_shared_poster_hash_keeps_entries_apart() {
    let store = setup_store().await;
    let resolver = CatalogResolver::new(store.clone());

    let mut a = request("Show A", 1);
    a.poster = poster("images/posters/same.jpg", Some("same"));
    let mut b = request("Show B", 1);
    b.poster = poster("images/posters/same.jpg", Some("same"));

    let id_a = resolver.resolve(&a).await.unwrap();
    let id_b = resolver.resolve(&b).await.unwrap();
    assert_ne!(id_a, id_b);

    let other = store
        .find_catalog_entry_by_poster_hash("same", id_a)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(CatalogId::new(other.id), id_b);
}

#[tokio::test]
async fn test_episode_dedup_key() {
    let store = setup_store().await;
    let resolver = CatalogResolver::new(store.clone());

    let catalog_id = resolver.resolve(&request("Show", 1)).await.unwrap();
    let feed_id: FeedId = store
        .add_feed_source(&NewFeedSource::tracker("Feed", "https://mikanani.me/RSS/x"))
        .await
        .unwrap();

    let record = NewEpisodeRecord {
        catalog_id,
        feed_id,
        title: "Show".to_string(),
        episode: 1.0,
        resolution: Some("1080p".to_string()),
        release_group: Some("G".to_string()),
        subtitle: None,
        source: Some("mikan".to_string()),
        release_date: None,
        torrent_url: "https://mikanani.me/Download/x.torrent".to_string(),
        magnet_link: None,
        homepage: None,
    };

    let attempts = futures::future::join_all((0..4).map(|_| store.insert_episode(&record))).await;
    let inserted = attempts
        .into_iter()
        .map(Result::unwrap)
        .filter(|inserted| *inserted)
        .count();
    assert_eq!(inserted, 1);

    assert!(!store.insert_episode(&record).await.unwrap());
    assert!(
        store
            .episode_exists(catalog_id, feed_id, &record.torrent_url)
            .await
            .unwrap()
    );

    let mut other_link = record.clone();
    other_link.torrent_url = "https://mikanani.me/Download/y.torrent".to_string();
    assert!(store.insert_episode(&other_link).await.unwrap());

    assert_eq!(store.episode_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_global_settings_created_lazily() {
    let store = setup_store().await;

    let settings = store.get_global_settings().await.unwrap();
    assert!(settings.include_keywords.is_empty());

    store
        .update_global_settings("简体, 1080p", "PV", "BadSubs")
        .await
        .unwrap();
    let settings = store.get_global_settings().await.unwrap();
    assert_eq!(settings.include_keywords, vec!["简体", "1080p"]);
    assert_eq!(settings.exclude_keywords, vec!["PV"]);
    assert_eq!(settings.group_blacklist, vec!["BadSubs"]);
}
