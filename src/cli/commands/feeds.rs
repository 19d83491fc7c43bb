//! Feed source management commands

use crate::config::Config;
use crate::db::{NewFeedSource, Store};
use crate::domain::FeedId;
use crate::models::ParserKind;

pub async fn cmd_feeds_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let feeds = store.list_feed_sources().await?;

    if feeds.is_empty() {
        println!("No feed sources configured.");
        println!();
        println!("Add one with: bangumi-rss feeds add <name> <url>");
        return Ok(());
    }

    println!("Feed Sources ({} total)", feeds.len());
    println!("{:-<70}", "");

    for feed in feeds {
        let (start, end) = feed.page_range();
        let last = feed
            .last_updated
            .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());

        println!("[{}] {} ({})", feed.id, feed.name, feed.parser_kind);
        println!("    URL: {}", feed.url);
        println!(
            "    Every {}h | Pages {}-{} | Priority {} | Last scan: {}",
            feed.update_interval_hours, start, end, feed.priority, last
        );
        if !feed.include_keywords.is_empty() {
            println!("    Include: {}", feed.include_keywords.join(", "));
        }
        if !feed.exclude_keywords.is_empty() {
            println!("    Exclude: {}", feed.exclude_keywords.join(", "));
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn cmd_feeds_add(
    config: &Config,
    name: &str,
    url: &str,
    parser: &str,
    interval: i32,
    include: &str,
    exclude: &str,
    priority: i32,
    pages: (Option<i32>, Option<i32>),
) -> anyhow::Result<()> {
    let kind = match parser.parse::<ParserKind>() {
        Ok(ParserKind::Tracker) => ParserKind::Tracker,
        Ok(other) => {
            println!("Parser kind '{other}' is not supported yet.");
            return Ok(());
        }
        Err(unknown) => {
            println!("Unknown parser kind: {unknown}");
            return Ok(());
        }
    };

    if url::Url::parse(url).is_err() {
        println!("Invalid feed URL: {url}");
        return Ok(());
    }

    let store = Store::new(&config.general.database_path).await?;
    let feed = NewFeedSource {
        name: name.to_string(),
        url: url.to_string(),
        parser_kind: kind.as_str().to_string(),
        update_interval_hours: interval.max(1),
        include_keywords: include.to_string(),
        exclude_keywords: exclude.to_string(),
        priority,
        page_start: pages.0,
        page_end: pages.1,
    };

    let id = store.add_feed_source(&feed).await?;

    println!("✓ Added feed source #{id}");
    println!("  Name: {name}");
    println!("  URL: {url}");
    println!();
    println!("Run 'bangumi-rss update {id}' to scan it now.");

    Ok(())
}

pub async fn cmd_feeds_remove(config: &Config, feed_id: i32) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    if store.remove_feed_source(FeedId::new(feed_id)).await? {
        println!("✓ Removed feed source #{feed_id}");
    } else {
        println!("Feed source #{feed_id} not found.");
    }

    Ok(())
}
