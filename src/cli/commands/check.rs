//! One-off scan commands

use crate::config::Config;
use crate::db::Store;
use crate::domain::FeedId;
use crate::services::{IngestService, SourceReport};

pub async fn cmd_check(config: &Config, force: bool) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let ingest = IngestService::from_config(store, config)?;

    println!("Scanning feed sources{}...", if force { " (forced)" } else { "" });
    let report = ingest.update_all(force).await?;

    if report.sources.is_empty() && report.failures.is_empty() {
        println!("No feed source is due.");
        return Ok(());
    }

    println!("{:-<70}", "");
    for source in &report.sources {
        print_source(source);
    }
    for failure in &report.failures {
        println!("✗ [{}] {}: {}", failure.feed_id, failure.name, failure.error);
    }
    println!("{:-<70}", "");
    println!("✓ {} new episodes", report.inserted());

    Ok(())
}

pub async fn cmd_update(config: &Config, feed_id: i32) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let ingest = IngestService::from_config(store, config)?;

    let report = ingest.update_one(FeedId::new(feed_id)).await?;
    print_source(&report);

    Ok(())
}

fn print_source(report: &SourceReport) {
    println!("• [{}] {}", report.feed_id, report.name);
    println!(
        "  Pages: {} ({} failed) | Items: {} | New: {} | Duplicates: {} | Filtered: {} | Failed: {}",
        report.pages,
        report.pages_failed,
        report.items,
        report.inserted,
        report.duplicates,
        report.filtered,
        report.failed
    );
}
