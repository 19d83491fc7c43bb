use crate::clients::{Fetch, HttpClient, MikanScraper};
use crate::config::Config;
use crate::parser::parse_title;
use std::sync::Arc;

pub async fn cmd_scrape(config: &Config, url: &str, poster: bool) -> anyhow::Result<()> {
    let fetcher: Arc<dyn Fetch> = Arc::new(HttpClient::from_config(&config.http)?);
    let scraper = MikanScraper::new(fetcher);

    let detail = scraper.fetch_detail(url).await?;

    println!("Official title: {}", detail.official_title);
    println!("Release group:  {}", detail.release_group);
    println!("Raw title:      {}", detail.raw_title);
    if let Some(date) = &detail.release_date {
        println!("Published:      {} ({})", date.text, date.year);
    }
    println!("Torrent:        {}", detail.torrent_url);
    println!("Magnet:         {}", detail.magnet_link);

    match parse_title(&detail.raw_title) {
        Ok(parsed) => println!(
            "Parsed:         S{} E{} {} {}",
            parsed.effective_season(),
            parsed.episode,
            parsed.resolution,
            parsed.subtitle
        ),
        Err(e) => println!("Parsed:         ✗ {e}"),
    }

    if poster {
        match scraper.fetch_poster_url(url).await {
            Some(link) => println!("Poster:         {link}"),
            None => println!("Poster:         -"),
        }
    }

    Ok(())
}
