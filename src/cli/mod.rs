//! Command-line interface for bangumi-rss.

mod commands;

use clap::{Parser, Subcommand};

/// bangumi-rss - Anime release feed ingester
/// Scans tracker feeds and records new episodes into a local catalog
#[derive(Parser)]
#[command(name = "bangumi-rss")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as background daemon with scheduler
    #[command(alias = "-d", alias = "--daemon")]
    Daemon,

    /// Scan all due feed sources once
    #[command(alias = "-c", alias = "--check")]
    Check {
        /// Scan every source regardless of its update interval
        #[arg(long)]
        force: bool,
    },

    /// Scan a single feed source now
    #[command(alias = "u")]
    Update {
        /// Feed source ID
        feed_id: i32,
    },

    /// Parse a raw release title and print the result
    #[command(alias = "p")]
    Parse {
        /// Release title
        #[arg(required = true)]
        title: Vec<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Scrape an episode detail page
    Scrape {
        /// Episode page URL
        url: String,
        /// Also fetch the poster URL
        #[arg(long)]
        poster: bool,
    },

    /// Manage feed sources
    Feeds {
        #[command(subcommand)]
        command: FeedsCommands,
    },

    /// Show or change global filter settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[derive(Subcommand)]
pub enum FeedsCommands {
    /// List feed sources
    #[command(alias = "ls")]
    List,
    /// Add a feed source
    Add {
        /// Display name
        name: String,
        /// Feed URL
        url: String,
        /// Parser kind (tracker)
        #[arg(long, default_value = "tracker")]
        parser: String,
        /// Hours between scans
        #[arg(long, default_value = "1")]
        interval: i32,
        /// Comma-separated include keywords
        #[arg(long, default_value = "")]
        include: String,
        /// Comma-separated exclude keywords
        #[arg(long, default_value = "")]
        exclude: String,
        /// Higher priority sources are listed first
        #[arg(long, default_value = "0")]
        priority: i32,
        /// First feed page to fetch
        #[arg(long)]
        page_start: Option<i32>,
        /// Last feed page to fetch
        #[arg(long)]
        page_end: Option<i32>,
    },
    /// Remove a feed source
    #[command(alias = "rm")]
    Remove {
        /// Feed source ID
        feed_id: i32,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show global filter settings
    Show,
    /// Replace global filter settings
    Set {
        /// Comma-separated include keywords
        #[arg(long, default_value = "")]
        include: String,
        /// Comma-separated exclude keywords
        #[arg(long, default_value = "")]
        exclude: String,
        /// Comma-separated release group blacklist
        #[arg(long, default_value = "")]
        blacklist: String,
    },
}

pub use commands::*;
