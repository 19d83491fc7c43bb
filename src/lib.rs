pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod parser;
pub mod scheduler;
pub mod services;

use anyhow::Context;
use clap::Parser;
use tokio::signal;

use cli::{Cli, Commands, FeedsCommands, SettingsCommands};
pub use config::Config;
use db::Store;
use scheduler::Scheduler;
use services::IngestService;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        if let Some(port) = config.observability.metrics_port {
            builder
                .with_http_listener(([0, 0, 0, 0], port))
                .install()
                .context("Failed to install Prometheus exporter")?;
        } else {
            builder
                .install_recorder()
                .context("Failed to install Prometheus recorder")?;
        }
    }

    init_tracing(&config)?;

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Daemon => run_daemon(config).await,

        Commands::Check { force } => cli::cmd_check(&config, force).await,

        Commands::Update { feed_id } => cli::cmd_update(&config, feed_id).await,

        Commands::Parse { title, json } => cli::cmd_parse(&title.join(" "), json),

        Commands::Scrape { url, poster } => cli::cmd_scrape(&config, &url, poster).await,

        Commands::Feeds { command } => match command {
            FeedsCommands::List => cli::cmd_feeds_list(&config).await,
            FeedsCommands::Add {
                name,
                url,
                parser,
                interval,
                include,
                exclude,
                priority,
                page_start,
                page_end,
            } => {
                cli::cmd_feeds_add(
                    &config,
                    &name,
                    &url,
                    &parser,
                    interval,
                    &include,
                    &exclude,
                    priority,
                    (page_start, page_end),
                )
                .await
            }
            FeedsCommands::Remove { feed_id } => cli::cmd_feeds_remove(&config, feed_id).await,
        },

        Commands::Settings { command } => match command {
            SettingsCommands::Show => cli::cmd_settings_show(&config).await,
            SettingsCommands::Set {
                include,
                exclude,
                blacklist,
            } => cli::cmd_settings_set(&config, &include, &exclude, &blacklist).await,
        },

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("Config file already exists.");
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest::retry=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key, value)?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "bangumi-rss v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    store.ping().await.context("Database health check failed")?;

    let ingest = IngestService::from_config(store, &config)?;
    let scheduler = Scheduler::new(ingest, config.scheduler.clone());

    let scheduler_handle = {
        let sched = scheduler.clone();
        tokio::spawn(async move {
            if let Err(e) = sched.start().await {
                error!("Scheduler error: {}", e);
            }
        })
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler.stop().await;
    if let Err(e) = scheduler_handle.await {
        error!("Scheduler task ended abnormally: {}", e);
    }
    info!("Daemon stopped");

    Ok(())
}
