use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::{Notify, RwLock};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::config::SchedulerConfig;
use crate::services::{IngestService, ScanReport};

/// Periodically scans all due feed sources.
#[derive(Clone)]
pub struct Scheduler {
    ingest: IngestService,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
    stop: Arc<Notify>,
}

impl Scheduler {
    #[must_use]
    pub fn new(ingest: IngestService, config: SchedulerConfig) -> Self {
        Self {
            ingest,
            config,
            running: Arc::new(RwLock::new(false)),
            stop: Arc::new(Notify::new()),
        }
    }

    /// Runs until [`Self::stop`] is called.
    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        let result = if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        };

        *self.running.write().await = false;
        result
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let ingest = self.ingest.clone();
        let running = Arc::clone(&self.running);
        let scanning = Arc::new(AtomicBool::new(false));

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let ingest = ingest.clone();
            let running = Arc::clone(&running);
            let scanning = Arc::clone(&scanning);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                if scanning.swap(true, Ordering::SeqCst) {
                    warn!(
                        event = "job_skipped",
                        job_name = "scan_feeds",
                        "Previous scan still running"
                    );
                    return;
                }
                run_scan(&ingest).await;
                scanning.store(false, Ordering::SeqCst);
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        self.stop.notified().await;

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let tick_secs = self.config.tick_seconds.max(1);
        info!("Scheduler running every {} seconds", tick_secs);

        let mut ticker = interval(Duration::from_secs(tick_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !*self.running.read().await {
                        break;
                    }
                    run_scan(&self.ingest).await;
                }
                () = self.stop.notified() => break,
            }
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
        self.stop.notify_one();
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Runs a single scan outside the schedule.
    pub async fn run_once(&self, force: bool) -> Result<ScanReport> {
        info!("Running manual scan...");
        Ok(self.ingest.update_all(force).await?)
    }
}

async fn run_scan(ingest: &IngestService) {
    let start = Instant::now();
    info!(
        event = "job_started",
        job_name = "scan_feeds",
        "Starting scheduled feed scan"
    );

    match ingest.update_all(false).await {
        Ok(report) => info!(
            event = "job_finished",
            job_name = "scan_feeds",
            sources = report.sources.len(),
            inserted = report.inserted(),
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Scheduled feed scan finished"
        ),
        Err(e) => error!(
            event = "job_failed",
            job_name = "scan_feeds",
            error = %e,
            "Scheduled feed scan failed"
        ),
    }
}
