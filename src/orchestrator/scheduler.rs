//! Interval-driven cycle runners
//!
//! A runner fires its job once at startup and then on every tick. A tick that
//! finds the previous run still in flight is skipped and logged; nothing is
//! queued and a running job is never cancelled.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use super::{Aggregator, SingleFlight};
use crate::data::Asset;

/// Work performed on each trigger
#[async_trait]
pub trait CycleJob: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    async fn run(&self);
}

/// Full aggregation over a fixed asset list
pub struct AggregationJob {
    aggregator: Arc<Aggregator>,
    assets: Vec<Asset>,
}

impl AggregationJob {
    pub fn new(aggregator: Arc<Aggregator>, assets: Vec<Asset>) -> Self {
        Self { aggregator, assets }
    }
}

#[async_trait]
impl CycleJob for AggregationJob {
    fn name(&self) -> &'static str {
        "aggregation"
    }

    async fn run(&self) {
        self.aggregator.run_cycle(&self.assets).await;
    }
}

/// Price-only refresh
pub struct PriceJob {
    aggregator: Arc<Aggregator>,
    assets: Vec<Asset>,
}

impl PriceJob {
    pub fn new(aggregator: Arc<Aggregator>, assets: Vec<Asset>) -> Self {
        Self { aggregator, assets }
    }
}

#[async_trait]
impl CycleJob for PriceJob {
    fn name(&self) -> &'static str {
        "price"
    }

    async fn run(&self) {
        self.aggregator.refresh_prices(&self.assets).await;
    }
}

pub struct Scheduler<J: CycleJob> {
    job: Arc<J>,
    flight: SingleFlight,
    period: Duration,
    started: Arc<AtomicUsize>,
    skipped: Arc<AtomicUsize>,
}

/// Shortest tick period accepted; `interval_at` rejects a zero period
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Price loop with its own interval and its own in-flight guard
pub type PriceRunner = Scheduler<PriceJob>;

impl Scheduler<AggregationJob> {
    pub fn aggregation(aggregator: Arc<Aggregator>, assets: Vec<Asset>, period: Duration) -> Self {
        Scheduler::new(AggregationJob::new(aggregator, assets), period)
    }
}

impl Scheduler<PriceJob> {
    pub fn prices(aggregator: Arc<Aggregator>, assets: Vec<Asset>, period: Duration) -> Self {
        Scheduler::new(PriceJob::new(aggregator, assets), period)
    }
}

impl<J: CycleJob> Scheduler<J> {
    /// `period` is clamped to at least one millisecond
    pub fn new(job: J, period: Duration) -> Self {
        Self {
            job: Arc::new(job),
            flight: SingleFlight::new(),
            period: period.max(MIN_PERIOD),
            started: Arc::new(AtomicUsize::new(0)),
            skipped: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs started so far
    pub fn started(&self) -> usize {
        self.started.load(Ordering::Relaxed)
    }

    /// Triggers dropped because a run was still in flight
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Start a run in the background unless one is already in flight
    pub fn trigger(&self, reason: &str) -> Option<JoinHandle<()>> {
        let Some(token) = self.flight.try_acquire() else {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            warn!(job = self.job.name(), trigger = reason, "Skipping trigger: previous run still in progress");
            return None;
        };

        self.started.fetch_add(1, Ordering::Relaxed);
        info!(job = self.job.name(), trigger = reason, "Starting run");

        let job = Arc::clone(&self.job);
        Some(tokio::spawn(async move {
            let _token = token;
            job.run().await;
        }))
    }

    /// Run the job once in the foreground
    pub async fn run_once(&self) -> Result<()> {
        match self.trigger("once") {
            Some(handle) => handle.await.context("Run task panicked"),
            None => Ok(()),
        }
    }

    /// Trigger at startup and on every tick until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Trigger at startup and on every tick until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.trigger("startup");

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(job = self.job.name(), interval_secs = self.period.as_secs_f64(), "Scheduler active");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.trigger("interval");
                }
                _ = &mut shutdown => {
                    info!(job = self.job.name(), "Shutdown requested, stopping scheduler");
                    break;
                }
            }
        }
        Ok(())
    }
}
