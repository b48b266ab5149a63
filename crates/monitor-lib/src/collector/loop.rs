//! Host collection loop
//!
//! Periodically samples the host, records every sample in the metric store
//! and runs the threshold check on it. Interval ticks carry jitter so several
//! monitors on one machine do not sample in lockstep.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::time::{interval, Instant};
use tracing::{debug, info, warn};

use crate::health::{components, HealthRegistry};
use crate::models::Sample;
use crate::service::{MonitorError, MonitorService};
use crate::store::StoreError;

/// Configuration for the collection loop
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Base collection interval (default: 10 seconds)
    pub interval: Duration,
    /// Maximum jitter to add to interval (default: 1 second)
    pub jitter: Duration,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            jitter: Duration::from_secs(1),
        }
    }
}

/// Results from a collection cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleResults {
    pub samples_recorded: usize,
    pub alerts_raised: usize,
    pub errors: usize,
}

/// Loop that feeds host samples into the monitor service
pub struct CollectionLoop {
    service: Arc<MonitorService>,
    health: Option<HealthRegistry>,
    config: CollectionConfig,
}

impl CollectionLoop {
    pub fn new(
        service: Arc<MonitorService>,
        health: Option<HealthRegistry>,
        config: CollectionConfig,
    ) -> Self {
        Self {
            service,
            health,
            config,
        }
    }

    /// Run until a shutdown signal arrives
    pub async fn run(self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "Starting host collection loop"
        );

        let mut ticker = interval(self.current_interval());
        let mut cycles = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let results = self.collect_once().await;
                    cycles += 1;

                    if cycles % 6 == 0 {
                        debug!(
                            samples = results.samples_recorded,
                            alerts = results.alerts_raised,
                            errors = results.errors,
                            "Collection cycle complete"
                        );
                    }

                    ticker = interval(self.current_interval());
                    // the first tick of a fresh interval fires immediately
                    ticker.tick().await;
                }
                _ = shutdown.recv() => {
                    info!("Shutting down host collection loop");
                    break;
                }
            }
        }
    }

    fn current_interval(&self) -> Duration {
        let jitter_ms = rand_jitter(self.config.jitter.as_millis() as u64);
        self.config.interval + Duration::from_millis(jitter_ms)
    }

    /// Run one collection cycle.
    ///
    /// Core metrics and disks are sampled independently, so a failure of one
    /// still records the other.
    pub async fn collect_once(&self) -> CycleResults {
        let start = Instant::now();
        let mut results = CycleResults::default();

        let service = self.service.clone();
        let collected = tokio::task::spawn_blocking(move || {
            let collector = service.collector();
            (collector.collect(), collector.list_disks())
        })
        .await;

        let (core, disks) = match collected {
            Ok(outcomes) => outcomes,
            Err(e) => {
                self.collection_failed(&format!("collector task failed: {e}"))
                    .await;
                results.errors += 1;
                return results;
            }
        };

        let mut samples: Vec<Sample> = Vec::new();
        let mut failures = Vec::new();
        match core {
            Ok(core) => samples.extend(core),
            Err(e) => failures.push(e.to_string()),
        }
        match disks {
            Ok(disks) => {
                let now = Utc::now();
                samples.extend(disks.iter().map(|d| d.to_sample(now)));
            }
            Err(e) => failures.push(e.to_string()),
        }

        if failures.is_empty() {
            self.report_health(components::COLLECTOR, Ok(())).await;
        } else {
            results.errors += failures.len();
            self.collection_failed(&failures.join("; ")).await;
        }

        let mut store_failed = false;
        for sample in samples {
            let component = sample.component.clone();
            match self.service.ingest(sample) {
                Ok(decision) => {
                    results.samples_recorded += 1;
                    if decision.is_some_and(|d| d.need_alert) {
                        results.alerts_raised += 1;
                    }
                }
                Err(e) => {
                    results.errors += 1;
                    warn!(component = %component, error = %e, "Failed to record sample");
                    if let MonitorError::Store(err) = &e {
                        store_failed = true;
                        self.store_failed(err).await;
                    }
                }
            }
        }

        if results.samples_recorded > 0 && !store_failed {
            self.report_health(components::METRIC_STORE, Ok(())).await;
        }

        self.service
            .metrics()
            .observe_collection_latency(start.elapsed().as_secs_f64());
        results
    }

    async fn collection_failed(&self, error: &str) {
        self.service.metrics().inc_collection_errors();
        self.service.logger().log_collection_failure(error);
        self.report_health(components::COLLECTOR, Err(error.to_string()))
            .await;
    }

    async fn store_failed(&self, error: &StoreError) {
        let Some(health) = &self.health else {
            return;
        };

        if error.is_unrecoverable() {
            health
                .set_unhealthy(components::METRIC_STORE, error.to_string())
                .await;
        } else {
            health
                .report(components::METRIC_STORE, &Err::<(), _>(error))
                .await;
        }
    }

    async fn report_health(&self, component: &str, outcome: Result<(), String>) {
        if let Some(health) = &self.health {
            health.report(component, &outcome).await;
        }
    }
}

/// Generate a random jitter value between 0 and max_ms
fn rand_jitter(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }

    // clock nanoseconds are spread enough for jitter
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;

    now % max_ms
}

/// Builder for creating the collection loop
pub struct CollectionLoopBuilder {
    service: Option<Arc<MonitorService>>,
    health: Option<HealthRegistry>,
    config: CollectionConfig,
}

impl CollectionLoopBuilder {
    pub fn new() -> Self {
        Self {
            service: None,
            health: None,
            config: CollectionConfig::default(),
        }
    }

    /// Set the monitor service samples are fed into
    pub fn service(mut self, service: Arc<MonitorService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Report collector and store health to this registry
    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.config.jitter = jitter;
        self
    }

    pub fn build(self) -> Result<CollectionLoop> {
        let service = self
            .service
            .ok_or_else(|| anyhow::anyhow!("Monitor service is required"))?;
        if self.config.interval.is_zero() {
            anyhow::bail!("Collection interval must be greater than zero");
        }

        Ok(CollectionLoop::new(service, self.health, self.config))
    }
}

impl Default for CollectionLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
