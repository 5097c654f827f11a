use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::models::api_responses::PrefetchCycleSummary;
use crate::models::station::Station;
use crate::services::aggregator;
use crate::services::cadence::{
    seconds_until_next_cycle_available, seconds_until_next_observation,
};
use crate::services::core::CoreServices;

/// Stations per batch.
pub const BATCH_SIZE: usize = 5;

/// Batches in flight per wave; effective parallelism is 3 × 5 = 15.
pub const CONCURRENT_BATCHES: usize = 3;

/// Mandatory pause between waves, as upstream backpressure.
pub const WAVE_DELAY: Duration = Duration::from_millis(1000);

/// Skip a station when a planned TTL is under this; the entry would expire
/// before it earns its keep and the next cycle refills it anyway.
pub const SKIP_AHEAD_SECS: i64 = 300;

enum StationOutcome {
    Filled,
    Skipped,
    Failed(String),
}

/// Walks the in-grid station catalogue in bounded-concurrency waves,
/// filling the cache ahead of client requests. Partial success is the
/// normal outcome; progress lands in the shared status snapshot.
pub struct Prefetcher {
    core: Arc<CoreServices>,
}

impl Prefetcher {
    pub fn new(core: Arc<CoreServices>) -> Self {
        Self { core }
    }

    /// One full pass over the catalogue. There is no second pass and no
    /// halt on error; failures are recorded and the cycle moves on. Partial
    /// success is the normal outcome. A cycle that produced nothing at all
    /// (every station failed, none skipped) returns an error so the caller
    /// can retry sooner than the next model run.
    pub async fn run_cycle(&self) -> anyhow::Result<()> {
        let stations: Vec<Station> = self
            .core
            .catalogue
            .stations()
            .iter()
            .filter(|s| s.in_forecast_grid)
            .cloned()
            .collect();

        info!(
            "Prefetch cycle starting: {} stations in forecast grids (of {})",
            stations.len(),
            self.core.catalogue.len()
        );

        {
            let mut status = self.core.prefetch_status.write().await;
            status.last_cycle = Some(PrefetchCycleSummary {
                started: Utc::now().to_rfc3339(),
                completed: None,
                total: stations.len(),
                succeeded: 0,
                failed: 0,
                skipped: 0,
                errors: Vec::new(),
                last_updated: Utc::now().to_rfc3339(),
            });
        }

        let batches: Vec<&[Station]> = stations.chunks(BATCH_SIZE).collect();
        let waves: Vec<&[&[Station]]> = batches.chunks(CONCURRENT_BATCHES).collect();
        let wave_count = waves.len();

        for (i, wave) in waves.into_iter().enumerate() {
            let now = Utc::now();
            let outcomes = join_all(wave.iter().map(|batch| {
                join_all(batch.iter().map(|station| self.prefetch_station(station, now)))
            }))
            .await;

            self.record_outcomes(outcomes.into_iter().flatten()).await;

            if i + 1 < wave_count {
                tokio::time::sleep(WAVE_DELAY).await;
            }
        }

        let summary = {
            let mut status = self.core.prefetch_status.write().await;
            if let Some(cycle) = status.last_cycle.as_mut() {
                cycle.completed = Some(Utc::now().to_rfc3339());
                cycle.last_updated = Utc::now().to_rfc3339();
            }
            status.last_cycle.clone()
        };

        if let Some(s) = summary {
            info!(
                "Prefetch cycle complete: {} filled, {} failed, {} skipped of {}",
                s.succeeded, s.failed, s.skipped, s.total
            );
            if s.total > 0 && s.succeeded == 0 && s.skipped == 0 {
                anyhow::bail!("prefetch cycle failed for all {} stations", s.total);
            }
        }

        Ok(())
    }

    /// Fill one station's observation and forecast entries through the
    /// aggregator's read-through path.
    async fn prefetch_station(&self, station: &Station, now: DateTime<Utc>) -> StationOutcome {
        let obs_ttl = seconds_until_next_observation(now);
        let fcst_ttl = seconds_until_next_cycle_available(now);
        if obs_ttl < SKIP_AHEAD_SECS || fcst_ttl < SKIP_AHEAD_SECS {
            debug!(
                "Skipping {}: planned TTLs {}s/{}s are about to expire",
                station.id, obs_ttl, fcst_ttl
            );
            return StationOutcome::Skipped;
        }

        match aggregator::fill_station(&self.core, station).await {
            Ok(_) => StationOutcome::Filled,
            Err(e) => {
                warn!("Prefetch failed for station {}: {}", station.id, e);
                StationOutcome::Failed(format!("{}: {}", station.id, e))
            }
        }
    }

    async fn record_outcomes(&self, outcomes: impl Iterator<Item = StationOutcome>) {
        let mut status = self.core.prefetch_status.write().await;
        let Some(cycle) = status.last_cycle.as_mut() else {
            return;
        };
        for outcome in outcomes {
            match outcome {
                StationOutcome::Filled => cycle.succeeded += 1,
                StationOutcome::Skipped => cycle.skipped += 1,
                StationOutcome::Failed(msg) => {
                    cycle.failed += 1;
                    cycle.errors.push(msg);
                }
            }
        }
        cycle.last_updated = Utc::now().to_rfc3339();
    }
}
