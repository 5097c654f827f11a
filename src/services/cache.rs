use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::errors::CoreError;
use crate::models::{Envelope, Forecast, Observation};

/// The three value families the store holds. Entries are shared out as
/// `Arc`s; the store exclusively owns the map itself.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Observation(Arc<Observation>),
    Forecast(Arc<Forecast>),
    Envelope(Arc<Envelope>),
}

impl CachedValue {
    pub fn into_observation(self) -> Option<Arc<Observation>> {
        match self {
            CachedValue::Observation(o) => Some(o),
            _ => None,
        }
    }

    pub fn into_forecast(self) -> Option<Arc<Forecast>> {
        match self {
            CachedValue::Forecast(f) => Some(f),
            _ => None,
        }
    }

    pub fn into_envelope(self) -> Option<Arc<Envelope>> {
        match self {
            CachedValue::Envelope(e) => Some(e),
            _ => None,
        }
    }
}

type FillResult = Result<CachedValue, CoreError>;

struct Entry {
    value: CachedValue,
    expires_at: Instant,
}

struct Inner {
    entries: HashMap<String, Entry>,
    inflight: HashMap<String, broadcast::Sender<FillResult>>,
}

/// In-process keyed TTL store with single-flight fills.
///
/// A stale entry is indistinguishable from a miss. Concurrent `get_or_fill`
/// calls on one key coalesce to a single producer invocation; calls on
/// different keys proceed independently. Producer failures reach every
/// coalesced waiter and are never cached.
pub struct CacheStore {
    inner: Mutex<Inner>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

enum Role {
    Leader(broadcast::Sender<FillResult>),
    Waiter(broadcast::Receiver<FillResult>),
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                inflight: HashMap::new(),
            }),
        }
    }

    /// Fresh read or nothing. Expired entries are dropped on the way out.
    pub fn get(&self, key: &str) -> Option<CachedValue> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                inner.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Unconditional write with an absolute expiry of `now + ttl`.
    pub fn put(&self, key: &str, value: CachedValue, ttl: Duration) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Atomically: return a fresh entry, or join an in-flight fill, or run
    /// `producer` and publish its result to every waiter. Only a success is
    /// stored. If the filling caller is cancelled mid-flight the slot is
    /// released and one of the waiters takes over as the new filler.
    pub async fn get_or_fill<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> FillResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FillResult>,
    {
        let mut producer = Some(producer);

        loop {
            let role = {
                let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(entry) = inner.entries.get(key) {
                    if entry.expires_at > Instant::now() {
                        return Ok(entry.value.clone());
                    }
                    inner.entries.remove(key);
                }
                match inner.inflight.get(key) {
                    Some(tx) => Role::Waiter(tx.subscribe()),
                    None => {
                        let (tx, _) = broadcast::channel(1);
                        inner.inflight.insert(key.to_string(), tx.clone());
                        Role::Leader(tx)
                    }
                }
            };

            match role {
                Role::Waiter(mut rx) => {
                    debug!("Awaiting in-flight fill for key '{}'", key);
                    match rx.recv().await {
                        Ok(result) => return result,
                        // The filler was cancelled before publishing; loop
                        // and contend for the slot ourselves.
                        Err(_) => continue,
                    }
                }
                Role::Leader(tx) => {
                    let Some(producer) = producer.take() else {
                        return Err(CoreError::Internal(format!(
                            "cache fill for '{}' attempted to run its producer twice",
                            key
                        )));
                    };

                    let guard = InflightGuard {
                        store: self,
                        key: key.to_string(),
                        armed: true,
                    };
                    let result = producer().await;
                    guard.complete(&result, ttl);
                    let _ = tx.send(result.clone());
                    return result;
                }
            }
        }
    }

    /// Drop every entry. In-flight fills are left alone; they will publish
    /// into an empty map.
    pub fn purge(&self) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let cleared = inner.entries.len();
        inner.entries.clear();
        info!("Cache purged, {} entries dropped", cleared);
        cleared
    }

    /// Count of currently fresh entries.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        inner
            .entries
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases the in-flight slot if the filling future is dropped before it
/// publishes, so waiters are not stranded and nothing negative is cached.
struct InflightGuard<'a> {
    store: &'a CacheStore,
    key: String,
    armed: bool,
}

impl InflightGuard<'_> {
    fn complete(mut self, result: &FillResult, ttl: Duration) {
        let mut inner = self
            .store
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        inner.inflight.remove(&self.key);
        if let Ok(value) = result {
            inner.entries.insert(
                self.key.clone(),
                Entry {
                    value: value.clone(),
                    expires_at: Instant::now() + ttl,
                },
            );
        }
        self.armed = false;
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut inner = self
                .store
                .inner
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            inner.inflight.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observation::*;
    use chrono::{TimeZone, Timelike, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn observation(minute: u32) -> CachedValue {
        CachedValue::Observation(Arc::new(Observation {
            time: Utc.with_ymd_and_hms(2026, 8, 1, 12, minute, 0).unwrap(),
            wind: WindObservation {
                direction: None,
                speed: None,
                gust: None,
                condition: None,
            },
            waves: WaveObservation {
                height: None,
                dominant_period: None,
                average_period: None,
                direction: None,
                swell: None,
                wind_wave: None,
                steepness: None,
                dominant_partition: None,
            },
            atmosphere: Atmosphere {
                pressure: None,
                air_temp: None,
                water_temp: None,
                dew_point: None,
            },
            trend: None,
            summary: None,
        }))
    }

    fn obs_time(value: &CachedValue) -> chrono::DateTime<Utc> {
        match value {
            CachedValue::Observation(o) => o.time,
            _ => panic!("expected observation"),
        }
    }

    #[tokio::test]
    async fn get_returns_only_fresh_entries() {
        let cache = CacheStore::new();
        cache.put("obs:46042", observation(26), Duration::from_millis(20));
        assert!(cache.get("obs:46042").is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("obs:46042").is_none(), "stale read must be a miss");
    }

    #[tokio::test]
    async fn get_or_fill_runs_producer_on_miss_and_caches() {
        let cache = CacheStore::new();
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let value = cache
            .get_or_fill("obs:46042", Duration::from_secs(60), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(observation(26))
            })
            .await
            .unwrap();
        assert_eq!(obs_time(&value).to_rfc3339(), "2026-08-01T12:26:00+00:00");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Second call is a hit; producer not invoked again
        let _ = cache
            .get_or_fill("obs:46042", Duration::from_secs(60), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(observation(56))
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stampede_coalesces_to_one_producer_invocation() {
        let cache = Arc::new(CacheStore::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..100 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fill("env:46042", Duration::from_secs(60), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(observation(26))
                    })
                    .await
            }));
        }

        let mut times = Vec::new();
        for handle in handles {
            let value = handle.await.unwrap().unwrap();
            times.push(obs_time(&value));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1, "exactly one fill");
        assert!(times.windows(2).all(|w| w[0] == w[1]), "all callers share the fill");
    }

    #[tokio::test]
    async fn producer_error_reaches_all_waiters_and_is_not_cached() {
        let cache = Arc::new(CacheStore::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fill("obs:46042", Duration::from_secs(60), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Err(CoreError::UpstreamUnavailable("feed down".to_string()))
                    })
                    .await
            }));
        }

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(matches!(result, Err(CoreError::UpstreamUnavailable(_))));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.get("obs:46042").is_none(), "failures are never cached");
    }

    #[tokio::test]
    async fn fills_on_different_keys_run_in_parallel() {
        let cache = Arc::new(CacheStore::new());
        let started = Instant::now();

        let a = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fill("obs:46042", Duration::from_secs(60), || async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(observation(26))
                    })
                    .await
            })
        };
        let b = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fill("obs:46047", Duration::from_secs(60), || async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(observation(56))
                    })
                    .await
            })
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();
        assert!(
            started.elapsed() < Duration::from_millis(190),
            "independent keys must not serialize"
        );
    }

    #[tokio::test]
    async fn cancelled_fill_releases_the_slot() {
        let cache = Arc::new(CacheStore::new());

        let leader = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fill("fcst:33.0000_242.5000", Duration::from_secs(60), || async {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        Ok(observation(26))
                    })
                    .await
            })
        };

        // Let the leader take the slot, then cancel it
        tokio::time::sleep(Duration::from_millis(20)).await;
        leader.abort();
        let _ = leader.await;

        // A fresh caller becomes the new leader instead of hanging
        let value = tokio::time::timeout(
            Duration::from_secs(1),
            cache.get_or_fill("fcst:33.0000_242.5000", Duration::from_secs(60), || async {
                Ok(observation(56))
            }),
        )
        .await
        .expect("slot was not released")
        .unwrap();
        assert_eq!(obs_time(&value).minute(), 56);
    }

    #[tokio::test]
    async fn purge_drops_everything() {
        let cache = CacheStore::new();
        cache.put("obs:1", observation(26), Duration::from_secs(60));
        cache.put("obs:2", observation(56), Duration::from_secs(60));
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.purge(), 2);
        assert!(cache.is_empty());
        assert!(cache.get("obs:1").is_none());
    }
}
