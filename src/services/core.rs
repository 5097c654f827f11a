use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::RwLock;

use crate::models::api_responses::PrefetchStatus;
use crate::models::station::StationCatalogue;
use crate::services::cache::CacheStore;
use crate::utils::config::Config;

/// Idle keep-alive window on the shared upstream connection pool.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything the core owns, constructed once at startup and passed down.
/// Route handlers and the scheduler see it through `Arc<CoreServices>`;
/// nothing here is module-scoped global state.
pub struct CoreServices {
    pub config: Config,
    pub http: reqwest::Client,
    pub catalogue: StationCatalogue,
    pub cache: CacheStore,
    pub prefetch_status: Arc<RwLock<PrefetchStatus>>,
}

impl CoreServices {
    pub fn new(config: Config, catalogue: StationCatalogue) -> Result<Self> {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build()
            .context("Failed to build shared HTTP client")?;

        Ok(Self {
            config,
            http,
            catalogue,
            cache: CacheStore::new(),
            prefetch_status: Arc::new(RwLock::new(PrefetchStatus::default())),
        })
    }
}
