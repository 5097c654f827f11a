use serde::Serialize;

use crate::models::station::Station;

/// Snapshot of the bulk prefetcher, surfaced on the health and status
/// endpoints. Readers always get a clone; the running cycle is the only
/// writer.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefetchStatus {
    pub running: bool,
    #[serde(rename = "lastCycle", skip_serializing_if = "Option::is_none")]
    pub last_cycle: Option<PrefetchCycleSummary>,
    /// Set while the scheduler is in its recovery window after a cycle
    /// that produced nothing; cleared by the next successful cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefetchCycleSummary {
    pub started: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub stations: usize,
    pub cache_entries: usize,
    pub prefetch: PrefetchStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeResponse {
    pub success: bool,
    pub cleared: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestStationResponse {
    pub station: Station,
    pub distance_km: f64,
}
