use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse, Result};
use tracing::info;

use crate::models::api_responses::{HealthResponse, PurgeResponse};
use crate::services::CoreServices;

/// GET /health - Readiness plus the prefetch status snapshot
#[get("/health")]
pub async fn health(core: web::Data<Arc<CoreServices>>) -> Result<HttpResponse> {
    let prefetch = core.prefetch_status.read().await.clone();
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        stations: core.catalogue.len(),
        cache_entries: core.cache.len(),
        prefetch,
    }))
}

/// GET /api/prefetch/status - The prefetch status snapshot alone
#[get("/prefetch/status")]
pub async fn get_prefetch_status(core: web::Data<Arc<CoreServices>>) -> Result<HttpResponse> {
    let status = core.prefetch_status.read().await.clone();
    Ok(HttpResponse::Ok().json(status))
}

/// POST /api/cache/purge - Operational escape hatch: drop every entry
#[post("/cache/purge")]
pub async fn purge_cache(core: web::Data<Arc<CoreServices>>) -> Result<HttpResponse> {
    let cleared = core.cache.purge();
    info!("Cache purge requested, {} entries dropped", cleared);
    Ok(HttpResponse::Ok().json(PurgeResponse {
        success: true,
        cleared,
    }))
}
