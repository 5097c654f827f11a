use std::sync::Arc;

use actix_web::{get, web, HttpRequest, HttpResponse, Result};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::error_response;
use crate::models::api_responses::NearestStationResponse;
use crate::services::aggregator;
use crate::services::CoreServices;

/// GET /api/stations - Full catalogue as GeoJSON
#[get("/stations")]
pub async fn get_stations(core: web::Data<Arc<CoreServices>>) -> Result<HttpResponse> {
    info!("Request for station catalogue");
    Ok(HttpResponse::Ok().json(core.catalogue.to_feature_collection()))
}

#[derive(Debug, Deserialize)]
pub struct NearestQuery {
    lat: f64,
    lon: f64,
}

/// GET /api/stations/nearest?lat=..&lon=.. - Closest station by great circle
#[get("/stations/nearest")]
pub async fn get_nearest_station(
    query: web::Query<NearestQuery>,
    core: web::Data<Arc<CoreServices>>,
) -> Result<HttpResponse> {
    let (lat, lon) = (query.lat, query.lon);
    info!("Nearest-station request for ({}, {})", lat, lon);

    if !lat.is_finite() || !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "lat must be in [-90, 90] and lon finite"
        })));
    }

    match core.catalogue.nearest(lat, lon) {
        Some((station, distance_km)) => Ok(HttpResponse::Ok().json(NearestStationResponse {
            station: station.clone(),
            distance_km,
        })),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Station catalogue is empty"
        }))),
    }
}

/// GET /api/stations/{id} - The merged conditions envelope for one station
#[get("/stations/{id}")]
pub async fn get_station(
    req: HttpRequest,
    path: web::Path<String>,
    core: web::Data<Arc<CoreServices>>,
) -> Result<HttpResponse> {
    let station_id = path.into_inner();
    info!("Request for station {}", station_id);

    match aggregator::get_station(core.get_ref(), &station_id).await {
        Ok(envelope) => Ok(HttpResponse::Ok().json(&*envelope)),
        Err(e) => {
            error!("Failed to build envelope for {}: {}", station_id, e);
            Ok(error_response(&req, &e))
        }
    }
}
