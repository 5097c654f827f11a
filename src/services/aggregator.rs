use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::envelope::{Envelope, ForecastErrorStub, ForecastSection, Units};
use crate::models::observation::Observation;
use crate::models::station::Station;
use crate::services::buoy;
use crate::services::cache::CachedValue;
use crate::services::cadence::{
    clamp_ttl, seconds_until_next_cycle_available, seconds_until_next_observation,
};
use crate::services::core::CoreServices;
use crate::services::gfswave;
use crate::services::grid::normalize_longitude;

/// Hard deadline on the observation fill within a request.
pub const OBSERVATION_DEADLINE: Duration = Duration::from_secs(10);

/// Hard deadline on the forecast fill within a request.
pub const FORECAST_DEADLINE: Duration = Duration::from_secs(20);

pub fn observation_key(station_id: &str) -> String {
    format!("obs:{}", station_id)
}

pub fn forecast_key(lat: f64, lon: f64) -> String {
    format!("fcst:{:.4}_{:.4}", lat, normalize_longitude(lon))
}

pub fn envelope_key(station_id: &str) -> String {
    format!("env:{}", station_id)
}

/// The per-station read path: serve the cached envelope when fresh,
/// otherwise fill it.
pub async fn get_station(
    core: &CoreServices,
    station_id: &str,
) -> Result<Arc<Envelope>, CoreError> {
    let station = core
        .catalogue
        .get(station_id)
        .ok_or_else(|| CoreError::NotFound(format!("unknown station {}", station_id)))?;

    if let Some(cached) = core.cache.get(&envelope_key(station_id)) {
        if let Some(envelope) = cached.into_envelope() {
            debug!("Envelope cache hit for station {}", station_id);
            return Ok(envelope);
        }
    }

    fill_station(core, station).await
}

/// Fill the observation and forecast entries for a station and cache the
/// composed envelope. Shared by client misses and the bulk prefetcher.
///
/// The two fetches run concurrently under their own hard deadlines. A buoy
/// failure is fatal to the envelope; a forecast failure degrades to an
/// error stub. Stations outside every model grid never reach the forecast
/// fetcher and their envelopes omit the forecast entirely.
pub async fn fill_station(
    core: &CoreServices,
    station: &Station,
) -> Result<Arc<Envelope>, CoreError> {
    let now = Utc::now();
    let obs_ttl = Duration::from_secs(clamp_ttl(seconds_until_next_observation(now)) as u64);
    let fcst_ttl =
        Duration::from_secs(clamp_ttl(seconds_until_next_cycle_available(now)) as u64);

    let obs_fut = fill_observation(core, station, obs_ttl);
    let fcst_fut = fill_forecast(core, station, fcst_ttl, now);
    let (obs_result, fcst_result) = tokio::join!(obs_fut, fcst_fut);

    let observation = obs_result?;

    let forecast = match fcst_result {
        None => None,
        Some(Ok(forecast)) => Some(ForecastSection::Ready((*forecast).clone())),
        Some(Err(err)) => {
            warn!(
                "Forecast unavailable for station {}: {}",
                station.id, err
            );
            Some(ForecastSection::Failed {
                error: ForecastErrorStub {
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                },
            })
        }
    };

    let envelope = Arc::new(compose_envelope(
        station,
        (*observation).clone(),
        forecast,
        Utc::now(),
    ));

    let env_ttl = if station.in_forecast_grid {
        obs_ttl.min(fcst_ttl)
    } else {
        obs_ttl
    };
    core.cache.put(
        &envelope_key(&station.id),
        CachedValue::Envelope(envelope.clone()),
        env_ttl,
    );

    Ok(envelope)
}

async fn fill_observation(
    core: &CoreServices,
    station: &Station,
    ttl: Duration,
) -> Result<Arc<Observation>, CoreError> {
    let key = observation_key(&station.id);
    let fill = core.cache.get_or_fill(&key, ttl, move || async move {
        buoy::fetch_observation(&core.http, &core.config.ndbc_base_url, &station.id)
            .await
            .map(|obs| CachedValue::Observation(Arc::new(obs)))
    });

    let value = timeout(OBSERVATION_DEADLINE, fill).await.map_err(|_| {
        CoreError::Timeout(format!("observation fetch for {} exceeded deadline", station.id))
    })??;

    value.into_observation().ok_or_else(|| {
        CoreError::Internal(format!("cache entry for '{}' holds the wrong family", key))
    })
}

/// `None` for stations outside every grid; otherwise the fill outcome.
async fn fill_forecast(
    core: &CoreServices,
    station: &Station,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Option<Result<Arc<crate::models::forecast::Forecast>, CoreError>> {
    if !station.in_forecast_grid {
        return None;
    }

    let key = forecast_key(station.latitude, station.longitude);
    let fill = core.cache.get_or_fill(&key, ttl, move || async move {
        gfswave::fetch_forecast(
            &core.http,
            &core.config.nomads_base_url,
            station.latitude,
            station.longitude,
            now,
        )
        .await
        .map(|f| CachedValue::Forecast(Arc::new(f)))
    });

    let result = match timeout(FORECAST_DEADLINE, fill).await {
        Err(_) => Err(CoreError::Timeout(format!(
            "forecast fetch for {} exceeded deadline",
            station.id
        ))),
        Ok(Err(e)) => Err(e),
        Ok(Ok(value)) => value.into_forecast().ok_or_else(|| {
            CoreError::Internal(format!("cache entry for '{}' holds the wrong family", key))
        }),
    };
    Some(result)
}

/// Pure composition: same inputs, structurally equal envelope. `generated`
/// is the only caller-supplied timestamp and stays isolated to metadata.
pub fn compose_envelope(
    station: &Station,
    observation: Observation,
    forecast: Option<ForecastSection>,
    generated: DateTime<Utc>,
) -> Envelope {
    Envelope {
        station: station.into(),
        observations: Some(observation),
        forecast,
        units: Units::default(),
        generated,
    }
}
