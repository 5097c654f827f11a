use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::observation::*;
use crate::utils::ndbc_parser::{parse_met_file, parse_spec_file, MetRecord, SpectralRecord};
use crate::utils::units::{celsius_to_fahrenheit, meters_to_feet, ms_to_mph, normalize_degrees};

/// Per-call timeout on each NDBC request.
pub const BUOY_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Trend window: the newest 8 rows, about four hours at the 30-minute
/// publish cadence.
const TREND_WINDOW_ROWS: usize = 8;

const WAVE_HEIGHT_STEADY_FT: f64 = 0.5;
const WAVE_PERIOD_STEADY_SECS: f64 = 1.0;
const WIND_SPEED_STEADY_MPH: f64 = 2.0;

/// Beaufort scale keyed by upper-bound wind speed in mph.
const BEAUFORT_SCALE: [(f64, &str, &str); 13] = [
    (1.0, "Calm", "Sea like a mirror"),
    (4.0, "Light Air", "Ripples with appearance of scales, no foam crests"),
    (8.0, "Light Breeze", "Small wavelets, glassy crests"),
    (13.0, "Gentle Breeze", "Large wavelets, crests begin to break"),
    (19.0, "Moderate Breeze", "Small waves, fairly frequent white horses"),
    (25.0, "Fresh Breeze", "Moderate waves, many white horses"),
    (32.0, "Strong Breeze", "Large waves, extensive white foam crests"),
    (39.0, "Near Gale", "Sea heaps up, foam blown in streaks"),
    (47.0, "Gale", "Moderately high waves, crests break into spindrift"),
    (55.0, "Strong Gale", "High waves, dense streaks of foam"),
    (64.0, "Storm", "Very high waves with long overhanging crests"),
    (73.0, "Violent Storm", "Exceptionally high waves, sea covered in foam"),
    (f64::INFINITY, "Hurricane", "Air filled with foam and spray"),
];

/// Fetch and decode the observation stream for one station.
///
/// The meteorological and spectral records are requested in parallel. The
/// spectral record is optional: a 404 there just means the station does not
/// report a spectral summary. No retries; the caller's deadline is short
/// and new data will not appear within a retry window.
pub async fn fetch_observation(
    client: &reqwest::Client,
    base_url: &str,
    station_id: &str,
) -> Result<Observation, CoreError> {
    let met_url = format!("{}/{}.txt", base_url, station_id);
    let spec_url = format!("{}/{}.spec", base_url, station_id);

    let (met_body, spec_body) = tokio::join!(
        fetch_text(client, &met_url),
        fetch_optional_text(client, &spec_url)
    );
    let met_body = met_body?;
    let spec_body = spec_body?;

    let rows = parse_met_file(&met_body);
    if rows.is_empty() {
        return Err(CoreError::NotFound(format!(
            "no valid observation data for station {}",
            station_id
        )));
    }

    let spectral_rows = spec_body.as_deref().map(parse_spec_file).unwrap_or_default();
    if spec_body.is_some() && spectral_rows.is_empty() {
        debug!("Station {} spectral stream had no data rows", station_id);
    }

    Ok(build_observation(&rows, spectral_rows.first()))
}

async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String, CoreError> {
    let response = client
        .get(url)
        .timeout(BUOY_FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|e| classify_request_error(url, &e))?;

    if !response.status().is_success() {
        return Err(CoreError::UpstreamUnavailable(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    response
        .text()
        .await
        .map_err(|e| CoreError::UpstreamUnavailable(format!("{}: {}", url, e)))
}

/// Same as `fetch_text`, but a 404 is a normal outcome.
async fn fetch_optional_text(
    client: &reqwest::Client,
    url: &str,
) -> Result<Option<String>, CoreError> {
    let response = client
        .get(url)
        .timeout(BUOY_FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|e| classify_request_error(url, &e))?;

    if response.status() == StatusCode::NOT_FOUND {
        debug!("No spectral record at {}", url);
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(CoreError::UpstreamUnavailable(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    response
        .text()
        .await
        .map(Some)
        .map_err(|e| CoreError::UpstreamUnavailable(format!("{}: {}", url, e)))
}

fn classify_request_error(url: &str, err: &reqwest::Error) -> CoreError {
    if err.is_timeout() {
        CoreError::Timeout(format!("{} timed out", url))
    } else {
        CoreError::UpstreamUnavailable(format!("{}: {}", url, err))
    }
}

/// Assemble the observation from the newest row, the trend window, and the
/// optional spectral summary.
fn build_observation(rows: &[MetRecord], spectral: Option<&SpectralRecord>) -> Observation {
    let latest = &rows[0];
    let window = &rows[..rows.len().min(TREND_WINDOW_ROWS)];

    let speed_mph = latest.wind_speed_ms.map(ms_to_mph);
    let condition = speed_mph.map(beaufort_for);

    let swell = spectral.and_then(component_from_swell);
    let wind_wave = spectral.and_then(component_from_wind_wave);
    let dominant_partition = dominant_partition(swell.as_ref(), wind_wave.as_ref());
    let summary = mariner_summary(dominant_partition, condition.as_ref());

    let trend = derive_trend(window);

    Observation {
        time: latest.time,
        wind: WindObservation {
            direction: latest.wind_direction.map(normalize_degrees),
            speed: speed_mph,
            gust: latest.gust_ms.map(ms_to_mph),
            condition,
        },
        waves: WaveObservation {
            height: latest.wave_height_m.map(meters_to_feet),
            dominant_period: latest.dominant_period_s,
            average_period: latest.average_period_s,
            direction: latest.wave_direction.map(normalize_degrees),
            swell,
            wind_wave,
            steepness: spectral.and_then(|s| s.steepness.clone()),
            dominant_partition,
        },
        atmosphere: Atmosphere {
            pressure: latest.pressure_hpa,
            air_temp: latest.air_temp_c.map(celsius_to_fahrenheit),
            water_temp: latest.water_temp_c.map(celsius_to_fahrenheit),
            dew_point: latest.dew_point_c.map(celsius_to_fahrenheit),
        },
        trend,
        summary,
    }
}

fn component_from_swell(s: &SpectralRecord) -> Option<WaveComponent> {
    s.swell_height_m.map(|h| WaveComponent {
        height: meters_to_feet(h),
        period: s.swell_period_s,
        direction: s.swell_direction.clone(),
    })
}

fn component_from_wind_wave(s: &SpectralRecord) -> Option<WaveComponent> {
    s.wind_wave_height_m.map(|h| WaveComponent {
        height: meters_to_feet(h),
        period: s.wind_wave_period_s,
        direction: s.wind_wave_direction.clone(),
    })
}

fn dominant_partition(
    swell: Option<&WaveComponent>,
    wind_wave: Option<&WaveComponent>,
) -> Option<DominantPartition> {
    match (swell, wind_wave) {
        (Some(_), Some(_)) => Some(DominantPartition::Mixed),
        (Some(_), None) => Some(DominantPartition::Swell),
        (None, Some(_)) => Some(DominantPartition::WindWave),
        (None, None) => None,
    }
}

/// Delta over the window is (most recent valid) − (oldest valid). Rows are
/// newest first. A metric needs at least two valid samples to trend.
fn window_delta(
    window: &[MetRecord],
    field: impl Fn(&MetRecord) -> Option<f64>,
) -> Option<f64> {
    let values: Vec<f64> = window.iter().filter_map(field).collect();
    if values.len() < 2 {
        return None;
    }
    Some(values[0] - values[values.len() - 1])
}

fn derive_trend(window: &[MetRecord]) -> Option<Trend> {
    let wave_height = window_delta(window, |r| r.wave_height_m.map(meters_to_feet)).map(|d| {
        if d.abs() < WAVE_HEIGHT_STEADY_FT {
            WaveHeightTrend::Steady
        } else if d > 0.0 {
            WaveHeightTrend::Building
        } else {
            WaveHeightTrend::Dropping
        }
    });

    let wave_period = window_delta(window, |r| r.dominant_period_s).map(|d| {
        if d.abs() < WAVE_PERIOD_STEADY_SECS {
            WavePeriodTrend::Steady
        } else if d > 0.0 {
            WavePeriodTrend::Lengthening
        } else {
            WavePeriodTrend::Shortening
        }
    });

    let wind_speed = window_delta(window, |r| r.wind_speed_ms.map(ms_to_mph)).map(|d| {
        if d.abs() < WIND_SPEED_STEADY_MPH {
            WindSpeedTrend::Steady
        } else if d > 0.0 {
            WindSpeedTrend::Increasing
        } else {
            WindSpeedTrend::Decreasing
        }
    });

    let trend = Trend {
        wave_height,
        wave_period,
        wind_speed,
    };
    if trend.is_empty() {
        None
    } else {
        Some(trend)
    }
}

fn beaufort_for(speed_mph: f64) -> WindCondition {
    for (upper, name, sea_state) in BEAUFORT_SCALE {
        if speed_mph < upper {
            return WindCondition {
                name: name.to_string(),
                sea_state: sea_state.to_string(),
            };
        }
    }
    // The table ends with an infinite upper bound
    let (_, name, sea_state) = BEAUFORT_SCALE[BEAUFORT_SCALE.len() - 1];
    WindCondition {
        name: name.to_string(),
        sea_state: sea_state.to_string(),
    }
}

/// One deterministic English sentence from the dominant partition and the
/// Beaufort category.
fn mariner_summary(
    partition: Option<DominantPartition>,
    condition: Option<&WindCondition>,
) -> Option<String> {
    let seas = partition.map(|p| match p {
        DominantPartition::Mixed => "Mixed swell and wind waves",
        DominantPartition::Swell => "Clean swell running",
        DominantPartition::WindWave => "Locally generated wind waves",
    });

    match (seas, condition) {
        (Some(seas), Some(c)) => Some(format!(
            "{} in {} conditions. {}.",
            seas,
            c.name.to_lowercase(),
            c.sea_state
        )),
        (Some(seas), None) => Some(format!("{}.", seas)),
        (None, Some(c)) => Some(format!("{} conditions. {}.", c.name, c.sea_state)),
        (None, None) => None,
    }
}
