use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::errors::CoreError;
use crate::models::forecast::{Forecast, ForecastComponent, ForecastLocation, ForecastPeriod, ModelCycle};
use crate::services::cadence::{latest_available_cycle, ModelRun};
use crate::services::grid::{self, GridCell};
use crate::utils::gfswave_parser::{parse_gfswave_ascii, ParsedGridSeries};
use crate::utils::units::{meters_to_feet, ms_to_mph, normalize_degrees};

/// Per-attempt timeout on the model-run request.
pub const FORECAST_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// 7 days at 8 periods per day.
pub const FORECAST_STEPS: usize = 56;
pub const PERIOD_HOURS: i64 = 3;

/// Everything a period needs: primary wave, wind, and the wind-wave plus
/// three swell partitions.
const VARIABLES: [&str; 19] = [
    "htsgwsfc", "perpwsfc", "dirpwsfc", "wvhgtsfc", "wvpersfc", "wvdirsfc", "windsfc",
    "wdirsfc", "ugrdsfc", "vgrdsfc", "swell_1", "swell_2", "swell_3", "swper_1", "swper_2",
    "swper_3", "swdir_1", "swdir_2", "swdir_3",
];

/// Fetch the 7-day forecast for a point. Routes through the grid, targets
/// the latest available model run, and retries transient failures.
pub async fn fetch_forecast(
    client: &reqwest::Client,
    base_url: &str,
    lat: f64,
    lon: f64,
    now: DateTime<Utc>,
) -> Result<Forecast, CoreError> {
    let cell = grid::locate(lat, lon)?;
    let run = latest_available_cycle(now);
    let url = build_run_url(base_url, &run, &cell);

    info!(
        "Fetching gfswave {} cycle {}_{:02}z cell [{}][{}]",
        cell.model.id, run.date_compact(), run.hour, cell.row, cell.col
    );

    let mut attempt = 0;
    let body = loop {
        attempt += 1;
        match attempt_fetch(client, &url).await {
            Ok(body) => break body,
            Err((err, transient)) => {
                if transient && attempt < MAX_RETRIES {
                    warn!(
                        "gfswave attempt {}/{} failed ({}), retrying in {}s",
                        attempt,
                        MAX_RETRIES,
                        err,
                        RETRY_DELAY.as_secs()
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
                return Err(err);
            }
        }
    };

    let parsed = parse_gfswave_ascii(&body)
        .map_err(|e| CoreError::Internal(format!("gfswave response parse failed: {}", e)))?;

    build_forecast(&run, &cell, &parsed)
}

/// One request. The error side carries whether the failure is transient
/// (network, timeout, 5xx, empty body) or fatal (404, other 4xx).
async fn attempt_fetch(
    client: &reqwest::Client,
    url: &str,
) -> Result<String, (CoreError, bool)> {
    let response = client
        .get(url)
        .timeout(FORECAST_FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                (CoreError::Timeout(format!("gfswave request timed out: {}", url)), true)
            } else {
                (CoreError::UpstreamUnavailable(format!("gfswave request failed: {}", e)), true)
            }
        })?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err((
            CoreError::UpstreamUnavailable(format!("model run not published: {}", url)),
            false,
        ));
    }
    if status.is_client_error() {
        return Err((
            CoreError::Internal(format!("gfswave rejected request with {}: {}", status, url)),
            false,
        ));
    }
    if !status.is_success() {
        return Err((
            CoreError::UpstreamUnavailable(format!("gfswave returned {}", status)),
            true,
        ));
    }

    let body = response
        .text()
        .await
        .map_err(|e| (CoreError::UpstreamUnavailable(format!("gfswave body read failed: {}", e)), true))?;

    // NOMADS serves HTML error pages for runs it has not assembled yet
    if body.trim().starts_with('<') || body.contains("<!DOCTYPE") || body.contains("<html") {
        return Err((
            CoreError::UpstreamUnavailable("gfswave returned an error page".to_string()),
            true,
        ));
    }
    if body.trim().is_empty() {
        return Err((
            CoreError::UpstreamUnavailable("gfswave returned an empty body".to_string()),
            true,
        ));
    }

    Ok(body)
}

/// `{base}/{YYYYMMDD}/gfswave.{model}_{HH}z.ascii?var[0:55][row][col],...`
/// with the index specs percent-encoded.
fn build_run_url(base_url: &str, run: &ModelRun, cell: &GridCell) -> String {
    let varspec = VARIABLES
        .iter()
        .map(|v| {
            format!(
                "{}%5B0:{}%5D%5B{}%5D%5B{}%5D",
                v,
                FORECAST_STEPS - 1,
                cell.row,
                cell.col
            )
        })
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "{}/{}/gfswave.{}_{:02}z.ascii?{}",
        base_url,
        run.date_compact(),
        cell.model.id,
        run.hour,
        varspec
    )
}

/// One period per step where the primary wave height is present; partitions
/// are included only when their own height sample is present.
fn build_forecast(
    run: &ModelRun,
    cell: &GridCell,
    parsed: &ParsedGridSeries,
) -> Result<Forecast, CoreError> {
    let cycle_start = run.cycle_start();
    let mut periods = Vec::new();

    for step in 0..FORECAST_STEPS {
        let Some(height_m) = parsed.value("htsgwsfc", step) else {
            continue;
        };

        let wind_wave = parsed.value("wvhgtsfc", step).map(|h| ForecastComponent {
            height: meters_to_feet(h),
            period: parsed.value("wvpersfc", step),
            direction: parsed.value("wvdirsfc", step).map(normalize_degrees),
        });

        let swells = (1..=3)
            .filter_map(|k| {
                parsed
                    .value(&format!("swell_{}", k), step)
                    .map(|h| ForecastComponent {
                        height: meters_to_feet(h),
                        period: parsed.value(&format!("swper_{}", k), step),
                        direction: parsed
                            .value(&format!("swdir_{}", k), step)
                            .map(normalize_degrees),
                    })
            })
            .collect();

        periods.push(ForecastPeriod {
            time: cycle_start + chrono::Duration::hours(step as i64 * PERIOD_HOURS),
            wave_height: meters_to_feet(height_m),
            period: parsed.value("perpwsfc", step),
            direction: parsed.value("dirpwsfc", step).map(normalize_degrees),
            wind_wave,
            swells,
            wind_speed: parsed.value("windsfc", step).map(ms_to_mph),
            wind_direction: parsed.value("wdirsfc", step).map(normalize_degrees),
            wind_u: parsed.value("ugrdsfc", step),
            wind_v: parsed.value("vgrdsfc", step),
        });
    }

    if periods.is_empty() {
        return Err(CoreError::Internal(
            "gfswave response carried no primary wave heights".to_string(),
        ));
    }

    Ok(Forecast {
        model: cell.model.id.to_string(),
        cycle: ModelCycle {
            date: run.date_compact(),
            hour: run.hour,
        },
        generated: cycle_start,
        location: ForecastLocation {
            latitude: cell.latitude,
            longitude: cell.longitude,
            row: cell.row,
            col: cell.col,
        },
        periods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn run_12z() -> ModelRun {
        ModelRun {
            date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            hour: 12,
        }
    }

    #[test]
    fn run_url_embeds_cell_indices_for_every_variable() {
        let cell = grid::locate(33.0, -117.5).unwrap();
        let url = build_run_url("https://nomads.example/dods/wave/gfswave", &run_12z(), &cell);

        assert!(url.starts_with(
            "https://nomads.example/dods/wave/gfswave/20260801/gfswave.wcoast.0p16_12z.ascii?"
        ));
        assert!(url.contains("htsgwsfc%5B0:55%5D%5B48%5D%5B195%5D"));
        assert!(url.contains("swdir_3%5B0:55%5D%5B48%5D%5B195%5D"));
        assert_eq!(url.matches("%5B0:55%5D%5B48%5D%5B195%5D").count(), 19);
    }

    fn sample_body() -> String {
        // Two steps of data; swell_2 absent at step 1 via the fill value
        let mut body = String::new();
        for (var, v0, v1) in [
            ("htsgwsfc", "1.5", "1.6"),
            ("perpwsfc", "12.5", "12.8"),
            ("dirpwsfc", "285.0", "286.0"),
            ("wvhgtsfc", "0.4", "9.999e20"),
            ("wvpersfc", "5.0", "5.1"),
            ("wvdirsfc", "200.0", "201.0"),
            ("windsfc", "5.0", "6.0"),
            ("wdirsfc", "300.0", "301.0"),
            ("ugrdsfc", "-2.5", "-2.6"),
            ("vgrdsfc", "1.5", "1.4"),
            ("swell_1", "1.2", "1.3"),
            ("swell_2", "0.3", "9.999e20"),
            ("swell_3", "9.999e20", "9.999e20"),
            ("swper_1", "14.0", "14.2"),
            ("swper_2", "8.0", "8.1"),
            ("swper_3", "9.999e20", "9.999e20"),
            ("swdir_1", "290.0", "291.0"),
            ("swdir_2", "180.0", "181.0"),
            ("swdir_3", "9.999e20", "9.999e20"),
        ] {
            body.push_str(&format!("{}, [56][1][1]\n[0][0], {}\n[1][0], {}\n", var, v0, v1));
        }
        body.push_str("time, [56]\n739100.5, 739100.625\nlat, [1]\n33.0\nlon, [1]\n242.5\n");
        body
    }

    #[tokio::test]
    async fn fetches_and_assembles_periods() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/20260801/gfswave.wcoast.0p16_12z.ascii"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sample_body()))
            .expect(1)
            .mount(&server)
            .await;

        // 17:30 UTC: the latest available cycle is 12Z
        let now = Utc.with_ymd_and_hms(2026, 8, 1, 17, 30, 0).unwrap();
        let forecast = fetch_forecast(&reqwest::Client::new(), &server.uri(), 33.0, -117.5, now)
            .await
            .unwrap();

        assert_eq!(forecast.model, "wcoast.0p16");
        assert_eq!(forecast.cycle.date, "20260801");
        assert_eq!(forecast.cycle.hour, 12);
        assert_eq!(forecast.periods.len(), 2);

        let p0 = &forecast.periods[0];
        assert_eq!(p0.time.to_rfc3339(), "2026-08-01T12:00:00+00:00");
        assert!((p0.wave_height - 4.92126).abs() < 1e-4);
        assert_eq!(p0.swells.len(), 2, "absent third swell is dropped");
        assert!(p0.wind_wave.is_some());

        let p1 = &forecast.periods[1];
        assert_eq!(p1.time.to_rfc3339(), "2026-08-01T15:00:00+00:00");
        assert!(p1.wind_wave.is_none(), "fill value drops the partition");
        assert_eq!(p1.swells.len(), 1);
    }

    #[tokio::test]
    async fn out_of_grid_point_is_rejected_without_a_request() {
        let err = fetch_forecast(
            &reqwest::Client::new(),
            "http://127.0.0.1:9", // unroutable: must not be contacted
            21.67,
            -158.12,
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::OutOfGrid { .. }));
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/20260801/gfswave.wcoast.0p16_12z.ascii"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let now = Utc.with_ymd_and_hms(2026, 8, 1, 17, 30, 0).unwrap();
        let err = fetch_forecast(&reqwest::Client::new(), &server.uri(), 33.0, -117.5, now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn not_found_fails_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/20260801/gfswave.wcoast.0p16_12z.ascii"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let now = Utc.with_ymd_and_hms(2026, 8, 1, 17, 30, 0).unwrap();
        let err = fetch_forecast(&reqwest::Client::new(), &server.uri(), 33.0, -117.5, now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn other_client_errors_are_internal_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/20260801/gfswave.wcoast.0p16_12z.ascii"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let now = Utc.with_ymd_and_hms(2026, 8, 1, 17, 30, 0).unwrap();
        let err = fetch_forecast(&reqwest::Client::new(), &server.uri(), 33.0, -117.5, now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
    }

    #[test]
    fn all_fill_values_yield_internal_error() {
        let parsed = parse_gfswave_ascii(
            "htsgwsfc, [56][1][1]\n[0][0], 9.999e20\n[1][0], 9.999e20\n",
        )
        .unwrap();
        let cell = grid::locate(33.0, -117.5).unwrap();
        let err = build_forecast(&run_12z(), &cell, &parsed).unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
    }
}
