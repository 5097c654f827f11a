use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::forecast::Forecast;
use crate::models::observation::Observation;
use crate::models::station::Station;

/// The merged per-station response: header, observation, forecast (or an
/// error stub), and the units block.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub station: StationHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observations: Option<Observation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<ForecastSection>,
    pub units: Units,
    pub generated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationHeader {
    pub id: String,
    pub name: String,
    pub location: Location,
    pub has_real_time_data: bool,
    pub in_forecast_grid: bool,
}

impl From<&Station> for StationHeader {
    fn from(station: &Station) -> Self {
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            location: Location {
                latitude: station.latitude,
                longitude: station.longitude,
            },
            has_real_time_data: station.has_real_time_data,
            in_forecast_grid: station.in_forecast_grid,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// A forecast that was fetched, or the stub describing why it could not be.
/// Omitted entirely for stations outside every model grid.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ForecastSection {
    Ready(Forecast),
    Failed { error: ForecastErrorStub },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastErrorStub {
    pub kind: String,
    pub message: String,
}

/// Fixed reporting units for every envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Units {
    pub wave_height: &'static str,
    pub wind_speed: &'static str,
    pub direction: &'static str,
    pub period: &'static str,
    pub temperature: &'static str,
    pub pressure: &'static str,
}

impl Default for Units {
    fn default() -> Self {
        Self {
            wave_height: "ft",
            wind_speed: "mph",
            direction: "degrees",
            period: "seconds",
            temperature: "F",
            pressure: "hPa",
        }
    }
}
