use chrono::{DateTime, Utc};
use serde::Serialize;

/// The latest buoy observation with its derived trend, in reporting units
/// (feet, mph, degrees, seconds, Fahrenheit, hPa). Absent sensor readings
/// stay absent through serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub time: DateTime<Utc>,
    pub wind: WindObservation,
    pub waves: WaveObservation,
    pub atmosphere: Atmosphere,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<WindCondition>,
}

/// Beaufort category for the observed wind speed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindCondition {
    pub name: String,
    pub sea_state: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_period: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_period: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swell: Option<WaveComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_wave: Option<WaveComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steepness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_partition: Option<DominantPartition>,
}

/// One component of the spectral decomposition. Exists only when the
/// producer reported a height for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveComponent {
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DominantPartition {
    Mixed,
    Swell,
    WindWave,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Atmosphere {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dew_point: Option<f64>,
}

/// Direction of change over the recent observation window. Each field is
/// absent when fewer than two valid samples were available for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_height: Option<WaveHeightTrend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_period: Option<WavePeriodTrend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<WindSpeedTrend>,
}

impl Trend {
    pub fn is_empty(&self) -> bool {
        self.wave_height.is_none() && self.wave_period.is_none() && self.wind_speed.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveHeightTrend {
    Steady,
    Building,
    Dropping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WavePeriodTrend {
    Steady,
    Lengthening,
    Shortening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindSpeedTrend {
    Steady,
    Increasing,
    Decreasing,
}
