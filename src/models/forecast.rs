use chrono::{DateTime, Utc};
use serde::Serialize;

/// A 7-day wave/wind forecast for one grid cell, 56 periods at 3-hour
/// spacing, in reporting units (feet, mph, degrees, seconds).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub model: String,
    pub cycle: ModelCycle,
    /// Start of the model run the periods are relative to.
    pub generated: DateTime<Utc>,
    pub location: ForecastLocation,
    pub periods: Vec<ForecastPeriod>,
}

/// A model run: UTC calendar date plus cycle hour in {00, 06, 12, 18}.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCycle {
    /// Compact run date, `YYYYMMDD`.
    pub date: String,
    pub hour: u32,
}

/// Echo of the routed request location and the grid cell that served it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastLocation {
    pub latitude: f64,
    /// Normalized into [0, 360).
    pub longitude: f64,
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    pub time: DateTime<Utc>,
    pub wave_height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_wave: Option<ForecastComponent>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub swells: Vec<ForecastComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_u: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_v: Option<f64>,
}

/// A wind-wave or swell partition; present only when the producer reported
/// a height sample for it at this step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastComponent {
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_partitions_are_omitted() {
        let period = ForecastPeriod {
            time: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
            wave_height: 4.9,
            period: Some(12.5),
            direction: Some(285.0),
            wind_wave: None,
            swells: vec![],
            wind_speed: Some(9.2),
            wind_direction: Some(300.0),
            wind_u: None,
            wind_v: None,
        };
        let json = serde_json::to_value(&period).unwrap();
        assert_eq!(json["waveHeight"], 4.9);
        assert!(json.get("windWave").is_none());
        assert!(json.get("swells").is_none());
        assert!(json.get("windU").is_none());
    }

    #[test]
    fn swell_partitions_serialize_in_order() {
        let period = ForecastPeriod {
            time: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
            wave_height: 6.2,
            period: None,
            direction: None,
            wind_wave: None,
            swells: vec![
                ForecastComponent {
                    height: 5.1,
                    period: Some(14.0),
                    direction: Some(290.0),
                },
                ForecastComponent {
                    height: 1.3,
                    period: Some(8.0),
                    direction: None,
                },
            ],
            wind_speed: None,
            wind_direction: None,
            wind_u: None,
            wind_v: None,
        };
        let json = serde_json::to_value(&period).unwrap();
        let swells = json["swells"].as_array().unwrap();
        assert_eq!(swells.len(), 2);
        assert_eq!(swells[0]["height"], 5.1);
        assert!(swells[1].get("direction").is_none());
    }
}
