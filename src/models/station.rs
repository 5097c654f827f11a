use std::collections::HashMap;

use anyhow::{Context, Result};
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

#[derive(Embed)]
#[folder = "./embedded"]
struct Asset;

const EMBEDDED_CATALOGUE: &str = "stations.geojson";

/// One offshore station from the static catalogue. Immutable after load.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub station_type: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub has_real_time_data: bool,
    pub in_forecast_grid: bool,
}

// GeoJSON catalogue file shapes
#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    id: String,
    name: String,
    #[serde(rename = "type")]
    station_type: Option<String>,
    #[serde(rename = "hasRealTimeData", default)]
    has_real_time_data: bool,
}

/// The station catalogue, loaded once at startup.
pub struct StationCatalogue {
    stations: Vec<Station>,
    by_id: HashMap<String, usize>,
}

impl StationCatalogue {
    /// Load from an on-disk file when configured, otherwise from the
    /// catalogue embedded in the binary. `in_grid` decides the
    /// `in_forecast_grid` capability flag per station.
    pub fn load(
        stations_file: Option<&str>,
        in_grid: impl Fn(f64, f64) -> bool,
    ) -> Result<Self> {
        let raw = match stations_file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read station catalogue at {}", path))?,
            None => {
                let file = Asset::get(EMBEDDED_CATALOGUE)
                    .context("Embedded station catalogue is missing")?;
                String::from_utf8(file.data.into_owned())
                    .context("Embedded station catalogue is not valid UTF-8")?
            }
        };
        Self::from_geojson(&raw, in_grid)
    }

    pub fn from_geojson(raw: &str, in_grid: impl Fn(f64, f64) -> bool) -> Result<Self> {
        let collection: FeatureCollection =
            serde_json::from_str(raw).context("Failed to parse station catalogue GeoJSON")?;

        let mut stations = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            let coords = &feature.geometry.coordinates;
            if coords.len() < 2 {
                anyhow::bail!(
                    "Station {} has malformed coordinates",
                    feature.properties.id
                );
            }
            // GeoJSON order is [lon, lat]
            let longitude = coords[0];
            let latitude = coords[1];
            stations.push(Station {
                id: feature.properties.id,
                name: feature.properties.name,
                station_type: feature.properties.station_type,
                latitude,
                longitude,
                has_real_time_data: feature.properties.has_real_time_data,
                in_forecast_grid: in_grid(latitude, longitude),
            });
        }

        let by_id = stations
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();

        Ok(Self { stations, by_id })
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.by_id.get(id).map(|&i| &self.stations[i])
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Geographically closest station by great-circle distance, with the
    /// distance in kilometers.
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<(&Station, f64)> {
        self.stations
            .iter()
            .map(|s| (s, haversine_km(lat, lon, s.latitude, s.longitude)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Render the catalogue back out as a GeoJSON FeatureCollection.
    pub fn to_feature_collection(&self) -> serde_json::Value {
        let features: Vec<serde_json::Value> = self
            .stations
            .iter()
            .map(|s| {
                serde_json::json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": [s.longitude, s.latitude],
                    },
                    "properties": {
                        "id": s.id,
                        "name": s.name,
                        "type": s.station_type,
                        "hasRealTimeData": s.has_real_time_data,
                        "inForecastGrid": s.in_forecast_grid,
                    },
                })
            })
            .collect();

        serde_json::json!({
            "type": "FeatureCollection",
            "features": features,
        })
    }
}

/// Great-circle distance between two points, in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}
