use crate::errors::CoreError;
use crate::utils::units::normalize_degrees;

/// One axis of a regular model lattice: start coordinate, spacing, and
/// point count. The end coordinate is derived, keeping the closed-rectangle
/// containment test and the index math consistent with each other.
#[derive(Debug)]
pub struct GridAxis {
    pub start: f64,
    pub resolution: f64,
    pub size: usize,
}

impl GridAxis {
    pub fn end(&self) -> f64 {
        self.start + self.resolution * (self.size - 1) as f64
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.start && value <= self.end()
    }

    pub fn index_of(&self, value: f64) -> usize {
        ((value - self.start) / self.resolution).round() as usize
    }
}

/// A regional gfswave model. Longitudes are in [0, 360).
#[derive(Debug)]
pub struct ModelGrid {
    pub id: &'static str,
    pub lat: GridAxis,
    pub lon: GridAxis,
}

impl ModelGrid {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.lat.contains(lat) && self.lon.contains(lon)
    }
}

const RESOLUTION: f64 = 0.166667;

pub static WCOAST: ModelGrid = ModelGrid {
    id: "wcoast.0p16",
    lat: GridAxis {
        start: 25.0,
        resolution: RESOLUTION,
        size: 151,
    },
    lon: GridAxis {
        start: 210.0,
        resolution: RESOLUTION,
        size: 241,
    },
};

pub static GULFMEX: ModelGrid = ModelGrid {
    id: "gulfmex.0p16",
    lat: GridAxis {
        start: 15.0,
        resolution: RESOLUTION,
        size: 97,
    },
    lon: GridAxis {
        start: 260.0,
        resolution: RESOLUTION,
        size: 121,
    },
};

pub static ATLOCN: ModelGrid = ModelGrid {
    id: "atlocn.0p16",
    lat: GridAxis {
        start: 0.0,
        resolution: RESOLUTION,
        size: 331,
    },
    lon: GridAxis {
        start: 260.0,
        resolution: RESOLUTION,
        size: 301,
    },
};

/// Scan order is fixed; gulfmex comes before the Atlantic grid that
/// encloses it so Gulf stations route to the regional model.
pub static MODEL_SCAN_ORDER: [&ModelGrid; 3] = [&WCOAST, &GULFMEX, &ATLOCN];

/// A resolved grid cell: the owning model plus row/col indices, with the
/// routed coordinates echoed back (longitude normalized).
#[derive(Debug, Clone, Copy)]
pub struct GridCell {
    pub model: &'static ModelGrid,
    pub row: usize,
    pub col: usize,
    pub latitude: f64,
    pub longitude: f64,
}

/// Normalize a longitude from either [-180, 180] or [0, 360] into [0, 360).
pub fn normalize_longitude(lon: f64) -> f64 {
    normalize_degrees(lon)
}

/// Map a point onto the first model whose closed rectangle contains it.
/// There is no nearest-model fallback: outside every rectangle is an error.
pub fn locate(lat: f64, lon: f64) -> Result<GridCell, CoreError> {
    let lon_norm = normalize_longitude(lon);
    for model in MODEL_SCAN_ORDER {
        if model.contains(lat, lon_norm) {
            return Ok(GridCell {
                model,
                row: model.lat.index_of(lat),
                col: model.lon.index_of(lon_norm),
                latitude: lat,
                longitude: lon_norm,
            });
        }
    }
    Err(CoreError::OutOfGrid { lat, lon })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn west_coast_index_computation() {
        // (33.0, -117.5): normalized lon 242.5, wcoast row 48 col 195
        let cell = locate(33.0, -117.5).unwrap();
        assert_eq!(cell.model.id, "wcoast.0p16");
        assert_eq!(cell.row, 48);
        assert_eq!(cell.col, 195);
        assert!((cell.longitude - 242.5).abs() < 1e-9);
    }

    #[test]
    fn gulf_station_routes_to_gulfmex_not_atlocn() {
        // Both rectangles contain this point; the scan order decides.
        let cell = locate(27.0, -90.0).unwrap();
        assert_eq!(cell.model.id, "gulfmex.0p16");
    }

    #[test]
    fn atlantic_station_routes_to_atlocn() {
        // 42.8N is north of the gulfmex rectangle
        let cell = locate(42.8, -70.17).unwrap();
        assert_eq!(cell.model.id, "atlocn.0p16");
    }

    #[test]
    fn pacific_island_is_out_of_grid() {
        // (21.67, -158.12): normalized lon 201.88, outside all three
        let err = locate(21.67, -158.12).unwrap_err();
        match err {
            CoreError::OutOfGrid { lat, lon } => {
                assert!((lat - 21.67).abs() < 1e-9);
                assert!((lon - -158.12).abs() < 1e-9);
            }
            other => panic!("expected OutOfGrid, got {:?}", other),
        }
    }

    #[test]
    fn grid_edges_are_inside() {
        // Southwest corner of wcoast
        let cell = locate(25.0, 210.0).unwrap();
        assert_eq!(cell.model.id, "wcoast.0p16");
        assert_eq!(cell.row, 0);
        assert_eq!(cell.col, 0);

        // Northeast corner maps to the last indices
        let cell = locate(WCOAST.lat.end(), WCOAST.lon.end()).unwrap();
        assert_eq!(cell.row, WCOAST.lat.size - 1);
        assert_eq!(cell.col, WCOAST.lon.size - 1);
    }

    #[test]
    fn indices_stay_in_bounds_across_the_rectangle() {
        for model in MODEL_SCAN_ORDER {
            for frac in [0.0, 0.25, 0.5, 0.75, 1.0] {
                let lat = model.lat.start + (model.lat.end() - model.lat.start) * frac;
                let lon = model.lon.start + (model.lon.end() - model.lon.start) * frac;
                assert!(model.lat.index_of(lat) <= model.lat.size - 1);
                assert!(model.lon.index_of(lon) <= model.lon.size - 1);
            }
        }
    }

    #[test]
    fn longitude_normalization_is_idempotent() {
        for lon in [-180.0, -117.5, -0.1, 0.0, 42.0, 201.88, 359.9, 360.0] {
            let once = normalize_longitude(lon);
            assert_eq!(normalize_longitude(once), once);
            assert!((0.0..360.0).contains(&once));
        }
    }

    #[test]
    fn containment_is_preserved_under_normalization() {
        // -117.5 and 242.5 are the same meridian
        let a = locate(33.0, -117.5).unwrap();
        let b = locate(33.0, 242.5).unwrap();
        assert_eq!(a.model.id, b.model.id);
        assert_eq!(a.row, b.row);
        assert_eq!(a.col, b.col);
    }
}
