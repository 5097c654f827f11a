/// Meters to feet, as used for every reported wave height.
pub const METERS_TO_FEET: f64 = 3.28084;

/// Meters per second to miles per hour, as used for every reported wind speed.
pub const MS_TO_MPH: f64 = 1.15078;

pub fn meters_to_feet(m: f64) -> f64 {
    m * METERS_TO_FEET
}

pub fn ms_to_mph(ms: f64) -> f64 {
    ms * MS_TO_MPH
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Normalize a bearing into [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg % 360.0;
    if d < 0.0 {
        d + 360.0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_to_feet() {
        assert!((meters_to_feet(1.0) - 3.28084).abs() < 1e-9);
        assert!((meters_to_feet(2.5) - 8.2021).abs() < 1e-4);
    }

    #[test]
    fn test_ms_to_mph() {
        assert!((ms_to_mph(10.0) - 11.5078).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
        // Idempotent
        assert_eq!(
            normalize_degrees(normalize_degrees(-117.5)),
            normalize_degrees(-117.5)
        );
    }
}
