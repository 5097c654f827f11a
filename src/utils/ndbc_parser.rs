use chrono::{DateTime, TimeZone, Utc};

/// NDBC publishes "MM" wherever a sensor reading is missing.
const MISSING: &str = "MM";

// Column layout of the realtime2 meteorological stream (.txt):
// #YY  MM DD hh mm WDIR WSPD GST  WVHT   DPD   APD MWD   PRES  ATMP  WTMP  DEWP  VIS PTDY  TIDE
const MET_WDIR: usize = 5;
const MET_WSPD: usize = 6;
const MET_GST: usize = 7;
const MET_WVHT: usize = 8;
const MET_DPD: usize = 9;
const MET_APD: usize = 10;
const MET_MWD: usize = 11;
const MET_PRES: usize = 12;
const MET_ATMP: usize = 13;
const MET_WTMP: usize = 14;
const MET_DEWP: usize = 15;

// Column layout of the spectral summary stream (.spec):
// #YY  MM DD hh mm WVHT  SwH  SwP  WWH  WWP SwD WWD  STEEPNESS  APD MWD
const SPEC_WVHT: usize = 5;
const SPEC_SWH: usize = 6;
const SPEC_SWP: usize = 7;
const SPEC_WWH: usize = 8;
const SPEC_WWP: usize = 9;
const SPEC_SWD: usize = 10;
const SPEC_WWD: usize = 11;
const SPEC_STEEPNESS: usize = 12;
const SPEC_APD: usize = 13;
const SPEC_MWD: usize = 14;

/// One decoded row of the meteorological stream. All readings are in the
/// producer's native units (m, m/s, hPa, degC).
#[derive(Debug, Clone)]
pub struct MetRecord {
    pub time: DateTime<Utc>,
    pub wind_direction: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub gust_ms: Option<f64>,
    pub wave_height_m: Option<f64>,
    pub dominant_period_s: Option<f64>,
    pub average_period_s: Option<f64>,
    pub wave_direction: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub air_temp_c: Option<f64>,
    pub water_temp_c: Option<f64>,
    pub dew_point_c: Option<f64>,
}

/// One decoded row of the spectral summary stream. Swell and wind-wave
/// directions come as compass labels, the mean direction in degrees.
#[derive(Debug, Clone)]
pub struct SpectralRecord {
    pub time: DateTime<Utc>,
    pub wave_height_m: Option<f64>,
    pub swell_height_m: Option<f64>,
    pub swell_period_s: Option<f64>,
    pub wind_wave_height_m: Option<f64>,
    pub wind_wave_period_s: Option<f64>,
    pub swell_direction: Option<String>,
    pub wind_wave_direction: Option<String>,
    pub steepness: Option<String>,
    pub average_period_s: Option<f64>,
    pub mean_wave_direction: Option<f64>,
}

/// Parse the meteorological stream. Header lines start with '#'; the first
/// data row is the most recent observation. Rows with an unreadable
/// timestamp are dropped; a row of all-"MM" readings is kept (it still
/// carries a valid time).
pub fn parse_met_file(body: &str) -> Vec<MetRecord> {
    body.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            let time = parse_timestamp(&cols)?;
            Some(MetRecord {
                time,
                wind_direction: numeric_field(&cols, MET_WDIR),
                wind_speed_ms: numeric_field(&cols, MET_WSPD),
                gust_ms: numeric_field(&cols, MET_GST),
                wave_height_m: numeric_field(&cols, MET_WVHT),
                dominant_period_s: numeric_field(&cols, MET_DPD),
                average_period_s: numeric_field(&cols, MET_APD),
                wave_direction: numeric_field(&cols, MET_MWD),
                pressure_hpa: numeric_field(&cols, MET_PRES),
                air_temp_c: numeric_field(&cols, MET_ATMP),
                water_temp_c: numeric_field(&cols, MET_WTMP),
                dew_point_c: numeric_field(&cols, MET_DEWP),
            })
        })
        .collect()
}

/// Parse the spectral summary stream. Same framing as the met stream.
pub fn parse_spec_file(body: &str) -> Vec<SpectralRecord> {
    body.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            let time = parse_timestamp(&cols)?;
            Some(SpectralRecord {
                time,
                wave_height_m: numeric_field(&cols, SPEC_WVHT),
                swell_height_m: numeric_field(&cols, SPEC_SWH),
                swell_period_s: numeric_field(&cols, SPEC_SWP),
                wind_wave_height_m: numeric_field(&cols, SPEC_WWH),
                wind_wave_period_s: numeric_field(&cols, SPEC_WWP),
                swell_direction: text_field(&cols, SPEC_SWD),
                wind_wave_direction: text_field(&cols, SPEC_WWD),
                steepness: text_field(&cols, SPEC_STEEPNESS),
                average_period_s: numeric_field(&cols, SPEC_APD),
                mean_wave_direction: numeric_field(&cols, SPEC_MWD),
            })
        })
        .collect()
}

/// First five columns are YYYY MM DD hh mm in UTC.
fn parse_timestamp(cols: &[&str]) -> Option<DateTime<Utc>> {
    if cols.len() < 5 {
        return None;
    }
    let year: i32 = cols[0].parse().ok()?;
    let month: u32 = cols[1].parse().ok()?;
    let day: u32 = cols[2].parse().ok()?;
    let hour: u32 = cols[3].parse().ok()?;
    let minute: u32 = cols[4].parse().ok()?;
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).single()
}

/// "MM", a short row, or an unparseable token all map to absent — never zero.
fn numeric_field(cols: &[&str], idx: usize) -> Option<f64> {
    let raw = *cols.get(idx)?;
    if raw == MISSING {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn text_field(cols: &[&str], idx: usize) -> Option<String> {
    let raw = *cols.get(idx)?;
    if raw == MISSING || raw == "-" {
        return None;
    }
    Some(raw.to_string())
}
