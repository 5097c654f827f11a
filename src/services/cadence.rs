use chrono::{DateTime, Days, Duration, NaiveDate, Timelike, Utc};

/// NDBC republishes observations twice per hour at these minute offsets.
pub const OBSERVATION_PUBLISH_MINUTES: [u32; 2] = [26, 56];

/// Safety buffer so a request landing exactly on a publish boundary still
/// reads the fresh value.
pub const OBSERVATION_BUFFER_SECS: i64 = 60;

/// gfswave runs four cycles per UTC day.
pub const MODEL_RUN_HOURS: [u32; 4] = [0, 6, 12, 18];

/// A cycle's outputs become retrievable this long after its nominal hour.
pub const MODEL_RUN_AVAILABLE_AFTER_HOURS: i64 = 5;

/// Buffer added on top of a cycle's availability instant.
pub const CYCLE_BUFFER_SECS: i64 = 300;

/// Ceiling for any computed cache TTL.
pub const MAX_CACHE_SECS: i64 = 6 * 3600;

/// A gfswave model run: UTC date plus cycle hour in {00, 06, 12, 18}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelRun {
    pub date: NaiveDate,
    pub hour: u32,
}

impl ModelRun {
    /// Run date rendered the way NOMADS paths want it, `YYYYMMDD`.
    pub fn date_compact(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// Nominal start of the run.
    pub fn cycle_start(&self) -> DateTime<Utc> {
        self.date
            .and_hms_opt(self.hour, 0, 0)
            .expect("cycle hour is a valid hour of day")
            .and_utc()
    }

    /// Instant at which the run's outputs are retrievable.
    pub fn available_at(&self) -> DateTime<Utc> {
        self.cycle_start() + Duration::hours(MODEL_RUN_AVAILABLE_AFTER_HOURS)
    }
}

/// Seconds until the next observation publish, plus the safety buffer.
/// A call exactly on a publish minute rolls over to the following slot.
pub fn seconds_until_next_observation(now: DateTime<Utc>) -> i64 {
    let seconds_into_hour = (now.minute() * 60 + now.second()) as i64;

    for slot in [
        OBSERVATION_PUBLISH_MINUTES[0],
        OBSERVATION_PUBLISH_MINUTES[1],
        OBSERVATION_PUBLISH_MINUTES[0] + 60,
    ] {
        let slot_seconds = (slot * 60) as i64;
        if slot_seconds > seconds_into_hour {
            return slot_seconds - seconds_into_hour + OBSERVATION_BUFFER_SECS;
        }
    }

    // Unreachable: the wrapped first slot is always ahead.
    (60 * 60) as i64 + OBSERVATION_BUFFER_SECS
}

/// The most recent cycle whose availability instant is at or before `now`.
/// Before today's 00Z becomes available this is yesterday's 18Z.
pub fn latest_available_cycle(now: DateTime<Utc>) -> ModelRun {
    let today = now.date_naive();
    for &hour in MODEL_RUN_HOURS.iter().rev() {
        let run = ModelRun { date: today, hour };
        if run.available_at() <= now {
            return run;
        }
    }
    ModelRun {
        date: today - Days::new(1),
        hour: 18,
    }
}

/// Seconds until the next cycle's availability instant, plus the buffer.
pub fn seconds_until_next_cycle_available(now: DateTime<Utc>) -> i64 {
    let today = now.date_naive();
    for &hour in MODEL_RUN_HOURS.iter() {
        let run = ModelRun { date: today, hour };
        if run.available_at() > now {
            return (run.available_at() - now).num_seconds() + CYCLE_BUFFER_SECS;
        }
    }
    let run = ModelRun {
        date: today + Days::new(1),
        hour: 0,
    };
    (run.available_at() - now).num_seconds() + CYCLE_BUFFER_SECS
}

/// Apply the configured ceiling to a computed TTL.
pub fn clamp_ttl(seconds: i64) -> i64 {
    seconds.clamp(0, MAX_CACHE_SECS)
}
