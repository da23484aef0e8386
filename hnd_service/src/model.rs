/// Shared data types for HND station telemetry.
///
/// `StationReading` is the single record produced by the station page
/// parser. Every numeric field is always populated: either with a value read
/// from the page or with the `-1` sentinel that marks it as absent.

use chrono::{DateTime, FixedOffset};

/// Marks a numeric field as "not present on the page / not parseable".
pub const SENTINEL: f64 = -1.0;

/// Integer counterpart of [`SENTINEL`] for the current warning level.
pub const SENTINEL_LEVEL: i64 = -1;

/// Number of warning thresholds (Meldestufen) a station can publish.
pub const WARNING_LEVELS: usize = 4;

/// Telemetry extracted from one station status page.
#[derive(Debug, Clone, PartialEq)]
pub struct StationReading {
    /// Display name, e.g. "München Isar". Built up from the header block.
    pub station_name: String,

    /// Station number (pgnr). Attached by the caller, never by the parser.
    pub station_id: String,

    /// Time of the last published measurement, in the civil zone of the
    /// monitored region. Falls back to the time of parsing.
    pub last_measurement_time: DateTime<FixedOffset>,

    pub last_level_cm: f64,
    pub last_outflow_m3s: f64,

    /// Currently reported warning level (0 = no warning).
    pub current_warning_level: i64,

    /// Thresholds for warning levels 1 through 4, index 0 is level 1.
    pub warning_level_cm: [f64; WARNING_LEVELS],

    /// HQ100: the level reached or exceeded with a probability of 1% per
    /// year, statistically 100 times in 10,000 years.
    pub hundred_year_flood_level_cm: f64,
}

impl StationReading {
    /// Creates a reading with every field at its default: sentinels for all
    /// numbers and `measured_at` for the timestamp.
    pub fn empty(measured_at: DateTime<FixedOffset>) -> Self {
        StationReading {
            station_name: String::new(),
            station_id: String::new(),
            last_measurement_time: measured_at,
            last_level_cm: SENTINEL,
            last_outflow_m3s: SENTINEL,
            current_warning_level: SENTINEL_LEVEL,
            warning_level_cm: [SENTINEL; WARNING_LEVELS],
            hundred_year_flood_level_cm: SENTINEL,
        }
    }

    /// Threshold for warning level `level` (1-based), `None` for levels
    /// outside 1..=4.
    pub fn warning_level(&self, level: usize) -> Option<f64> {
        level
            .checked_sub(1)
            .and_then(|idx| self.warning_level_cm.get(idx))
            .copied()
    }

    /// Attaches the station number the page was requested for.
    pub fn with_station_id(mut self, station_id: impl Into<String>) -> Self {
        self.station_id = station_id.into();
        self
    }
}

/// Converts centimeters to millimeters for export.
///
/// Negative input is returned unchanged so that the `-1` sentinel survives
/// the unit conversion.
pub fn to_positive_millimeters(centimeters: f64) -> f64 {
    if centimeters < 0.0 {
        centimeters
    } else {
        centimeters * 10.0
    }
}

/// Returns true if `value` is the absent-value sentinel.
pub fn is_sentinel(value: f64) -> bool {
    value == SENTINEL
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
