/// Civil timezone used to interpret the local timestamps printed on the
/// station pages.
///
/// The zone is resolved once at startup from configuration and then passed
/// by value to everything that builds timestamps. If the configured IANA
/// name is unknown, the service degrades to the local system zone.

use chrono::{DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// IANA zone of the monitored region (Bavaria).
pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CivilZone {
    /// A named zone from the tz database.
    Named(Tz),
    /// Degraded fallback: whatever the host is configured with.
    Local,
}

impl CivilZone {
    /// Resolves `name` against the tz database, falling back to the local
    /// system zone (with a warning) if the name is unknown.
    pub fn resolve(name: &str) -> Self {
        match name.parse::<Tz>() {
            Ok(tz) => CivilZone::Named(tz),
            Err(e) => {
                warn!(
                    timezone = name,
                    error = %e,
                    "could not load timezone, using local system time; timestamps might be wrong"
                );
                CivilZone::Local
            }
        }
    }

    /// Human-readable zone name, "local" for the fallback.
    pub fn name(&self) -> &str {
        match self {
            CivilZone::Named(tz) => tz.name(),
            CivilZone::Local => "local",
        }
    }

    /// Current wall-clock time expressed in this zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.from_utc(Utc::now())
    }

    pub fn from_utc(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            CivilZone::Named(tz) => instant.with_timezone(tz).fixed_offset(),
            CivilZone::Local => instant.with_timezone(&Local).fixed_offset(),
        }
    }

    /// Interprets a wall-clock time in this zone.
    ///
    /// A time skipped by a forward DST transition is read with the offset in
    /// effect before it, which lands the same distance past the transition
    /// (02:30 on a 02:00 → 03:00 night becomes 03:30). Ambiguous times
    /// (clocks turned back) resolve to the earlier instant.
    pub fn localize(&self, naive: &NaiveDateTime) -> DateTime<FixedOffset> {
        match self {
            CivilZone::Named(tz) => localize_in(tz, naive),
            CivilZone::Local => localize_in(&Local, naive),
        }
    }
}

fn localize_in<Z: TimeZone>(zone: &Z, naive: &NaiveDateTime) -> DateTime<FixedOffset> {
    match zone.from_local_datetime(naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.fixed_offset(),
        LocalResult::None => {
            let before = zone.offset_from_utc_datetime(&(*naive - Duration::days(1))).fix();
            let utc = *naive - Duration::seconds(i64::from(before.local_minus_utc()));
            zone.from_utc_datetime(&utc).fixed_offset()
        }
    }
}

impl Default for CivilZone {
    fn default() -> Self {
        CivilZone::Named(chrono_tz::Europe::Berlin)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_resolve_known_zone() {
        let zone = CivilZone::resolve("Europe/Berlin");
        assert_eq!(zone, CivilZone::Named(chrono_tz::Europe::Berlin));
        assert_eq!(zone.name(), "Europe/Berlin");
    }

    #[test]
    fn test_resolve_unknown_zone_falls_back_to_local() {
        let zone = CivilZone::resolve("Mars/Olympus_Mons");
        assert_eq!(zone, CivilZone::Local);
        assert_eq!(zone.name(), "local");
    }

    #[test]
    fn test_default_is_berlin() {
        assert_eq!(CivilZone::default().name(), DEFAULT_TIMEZONE);
    }

    #[test]
    fn test_localize_summer_time_offset() {
        let zone = CivilZone::default();
        let dt = zone.localize(&naive(2021, 8, 12, 17, 15));
        assert_eq!(dt.offset().local_minus_utc(), 2 * 3600, "CEST is UTC+2");
        assert_eq!(dt.naive_local(), naive(2021, 8, 12, 17, 15));
    }

    #[test]
    fn test_localize_winter_time_offset() {
        let zone = CivilZone::default();
        let dt = zone.localize(&naive(2021, 1, 5, 8, 0));
        assert_eq!(dt.offset().local_minus_utc(), 3600, "CET is UTC+1");
    }

    #[test]
    fn test_localize_moves_spring_forward_gap_past_transition() {
        // 2021-03-28 02:30 does not exist in Europe/Berlin
        let zone = CivilZone::default();
        let dt = zone.localize(&naive(2021, 3, 28, 2, 30));
        assert_eq!(dt.naive_local(), naive(2021, 3, 28, 3, 30));
        assert_eq!(dt.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(dt.to_rfc3339(), "2021-03-28T03:30:00+02:00");
    }

    #[test]
    fn test_localize_ambiguous_time_takes_earlier_instant() {
        // 2021-10-31 02:30 happens twice; the first one is still CEST
        let zone = CivilZone::default();
        let dt = zone.localize(&naive(2021, 10, 31, 2, 30));
        assert_eq!(dt.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn test_now_is_in_zone() {
        let zone = CivilZone::default();
        let now = zone.now();
        let offset = now.offset().local_minus_utc();
        assert!(offset == 3600 || offset == 7200, "Berlin is UTC+1 or UTC+2, got {}", offset);
    }
}
