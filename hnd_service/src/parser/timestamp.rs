/// Parser for the "Letzter Wert" timestamp printed on station pages.
///
/// Format: `dd.mm.yy,HH:MM` (e.g. `12.08.21,17:15`), local civil time of the
/// monitored region. The fragment is accepted or rejected as a whole; there
/// is no per-component defaulting.
///
/// Components are only checked against their upper bound. Values that are
/// in bounds but not on the calendar roll over into the neighbouring unit:
/// `31.02.21` is 3 March, `00.08.21` is 31 July, month `00` is December of
/// the previous year and negative values count backwards.

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDate};
use thiserror::Error;

use crate::civil_zone::CivilZone;

const MAX_YEAR: i32 = 99;
const MAX_MONTH: i32 = 12;
const MAX_DAY: i32 = 31;
const MAX_HOUR: i32 = 23;
const MAX_MINUTE: i32 = 59;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("expected `date,time`, found {0} comma-separated parts")]
    WrongSplit(usize),

    #[error("expected day.month.year, found {0} date components")]
    DateComponents(usize),

    #[error("expected hour:minute, found {0} time components")]
    TimeComponents(usize),

    #[error("failed to parse {component} from `{value}`")]
    Component {
        component: &'static str,
        value: String,
    },

    /// Only reachable with large negative components.
    #[error("{date},{time} is outside the supported calendar range")]
    OutOfRange { date: String, time: String },
}

/// Parses a `dd.mm.yy,HH:MM` fragment into an absolute timestamp in `zone`.
///
/// Two-digit years are interpreted as 2000 + year. Seconds are always zero.
pub fn parse_timestamp(text: &str, zone: &CivilZone) -> Result<DateTime<FixedOffset>, TimestampError> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != 2 {
        return Err(TimestampError::WrongSplit(parts.len()));
    }

    let date: Vec<&str> = parts[0].split('.').collect();
    if date.len() != 3 {
        return Err(TimestampError::DateComponents(date.len()));
    }

    let time: Vec<&str> = parts[1].split(':').collect();
    if time.len() != 2 {
        return Err(TimestampError::TimeComponents(time.len()));
    }

    let year = component(date[2], "year", MAX_YEAR)?;
    let month = component(date[1], "month", MAX_MONTH)?;
    let day = component(date[0], "day", MAX_DAY)?;
    let hour = component(time[0], "hour", MAX_HOUR)?;
    let minute = component(time[1], "minute", MAX_MINUTE)?;

    let naive = year
        .checked_add(2000)
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .and_then(|jan1| add_months(jan1, i64::from(month) - 1))
        .and_then(|first| first.and_hms_opt(0, 0, 0))
        .and_then(|midnight| {
            let offset = Duration::days(i64::from(day) - 1)
                + Duration::hours(i64::from(hour))
                + Duration::minutes(i64::from(minute));
            midnight.checked_add_signed(offset)
        })
        .ok_or_else(|| TimestampError::OutOfRange {
            date: parts[0].trim().to_string(),
            time: parts[1].trim().to_string(),
        })?;

    Ok(zone.localize(&naive))
}

fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months < 0 {
        date.checked_sub_months(magnitude)
    } else {
        date.checked_add_months(magnitude)
    }
}

/// Trims and parses one component as a 32-bit integer, enforcing its upper
/// bound.
fn component(raw: &str, name: &'static str, max: i32) -> Result<i32, TimestampError> {
    let value = raw.trim();
    match value.parse::<i32>() {
        Ok(v) if v <= max => Ok(v),
        _ => Err(TimestampError::Component {
            component: name,
            value: value.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn berlin() -> CivilZone {
        CivilZone::default()
    }

    #[test]
    fn test_parse_munich_sample_timestamp() {
        let parsed = parse_timestamp("12.08.21,17:15", &berlin()).expect("should parse");
        let expected = chrono_tz::Europe::Berlin
            .with_ymd_and_hms(2021, 8, 12, 17, 15, 0)
            .unwrap();
        assert_eq!(parsed, expected);
        assert_eq!(parsed.second(), 0);
    }

    #[test]
    fn test_components_are_trimmed() {
        let parsed = parse_timestamp(" 12. 08 .21 , 20 : 30 ", &berlin()).expect("should parse");
        let expected = chrono_tz::Europe::Berlin
            .with_ymd_and_hms(2021, 8, 12, 20, 30, 0)
            .unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_wrong_comma_count_is_rejected() {
        assert_eq!(
            parse_timestamp("12.08.21 17:15", &berlin()),
            Err(TimestampError::WrongSplit(1))
        );
        assert_eq!(
            parse_timestamp("12.08.21,17:15,00", &berlin()),
            Err(TimestampError::WrongSplit(3))
        );
    }

    #[test]
    fn test_wrong_date_component_count_is_rejected() {
        assert_eq!(
            parse_timestamp("12.08,17:15", &berlin()),
            Err(TimestampError::DateComponents(2))
        );
        assert_eq!(
            parse_timestamp("12.08.20.21,17:15", &berlin()),
            Err(TimestampError::DateComponents(4))
        );
    }

    #[test]
    fn test_wrong_time_component_count_is_rejected() {
        assert_eq!(
            parse_timestamp("12.08.21,17", &berlin()),
            Err(TimestampError::TimeComponents(1))
        );
        assert_eq!(
            parse_timestamp("12.08.21,17:15:00", &berlin()),
            Err(TimestampError::TimeComponents(3))
        );
    }

    #[test]
    fn test_out_of_bounds_components_are_rejected() {
        let cases = [
            ("12.08.100,17:15", "year"),
            ("12.13.21,17:15", "month"),
            ("32.08.21,17:15", "day"),
            ("12.08.21,24:00", "hour"),
            ("12.08.21,17:60", "minute"),
        ];
        for (text, expected) in cases {
            match parse_timestamp(text, &berlin()) {
                Err(TimestampError::Component { component, .. }) => {
                    assert_eq!(component, expected, "wrong component blamed for {}", text)
                }
                other => panic!("{} should fail on {}, got {:?}", text, expected, other),
            }
        }
    }

    #[test]
    fn test_non_numeric_component_is_rejected() {
        assert!(matches!(
            parse_timestamp("12.Aug.21,17:15", &berlin()),
            Err(TimestampError::Component { component: "month", .. })
        ));
        assert!(matches!(
            parse_timestamp("12.08.21,17:1a", &berlin()),
            Err(TimestampError::Component { component: "minute", .. })
        ));
        assert!(matches!(
            parse_timestamp("12.08.21,,17:15", &berlin()),
            Err(TimestampError::WrongSplit(3))
        ));
    }

    fn local(text: &str) -> String {
        parse_timestamp(text, &berlin())
            .unwrap_or_else(|e| panic!("{} should parse: {}", text, e))
            .naive_local()
            .to_string()
    }

    #[test]
    fn test_overflowing_day_rolls_into_next_month() {
        assert_eq!(local("31.02.21,12:00"), "2021-03-03 12:00:00");
        assert_eq!(local("31.04.21,12:00"), "2021-05-01 12:00:00");
        assert_eq!(local("29.02.20,12:00"), "2020-02-29 12:00:00");
    }

    #[test]
    fn test_zero_day_and_month_roll_back() {
        assert_eq!(local("00.08.21,12:00"), "2021-07-31 12:00:00");
        assert_eq!(local("15.00.21,12:00"), "2020-12-15 12:00:00");
        assert_eq!(local("00.01.21,00:00"), "2020-12-31 00:00:00");
    }

    #[test]
    fn test_negative_components_count_backwards() {
        assert_eq!(local("12.08.21,17:-5"), "2021-08-12 16:55:00");
        assert_eq!(local("12.08.21,-1:00"), "2021-08-11 23:00:00");
    }

    #[test]
    fn test_huge_negative_component_is_out_of_range() {
        assert!(matches!(
            parse_timestamp("-2000000000.08.21,12:00", &berlin()),
            Err(TimestampError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_timestamp("12.08.-2147483648,12:00", &berlin()),
            Err(TimestampError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_dst_gap_moves_past_transition() {
        let parsed = parse_timestamp("28.03.21,02:30", &berlin()).expect("gap times still parse");
        assert_eq!(parsed.to_rfc3339(), "2021-03-28T03:30:00+02:00");
    }

    #[test]
    fn test_year_is_offset_from_2000() {
        let parsed = parse_timestamp("01.01.00,00:00", &berlin()).unwrap();
        assert_eq!(parsed.naive_local().to_string(), "2000-01-01 00:00:00");
    }
}
