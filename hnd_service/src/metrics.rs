/// Prometheus text exposition of a station reading.
///
/// Renders the gauges of one `StationReading` in the text format
/// (version 0.0.4). Every gauge carries the station number and name as
/// labels. Centimeter values are exported in millimeters; the `-1`
/// sentinel is passed through unchanged so consumers can detect missing
/// data.

use std::fmt::Write;

use crate::model::{to_positive_millimeters, StationReading};

/// Metric namespace (Hochwassernachrichtendienst).
pub const NAMESPACE: &str = "hnd";

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// One exported gauge.
#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub name: String,
    pub help: &'static str,
    pub value: f64,
}

impl Gauge {
    fn new(name: &str, help: &'static str, value: f64) -> Self {
        Gauge {
            name: format!("{}_{}", NAMESPACE, name),
            help,
            value,
        }
    }
}

/// The gauges exported for a reading, in exposition order.
pub fn gauges(reading: &StationReading) -> Vec<Gauge> {
    let [wl1, wl2, wl3, wl4] = reading.warning_level_cm;

    vec![
        Gauge::new(
            "last_level_millimeters",
            "last level in millimeters, -1 if not present",
            to_positive_millimeters(reading.last_level_cm),
        ),
        Gauge::new(
            "last_outflow_cubicmeters_per_second",
            "last outflow in cubicmeters/second, -1 if not present",
            reading.last_outflow_m3s,
        ),
        Gauge::new(
            "current_warning_level",
            "current reported warning level, -1 if not present",
            reading.current_warning_level as f64,
        ),
        Gauge::new(
            "warning_level_1_millimeters",
            "warning level 1 in millimeters, -1 if not present",
            to_positive_millimeters(wl1),
        ),
        Gauge::new(
            "warning_level_2_millimeters",
            "warning level 2 in millimeters, -1 if not present",
            to_positive_millimeters(wl2),
        ),
        Gauge::new(
            "warning_level_3_millimeters",
            "warning level 3 in millimeters, -1 if not present",
            to_positive_millimeters(wl3),
        ),
        Gauge::new(
            "warning_level_4_millimeters",
            "warning level 4 in millimeters, -1 if not present",
            to_positive_millimeters(wl4),
        ),
        // Spelled as published; dashboards query this name.
        Gauge::new(
            "hundered_year_flood_level_millimeters",
            "an event that reaches or surpasses that level with a probability of 1% per year, -1 if not present",
            to_positive_millimeters(reading.hundred_year_flood_level_cm),
        ),
        Gauge::new(
            "last_measurement_timestamp_seconds",
            "unix time of the last measurement",
            reading.last_measurement_time.timestamp() as f64,
        ),
    ]
}

/// Renders `reading` in the Prometheus text exposition format.
pub fn render_metrics(reading: &StationReading) -> String {
    let labels = format!(
        "id=\"{}\",name=\"{}\"",
        escape_label_value(&reading.station_id),
        escape_label_value(&reading.station_name)
    );

    let mut out = String::new();
    for gauge in gauges(reading) {
        // writing into a String cannot fail
        let _ = writeln!(out, "# HELP {} {}", gauge.name, gauge.help);
        let _ = writeln!(out, "# TYPE {} gauge", gauge.name);
        let _ = writeln!(out, "{}{{{}}} {}", gauge.name, labels, format_value(gauge.value));
    }
    out
}

/// Escapes `\`, `"` and newlines inside a label value.
fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "+Inf" } else { "-Inf" }.to_string()
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn sample_reading() -> StationReading {
        let time = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2021, 8, 12, 17, 15, 0)
            .unwrap();
        let mut reading = StationReading::empty(time).with_station_id("16005701");
        reading.station_name = "München Isar".to_string();
        reading.last_level_cm = 143.0;
        reading.last_outflow_m3s = 109.0;
        reading.current_warning_level = 0;
        reading.warning_level_cm = [240.0, 300.0, -1.0, 520.0];
        reading.hundred_year_flood_level_cm = 510.0;
        reading
    }

    fn value_of(gauges: &[Gauge], name: &str) -> f64 {
        gauges
            .iter()
            .find(|g| g.name == name)
            .unwrap_or_else(|| panic!("gauge {} should be exported", name))
            .value
    }

    #[test]
    fn test_centimeter_gauges_are_exported_in_millimeters() {
        let gauges = gauges(&sample_reading());
        assert_eq!(value_of(&gauges, "hnd_last_level_millimeters"), 1430.0);
        assert_eq!(value_of(&gauges, "hnd_warning_level_1_millimeters"), 2400.0);
        assert_eq!(value_of(&gauges, "hnd_hundered_year_flood_level_millimeters"), 5100.0);
    }

    #[test]
    fn test_sentinel_survives_export() {
        let gauges = gauges(&sample_reading());
        assert_eq!(value_of(&gauges, "hnd_warning_level_3_millimeters"), -1.0);
    }

    #[test]
    fn test_outflow_and_warning_level_are_not_scaled() {
        let gauges = gauges(&sample_reading());
        assert_eq!(value_of(&gauges, "hnd_last_outflow_cubicmeters_per_second"), 109.0);
        assert_eq!(value_of(&gauges, "hnd_current_warning_level"), 0.0);
    }

    #[test]
    fn test_measurement_timestamp_is_unix_seconds() {
        let gauges = gauges(&sample_reading());
        // 2021-08-12T15:15:00Z
        assert_eq!(value_of(&gauges, "hnd_last_measurement_timestamp_seconds"), 1_628_781_300.0);
    }

    #[test]
    fn test_render_has_help_type_and_labelled_sample() {
        let text = render_metrics(&sample_reading());
        assert!(text.contains("# HELP hnd_last_level_millimeters last level in millimeters, -1 if not present\n"));
        assert!(text.contains("# TYPE hnd_last_level_millimeters gauge\n"));
        assert!(text.contains("hnd_last_level_millimeters{id=\"16005701\",name=\"München Isar\"} 1430\n"));
        assert!(text.contains("hnd_warning_level_3_millimeters{id=\"16005701\",name=\"München Isar\"} -1\n"));
        assert_eq!(text.lines().count(), 9 * 3);
    }

    #[test]
    fn test_label_values_are_escaped() {
        assert_eq!(escape_label_value(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_label_value("a\nb"), "a\\nb");
    }

    #[test]
    fn test_format_value_special_floats() {
        assert_eq!(format_value(24.4), "24.4");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
    }
}
