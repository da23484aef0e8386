/// Recoverable field-level warnings raised while parsing a station page.
///
/// The state machine never logs directly. It reports through a
/// [`WarningSink`], which in production forwards to `tracing`.

use std::fmt;
use tracing::warn;

/// The record field a warning concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CurrentWarningLevel,
    /// Inline "Meldestufe N: value" threshold; `None` if the label itself
    /// could not be recognised.
    WarningLevel(Option<u8>),
    HundredYearFloodLevel,
    LastLevel,
    LastOutflow,
    LastMeasurementTime,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::CurrentWarningLevel => write!(f, "current_warning_level"),
            Field::WarningLevel(Some(n)) => write!(f, "warning_level_{}", n),
            Field::WarningLevel(None) => write!(f, "warning_level"),
            Field::HundredYearFloodLevel => write!(f, "hundred_year_flood_level"),
            Field::LastLevel => write!(f, "last_level"),
            Field::LastOutflow => write!(f, "last_outflow"),
            Field::LastMeasurementTime => write!(f, "last_measurement_time"),
        }
    }
}

/// A field that could not be read and was set to its default instead.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldWarning {
    pub field: Field,
    /// The text fragment that failed to parse.
    pub fragment: String,
    pub reason: String,
}

pub trait WarningSink {
    fn warn(&mut self, warning: FieldWarning);
}

/// Forwards warnings to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&mut self, warning: FieldWarning) {
        warn!(
            field = %warning.field,
            fragment = %warning.fragment,
            "could not parse field: {}",
            warning.reason
        );
    }
}

/// Keeps every warning in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub warnings: Vec<FieldWarning>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> Vec<Field> {
        self.warnings.iter().map(|w| w.field).collect()
    }
}

impl WarningSink for CollectingSink {
    fn warn(&mut self, warning: FieldWarning) {
        self.warnings.push(warning);
    }
}
