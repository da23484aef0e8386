/// States of the station page parser.
///
/// `Initial` scans text for landmarks. Every value-consuming state reads
/// exactly one fragment and snaps back to `Initial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    Initial,
    /// Inside `<span class="header">`, collecting the station name.
    Name,
    /// Saw "Meldestufe:", the next text is the current warning level.
    CurrentWarningLevel,
    /// Saw "IÜG: HQ", waiting for the `<sub>` tag.
    HundredYearFlood1,
    /// Inside the subscript, waiting for the literal "100".
    HundredYearFlood2,
    /// Saw "HQ100", the next text carries the level.
    HundredYearFlood3,
    /// Saw "Wasserstand [cm]:".
    LastLevelCentimeter,
    /// Saw "Abfluss [m³/s]".
    LastOutFlowCubic,
    /// Saw "Letzter Wert:".
    LastValueTime,
}

/// Text landmarks recognised in the `Initial` state, in match order.
pub const MARKER_CURRENT_WARNING_LEVEL: &str = "Meldestufe:";
pub const MARKER_WARNING_LEVEL_THRESHOLD: &str = "Meldestufe ";
pub const MARKER_HUNDRED_YEAR_FLOOD: &str = "IÜG: HQ";
pub const MARKER_LAST_LEVEL: &str = "Wasserstand [cm]:";
pub const MARKER_LAST_OUTFLOW: &str = "Abfluss [m³/s]";
pub const MARKER_LAST_VALUE_TIME: &str = "Letzter Wert:";

/// The subscript following "HQ" that selects the hundred-year flood.
pub const HUNDRED_YEAR_SUBSCRIPT: &str = "100";

pub const NAME_CONTAINER_TAG: &str = "span";
pub const NAME_CONTAINER_CLASS: &str = "header";
pub const SUBSCRIPT_TAG: &str = "sub";
pub const LINE_BREAK_TAG: &str = "br";
