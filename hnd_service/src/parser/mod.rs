/// Station page parser: turns the markup of an HND gauge page
/// (`https://m.hnd.bayern.de/pegel.php?pgnr=...`) into a [`StationReading`].
///
/// The page is rendered prose with values embedded in it, not a
/// machine-readable format. The parser is a pattern-triggered latch: it
/// scans text for a landmark ("Wasserstand [cm]:", "Letzter Wert:", ...),
/// switches into a state that expects the value, consumes exactly one
/// following text fragment and returns to scanning.
///
/// Field-level failures never abort a parse. The field keeps its sentinel
/// (or "now" for the timestamp) and a [`FieldWarning`] goes to the sink.
/// Only a failure of the token source itself ends the parse with an error.

mod markup;
pub mod numeric;
pub mod state;
pub mod timestamp;
pub mod tokens;
pub mod warnings;

use std::io::Read;
use thiserror::Error;

use crate::civil_zone::CivilZone;
use crate::model::{SENTINEL, SENTINEL_LEVEL, StationReading};
use numeric::{normalize_decimal_comma, parse_float, parse_int};
use state::*;
use timestamp::parse_timestamp;
use tokens::{HtmlTokenizer, Token, TokenError, TokenSource};
use warnings::{Field, FieldWarning, WarningSink};

/// The token source failed before the end of the page.
///
/// `partial` holds whatever had been read up to that point. It is kept for
/// diagnostics only and must not be treated as a complete reading.
#[derive(Debug, Error)]
#[error("station page could not be read to the end: {error}")]
pub struct ParseFailure {
    #[source]
    pub error: TokenError,
    pub partial: StationReading,
}

/// Parses one station page from a token source.
///
/// Consumes the source exactly once, until it signals the end of the
/// stream (`Ok`) or a terminal error (`Err` with the partial reading).
pub fn parse_station_page<S: TokenSource + ?Sized>(
    source: &mut S,
    zone: &CivilZone,
    sink: &mut dyn WarningSink,
) -> Result<StationReading, ParseFailure> {
    let mut reading = StationReading::empty(zone.now());
    let mut state = ParserState::Initial;
    let mut ctx = Context { zone, sink };

    loop {
        match source.next_token() {
            Ok(Some(token)) => state = step(state, &token, &mut reading, &mut ctx),
            Ok(None) => return Ok(reading),
            Err(error) => {
                return Err(ParseFailure {
                    error,
                    partial: reading,
                });
            }
        }
    }
}

/// Tokenizes and parses a page from any byte source.
pub fn parse_html<R: Read>(
    source: R,
    zone: &CivilZone,
    sink: &mut dyn WarningSink,
) -> Result<StationReading, ParseFailure> {
    let mut tokenizer = HtmlTokenizer::new(source);
    parse_station_page(&mut tokenizer, zone, sink)
}

struct Context<'a> {
    zone: &'a CivilZone,
    sink: &'a mut dyn WarningSink,
}

impl Context<'_> {
    fn warn(&mut self, field: Field, fragment: &str, reason: impl ToString) {
        self.sink.warn(FieldWarning {
            field,
            fragment: fragment.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Unwraps a coerced value, substituting the sentinel on failure.
    fn or_sentinel<E: ToString>(&mut self, field: Field, fragment: &str, value: Result<f64, E>) -> f64 {
        value.unwrap_or_else(|e| {
            self.warn(field, fragment, e);
            SENTINEL
        })
    }
}

/// Applies one token to the reading and returns the next state.
fn step(state: ParserState, token: &Token, reading: &mut StationReading, ctx: &mut Context<'_>) -> ParserState {
    match token {
        Token::Text(text) => on_text(state, text, reading, ctx),
        Token::SelfClosingTag { name, .. } => {
            if state == ParserState::Name && name == LINE_BREAK_TAG {
                reading.station_name.push(' ');
            }
            state
        }
        Token::StartTag { name, attrs } => match state {
            ParserState::Initial
                if name == NAME_CONTAINER_TAG
                    && attrs.get("class").map(String::as_str) == Some(NAME_CONTAINER_CLASS) =>
            {
                ParserState::Name
            }
            ParserState::Name if name == NAME_CONTAINER_TAG => ParserState::Initial,
            ParserState::HundredYearFlood1 if name == SUBSCRIPT_TAG => ParserState::HundredYearFlood2,
            _ => state,
        },
        // the name block ends with whatever closes first
        Token::EndTag { .. } => match state {
            ParserState::Name => ParserState::Initial,
            _ => state,
        },
    }
}

fn on_text(state: ParserState, text: &str, reading: &mut StationReading, ctx: &mut Context<'_>) -> ParserState {
    match state {
        ParserState::Initial => dispatch(text, reading, ctx),
        ParserState::Name => {
            reading.station_name.push_str(text);
            ParserState::Name
        }
        ParserState::CurrentWarningLevel => {
            reading.current_warning_level = parse_int(text).unwrap_or_else(|e| {
                ctx.warn(Field::CurrentWarningLevel, text, e);
                SENTINEL_LEVEL
            });
            ParserState::Initial
        }
        ParserState::HundredYearFlood1 => ParserState::HundredYearFlood1,
        ParserState::HundredYearFlood2 => {
            if text == HUNDRED_YEAR_SUBSCRIPT {
                ParserState::HundredYearFlood3
            } else {
                ParserState::HundredYearFlood2
            }
        }
        ParserState::HundredYearFlood3 => {
            let value = nth_field(text, 1).and_then(|raw| parse_float(raw).map_err(|e| e.to_string()));
            reading.hundred_year_flood_level_cm = ctx.or_sentinel(Field::HundredYearFloodLevel, text, value);
            ParserState::Initial
        }
        ParserState::LastLevelCentimeter => {
            reading.last_level_cm = ctx.or_sentinel(Field::LastLevel, text, parse_float(text));
            ParserState::Initial
        }
        ParserState::LastOutFlowCubic => {
            let value = parse_float(&normalize_decimal_comma(text));
            reading.last_outflow_m3s = ctx.or_sentinel(Field::LastOutflow, text, value);
            ParserState::Initial
        }
        ParserState::LastValueTime => {
            reading.last_measurement_time = match parse_timestamp(text, ctx.zone) {
                Ok(parsed) => parsed,
                Err(e) => {
                    ctx.warn(Field::LastMeasurementTime, text, e);
                    ctx.zone.now()
                }
            };
            ParserState::Initial
        }
    }
}

/// Landmark scan in the `Initial` state. The colon form of "Meldestufe"
/// must be checked before the inline threshold form.
fn dispatch(text: &str, reading: &mut StationReading, ctx: &mut Context<'_>) -> ParserState {
    if text.contains(MARKER_CURRENT_WARNING_LEVEL) {
        ParserState::CurrentWarningLevel
    } else if text.contains(MARKER_WARNING_LEVEL_THRESHOLD) {
        read_warning_threshold(text, reading, ctx);
        ParserState::Initial
    } else if text.contains(MARKER_HUNDRED_YEAR_FLOOD) {
        ParserState::HundredYearFlood1
    } else if text.contains(MARKER_LAST_LEVEL) {
        ParserState::LastLevelCentimeter
    } else if text.contains(MARKER_LAST_OUTFLOW) {
        ParserState::LastOutFlowCubic
    } else if text.contains(MARKER_LAST_VALUE_TIME) {
        ParserState::LastValueTime
    } else {
        ParserState::Initial
    }
}

/// Reads an inline threshold such as "Meldestufe 2: 300".
fn read_warning_threshold(text: &str, reading: &mut StationReading, ctx: &mut Context<'_>) {
    let label = text.split_whitespace().nth(1).unwrap_or("");
    let level: u8 = match label {
        "1:" => 1,
        "2:" => 2,
        "3:" => 3,
        "4:" => 4,
        _ => {
            ctx.warn(
                Field::WarningLevel(None),
                text,
                format!("unknown warning level `{}`", label),
            );
            return;
        }
    };

    let value = nth_field(text, 2).and_then(|raw| parse_float(raw).map_err(|e| e.to_string()));
    let field = Field::WarningLevel(Some(level));
    reading.warning_level_cm[usize::from(level - 1)] = ctx.or_sentinel(field, text, value);
}

/// Whitespace-separated field `n` of `text`.
fn nth_field(text: &str, n: usize) -> Result<&str, String> {
    text.split_whitespace()
        .nth(n)
        .ok_or_else(|| format!("expected at least {} whitespace-separated fields", n + 1))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
