/// Numeric coercion for free-form page text.
///
/// These helpers only report success or failure. Substituting the `-1`
/// sentinel is the caller's decision.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{text}` is not a valid {expected}")]
pub struct NumericError {
    pub text: String,
    pub expected: &'static str,
}

/// Parses a base-10, 64-bit integer. Surrounding whitespace is ignored, so
/// `" 143"` gives 143 where a strict parse would fail.
pub fn parse_int(text: &str) -> Result<i64, NumericError> {
    text.trim().parse::<i64>().map_err(|_| NumericError {
        text: text.to_string(),
        expected: "integer",
    })
}

/// Parses a floating point number with `.` as decimal separator.
/// Surrounding whitespace is ignored, so `" 24.4"` gives 24.4 where a strict
/// parse would fail.
pub fn parse_float(text: &str) -> Result<f64, NumericError> {
    text.trim().parse::<f64>().map_err(|_| NumericError {
        text: text.to_string(),
        expected: "number",
    })
}

/// Replaces the first `,` with `.` so German decimals ("24,4") parse.
pub fn normalize_decimal_comma(text: &str) -> String {
    text.replacen(',', ".", 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
