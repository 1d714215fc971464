//! Textual input/output for the base scalars: the exact accepted literal
//! forms for booleans, integers, and floats.

use crate::errors::ParseError;

/// Parses a boolean per the accepted literal set, case-insensitive with
/// whitespace trimmed: `t|true|yes|y|on|1` for true, `f|false|no|n|off|0`
/// for false.
pub fn parse_bool(text: &str) -> Result<bool, ParseError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "yes" | "y" | "on" | "1" => Ok(true),
        "f" | "false" | "no" | "n" | "off" | "0" => Ok(false),
        other => Err(ParseError(format!("not a boolean literal: {other:?}"))),
    }
}

pub fn format_bool(value: bool) -> &'static str {
    if value {
        "t"
    } else {
        "f"
    }
}

/// Parses an `int32`: optional leading sign, no whitespace, rejects
/// overflow rather than wrapping or truncating.
pub fn parse_i32(text: &str) -> Result<i32, ParseError> {
    text.trim()
        .parse::<i32>()
        .map_err(|e| ParseError(format!("not a valid int32 literal {text:?}: {e}")))
}

pub fn parse_i64(text: &str) -> Result<i64, ParseError> {
    text.trim()
        .parse::<i64>()
        .map_err(|e| ParseError(format!("not a valid int64 literal {text:?}: {e}")))
}

/// Parses a `float64`: `NaN`, `±Inf`/`±Infinity`/`±inf`, and ordinary
/// decimal/scientific notation, case-insensitively for the special values.
pub fn parse_f64(text: &str) -> Result<f64, ParseError> {
    let trimmed = text.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "nan" => return Ok(f64::NAN),
        "inf" | "+inf" | "infinity" | "+infinity" => return Ok(f64::INFINITY),
        "-inf" | "-infinity" => return Ok(f64::NEG_INFINITY),
        _ => {}
    }
    trimmed
        .parse::<f64>()
        .map_err(|e| ParseError(format!("not a valid float64 literal {text:?}: {e}")))
}

/// Formats a `float64` at a given significant-digit precision, defaulting
/// to the IEEE double round-trip maximum of 15 significant digits.
pub fn format_f64(value: f64, precision: Option<usize>) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Inf".to_string() } else { "-Inf".to_string() };
    }
    let digits = precision.unwrap_or(15);
    format!("{value:.digits$}", digits = digits)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_literals_accept_the_documented_spellings() {
        for s in ["t", "TRUE", "Yes", "y", "On", "1"] {
            assert_eq!(parse_bool(s), Ok(true));
        }
        for s in ["f", "FALSE", "No", "n", "Off", "0"] {
            assert_eq!(parse_bool(s), Ok(false));
        }
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn int32_rejects_overflow() {
        assert!(parse_i32("2147483648").is_err());
        assert_eq!(parse_i32(" -17 "), Ok(-17));
    }

    #[test]
    fn float64_recognises_special_values_case_insensitively() {
        assert!(parse_f64("NaN").unwrap().is_nan());
        assert_eq!(parse_f64("+Infinity"), Ok(f64::INFINITY));
        assert_eq!(parse_f64("-inf"), Ok(f64::NEG_INFINITY));
        assert_eq!(parse_f64("1.5e3"), Ok(1500.0));
    }

    #[test]
    fn format_f64_trims_trailing_zeros_at_default_precision() {
        assert_eq!(format_f64(1.5, None), "1.5");
        assert_eq!(format_f64(2.0, None), "2");
    }
}
