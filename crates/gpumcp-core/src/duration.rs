//! Hand-rolled Go-style duration string parsing.
//!
//! The corpus declares no `humantime`-like crate, so this is a small
//! internal parser rather than a vendored dependency. It accepts a sum of
//! `<number><unit>` terms (`"1h30m"`, `"500ms"`, `"2s"`) with units `ns`,
//! `us`/`µs`, `ms`, `s`, `m`, `h`, matching Go's `time.ParseDuration`
//! grammar closely enough for an environment-variable override — it does
//! not support a leading sign or fractional-less bare numbers.

use std::time::Duration;

/// A duration string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid duration string {0:?}: {1}")]
pub struct DurationParseError(String, &'static str);

/// Parse a Go-style duration string such as `"500ms"`, `"2s"`, `"1h30m"`.
///
/// Empty input or input with no recognised unit is rejected rather than
/// silently defaulting; callers decide what to fall back to.
pub fn parse_go_duration(input: &str) -> Result<Duration, DurationParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError(input.to_string(), "empty string"));
    }

    let mut total = Duration::ZERO;
    let mut rest = trimmed;
    let mut saw_term = false;

    while !rest.is_empty() {
        let digits_end = rest.find(|c: char| !c.is_ascii_digit() && c != '.').unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(DurationParseError(input.to_string(), "expected a number"));
        }
        let (number, after_number) = rest.split_at(digits_end);
        let value: f64 = number.parse().map_err(|_| DurationParseError(input.to_string(), "not a number"))?;

        let (unit, after_unit) = take_unit(after_number).ok_or_else(|| DurationParseError(input.to_string(), "unrecognized unit"))?;
        let nanos_per_unit: f64 = match unit {
            "ns" => 1.0,
            "us" | "\u{b5}s" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" => 60.0 * 1_000_000_000.0,
            "h" => 3_600.0 * 1_000_000_000.0,
            _ => unreachable!("take_unit only returns known units"),
        };

        total += Duration::from_nanos((value * nanos_per_unit) as u64);
        saw_term = true;
        rest = after_unit;
    }

    if !saw_term {
        return Err(DurationParseError(input.to_string(), "no terms parsed"));
    }
    Ok(total)
}

fn take_unit(s: &str) -> Option<(&str, &str)> {
    const UNITS: &[&str] = &["ns", "us", "\u{b5}s", "ms", "s", "m", "h"];
    for unit in UNITS {
        if let Some(rest) = s.strip_prefix(unit) {
            return Some((unit, rest));
        }
    }
    None
}

/// Parse `EXEC_TIMEOUT`-shaped input, falling back to `default` and logging
/// a warning on any failure.
#[must_use]
pub fn parse_or_default(input: Option<&str>, default: Duration) -> Duration {
    match input {
        None => default,
        Some(raw) => match parse_go_duration(raw) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, raw, "invalid EXEC_TIMEOUT value, falling back to default");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_term_milliseconds() {
        assert_eq!(parse_go_duration("500ms").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn parses_single_term_seconds() {
        assert_eq!(parse_go_duration("2s").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn parses_compound_terms() {
        assert_eq!(parse_go_duration("1m30s").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn parses_fractional_seconds() {
        assert_eq!(parse_go_duration("1.5s").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn rejects_empty_string() {
        assert!(parse_go_duration("").is_err());
    }

    #[test]
    fn rejects_missing_unit() {
        assert!(parse_go_duration("500").is_err());
    }

    #[test]
    fn rejects_unrecognized_unit() {
        assert!(parse_go_duration("5fortnights").is_err());
    }

    #[test]
    fn parse_or_default_falls_back_on_invalid_input() {
        let fallback = Duration::from_secs(60);
        assert_eq!(parse_or_default(Some("garbage"), fallback), fallback);
        assert_eq!(parse_or_default(None, fallback), fallback);
        assert_eq!(parse_or_default(Some("5s"), fallback), Duration::from_secs(5));
    }
}
