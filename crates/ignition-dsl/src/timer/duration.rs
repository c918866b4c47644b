use chrono::{DateTime, FixedOffset};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::error::{CompileError, CompileResult};

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

lazy_static! {
    // ISO-8601 duration restricted to days and time fields, e.g. "P1DT2H", "PT0.5S"
    static ref ISO_DURATION_REGEX: Regex = Regex::new(
        r"(?i)^([-+]?)P(?:([-+]?[0-9]+)D)?(T(?:([-+]?[0-9]+)H)?(?:([-+]?[0-9]+)M)?(?:([-+]?[0-9]+)(?:[.,]([0-9]{0,9}))?S)?)?$"
    ).unwrap();

    // Legacy time strings, e.g. "1d 2h 30m 10s 500ms" or a bare number of milliseconds
    static ref TIME_STRING_REGEX: Regex = Regex::new(
        r"^([-+])?\s*(?:([0-9]+)[dD])?\s*(?:([0-9]+)[hH])?\s*(?:([0-9]+)[mM])?\s*(?:([0-9]+)[sS])?\s*(?:([0-9]+)(?:[mM][sS])?)?$"
    ).unwrap();
}

fn group_i64(captures: &Captures<'_>, index: usize, expression: &str) -> CompileResult<i64> {
    match captures.get(index) {
        Some(m) => m
            .as_str()
            .parse::<i64>()
            .map_err(|e| CompileError::malformed_timer(expression, e.to_string())),
        None => Ok(0),
    }
}

fn checked_sum(parts: &[(i64, i64)], expression: &str) -> CompileResult<i64> {
    parts.iter().try_fold(0i64, |acc, (value, unit)| {
        value
            .checked_mul(*unit)
            .and_then(|v| acc.checked_add(v))
            .ok_or_else(|| CompileError::malformed_timer(expression, "duration overflows milliseconds"))
    })
}

/// Whether the text looks like an ISO-8601 duration rather than a date or time string
pub fn is_iso_duration(text: &str) -> bool {
    let text = text.trim_start_matches(['-', '+']);
    text.starts_with('P') || text.starts_with('p')
}

/// Parse an ISO-8601 duration (`PnDTnHnMn.nS`) into milliseconds.
pub fn parse_iso_duration(text: &str) -> CompileResult<i64> {
    let trimmed = text.trim();
    let captures = ISO_DURATION_REGEX
        .captures(trimmed)
        .ok_or_else(|| CompileError::malformed_timer(text, "not an ISO-8601 duration"))?;

    let has_days = captures.get(2).is_some();
    let time_section = captures.get(3).map(|m| m.as_str()).unwrap_or("");
    if !has_days && time_section.is_empty() {
        return Err(CompileError::malformed_timer(text, "duration has no fields"));
    }
    if time_section.eq_ignore_ascii_case("T") {
        return Err(CompileError::malformed_timer(text, "time designator without fields"));
    }

    let fraction_ms = match captures.get(7) {
        Some(m) if !m.as_str().is_empty() => {
            let digits: String = m.as_str().chars().chain("000".chars()).take(3).collect();
            let ms = digits
                .parse::<i64>()
                .map_err(|e| CompileError::malformed_timer(text, e.to_string()))?;
            let seconds_negative = captures.get(6).is_some_and(|s| s.as_str().starts_with('-'));
            if seconds_negative { -ms } else { ms }
        }
        _ => 0,
    };

    let total = checked_sum(
        &[
            (group_i64(&captures, 2, text)?, MS_PER_DAY),
            (group_i64(&captures, 4, text)?, MS_PER_HOUR),
            (group_i64(&captures, 5, text)?, MS_PER_MINUTE),
            (group_i64(&captures, 6, text)?, MS_PER_SECOND),
            (fraction_ms, 1),
        ],
        text,
    )?;

    if &captures[1] == "-" {
        Ok(-total)
    } else {
        Ok(total)
    }
}

/// Parse a legacy time string (`1d 2h 30m 10s 500ms`, or plain milliseconds).
pub fn parse_time_string(text: &str) -> CompileResult<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CompileError::malformed_timer(text, "empty time expression"));
    }
    let captures = TIME_STRING_REGEX
        .captures(trimmed)
        .ok_or_else(|| CompileError::malformed_timer(text, "unrecognised time expression"))?;
    if (2..=6).all(|i| captures.get(i).is_none()) {
        return Err(CompileError::malformed_timer(text, "time expression has no value"));
    }

    let total = checked_sum(
        &[
            (group_i64(&captures, 2, text)?, MS_PER_DAY),
            (group_i64(&captures, 3, text)?, MS_PER_HOUR),
            (group_i64(&captures, 4, text)?, MS_PER_MINUTE),
            (group_i64(&captures, 5, text)?, MS_PER_SECOND),
            (group_i64(&captures, 6, text)?, 1),
        ],
        text,
    )?;

    match captures.get(1).map(|m| m.as_str()) {
        Some("-") => Ok(-total),
        _ => Ok(total),
    }
}

/// Parse either an ISO-8601 duration or a legacy time string into milliseconds.
pub fn parse_duration_ms(text: &str) -> CompileResult<i64> {
    if is_iso_duration(text.trim()) {
        parse_iso_duration(text)
    } else {
        parse_time_string(text)
    }
}

/// Parse an ISO-8601 date-time with offset.
pub fn parse_instant(text: &str) -> CompileResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text.trim())
        .map_err(|e| CompileError::malformed_timer(text, format!("not an ISO-8601 date-time: {}", e)))
}

/// Render milliseconds as an ISO-8601 duration, e.g. `PT5M`, `P1DT2H`, `PT0.5S`.
pub fn format_duration(ms: i64) -> String {
    if ms == 0 {
        return "PT0S".to_string();
    }
    let sign = if ms < 0 { "-" } else { "" };
    let mut rest = ms.unsigned_abs();

    let days = rest / MS_PER_DAY as u64;
    rest %= MS_PER_DAY as u64;
    let hours = rest / MS_PER_HOUR as u64;
    rest %= MS_PER_HOUR as u64;
    let minutes = rest / MS_PER_MINUTE as u64;
    rest %= MS_PER_MINUTE as u64;
    let seconds = rest / MS_PER_SECOND as u64;
    let millis = rest % MS_PER_SECOND as u64;

    let mut out = format!("{}P", sign);
    if days > 0 {
        out.push_str(&format!("{}D", days));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || millis > 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{}H", hours));
        }
        if minutes > 0 {
            out.push_str(&format!("{}M", minutes));
        }
        if millis > 0 {
            let fraction = format!("{:03}", millis);
            out.push_str(&format!("{}.{}S", seconds, fraction.trim_end_matches('0')));
        } else if seconds > 0 {
            out.push_str(&format!("{}S", seconds));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_durations() {
        assert_eq!(parse_iso_duration("PT5M").unwrap(), 5 * MS_PER_MINUTE);
        assert_eq!(parse_iso_duration("P1DT2H").unwrap(), MS_PER_DAY + 2 * MS_PER_HOUR);
        assert_eq!(parse_iso_duration("PT0.5S").unwrap(), 500);
        assert_eq!(parse_iso_duration("PT1,25S").unwrap(), 1_250);
        assert_eq!(parse_iso_duration("-PT10S").unwrap(), -10_000);
        assert_eq!(parse_iso_duration("pt1h").unwrap(), MS_PER_HOUR);
    }

    #[test]
    fn test_invalid_iso_durations() {
        for text in ["P", "PT", "P1Y", "PT5X", "5M", ""] {
            assert!(
                matches!(parse_iso_duration(text), Err(CompileError::MalformedTimerExpression { .. })),
                "expected '{}' to be rejected",
                text
            );
        }
    }

    #[test]
    fn test_time_strings() {
        assert_eq!(parse_time_string("1000").unwrap(), 1_000);
        assert_eq!(parse_time_string("5m").unwrap(), 5 * MS_PER_MINUTE);
        assert_eq!(parse_time_string("500ms").unwrap(), 500);
        assert_eq!(
            parse_time_string("1d 2h 30m 10s 5ms").unwrap(),
            MS_PER_DAY + 2 * MS_PER_HOUR + 30 * MS_PER_MINUTE + 10 * MS_PER_SECOND + 5
        );
        assert_eq!(parse_time_string("-2s").unwrap(), -2_000);
    }

    #[test]
    fn test_invalid_time_strings() {
        for text in ["", "   ", "soon", "5 minutes", "-"] {
            assert!(parse_time_string(text).is_err(), "expected '{}' to be rejected", text);
        }
    }

    #[test]
    fn test_parse_duration_dispatch() {
        assert_eq!(parse_duration_ms("PT1S").unwrap(), 1_000);
        assert_eq!(parse_duration_ms("1s").unwrap(), 1_000);
        assert_eq!(parse_duration_ms(" 250 ").unwrap(), 250);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "PT0S");
        assert_eq!(format_duration(5 * MS_PER_MINUTE), "PT5M");
        assert_eq!(format_duration(MS_PER_DAY + 2 * MS_PER_HOUR), "P1DT2H");
        assert_eq!(format_duration(MS_PER_DAY), "P1D");
        assert_eq!(format_duration(1_500), "PT1.5S");
        assert_eq!(format_duration(-10_000), "-PT10S");
    }

    #[test]
    fn test_format_then_parse_agrees() {
        for ms in [1, 999, 1_000, 61_001, MS_PER_DAY + 1, 3 * MS_PER_HOUR + 7] {
            assert_eq!(parse_iso_duration(&format_duration(ms)).unwrap(), ms);
        }
    }

    #[test]
    fn test_parse_instant() {
        let instant = parse_instant("2030-01-01T10:00:00+02:00").unwrap();
        assert_eq!(instant.timestamp(), 1_893_484_800);
        assert!(parse_instant("tomorrow").is_err());
    }
}
