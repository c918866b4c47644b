//! Legacy textual timer header carried on constraint triggers.
//!
//! Format: `timer (<language>:<delay> <period>[ repeat-limit=<n>])` for
//! cycles in the default language, `timer (<language>:<delay>)` otherwise.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use super::expression::TimerSpec;
use crate::error::{CompileError, CompileResult};
use crate::model::TimerType;

/// Timer language whose delay and period are numeric
pub const DEFAULT_TIMER_LANGUAGE: &str = "int";

lazy_static! {
    // language is a plain token or a URI such as "http://www.mvel.org/2.0";
    // the body may span lines
    static ref HEADER_REGEX: Regex = Regex::new(
        r"(?s)^timer \(((?:[A-Za-z][A-Za-z0-9+.\-]*://)?[^:()]+):(.*)\)$"
    ).unwrap();

    static ref INT_BODY_REGEX: Regex = Regex::new(
        r"^(\S+)(?: (\S+)(?: repeat-limit=(-?[0-9]+))?)?$"
    ).unwrap();
}

/// Decoded form of a timer header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerHeader {
    pub language: String,
    pub delay: String,
    pub period: Option<String>,
    pub repeat_limit: Option<i64>,
}

impl TimerHeader {
    /// Header for a parsed timer in the default language.
    ///
    /// Durations and dates become one-shot cycles with a zero period.
    pub fn for_spec(spec: &TimerSpec) -> Self {
        let repeat_limit = match spec.kind {
            TimerType::Cycle if spec.repeat_limit != -1 => Some(spec.repeat_limit),
            _ => None,
        };
        TimerHeader {
            language: DEFAULT_TIMER_LANGUAGE.to_string(),
            delay: spec.delay.to_string(),
            period: Some(spec.period.to_string()),
            repeat_limit,
        }
    }

    /// Header for a cycle in a language the compiler does not interpret
    pub fn verbatim(language: &str, expression: &str) -> Self {
        TimerHeader {
            language: language.to_string(),
            delay: expression.to_string(),
            period: None,
            repeat_limit: None,
        }
    }

    pub fn is_default_language(&self) -> bool {
        self.language == DEFAULT_TIMER_LANGUAGE
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Inverse of [`TimerHeader::encode`]
    pub fn decode(header: &str) -> CompileResult<Self> {
        let captures = HEADER_REGEX
            .captures(header)
            .ok_or_else(|| CompileError::malformed_timer(header, "not a timer header"))?;
        let language = captures[1].to_string();
        let body = &captures[2];

        if language != DEFAULT_TIMER_LANGUAGE {
            return Ok(TimerHeader::verbatim(&language, body));
        }

        let parts = INT_BODY_REGEX
            .captures(body)
            .ok_or_else(|| CompileError::malformed_timer(header, "malformed delay and period"))?;
        let repeat_limit = match parts.get(3) {
            Some(m) => Some(m.as_str().parse::<i64>().map_err(|e| {
                CompileError::malformed_timer(header, format!("invalid repeat limit: {}", e))
            })?),
            None => None,
        };

        Ok(TimerHeader {
            language,
            delay: parts[1].to_string(),
            period: parts.get(2).map(|m| m.as_str().to_string()),
            repeat_limit,
        })
    }
}

impl fmt::Display for TimerHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer ({}:{}", self.language, self.delay)?;
        if self.is_default_language() {
            if let Some(period) = &self.period {
                write!(f, " {}", period)?;
                if let Some(limit) = self.repeat_limit {
                    write!(f, " repeat-limit={}", limit)?;
                }
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: TimerType, delay: i64, period: i64, repeat_limit: i64) -> TimerSpec {
        TimerSpec {
            kind,
            delay,
            period,
            repeat_limit,
            raw_definition: String::new(),
        }
    }

    #[test]
    fn test_encode_cycle_forms() {
        let unbounded = TimerHeader::for_spec(&spec(TimerType::Cycle, 1000, 5000, -1));
        assert_eq!(unbounded.encode(), "timer (int:1000 5000)");

        let limited = TimerHeader::for_spec(&spec(TimerType::Cycle, 1000, 300000, 4));
        assert_eq!(limited.encode(), "timer (int:1000 300000 repeat-limit=4)");
    }

    #[test]
    fn test_encode_one_shot_forms() {
        let duration = TimerHeader::for_spec(&spec(TimerType::Duration, 7200000, 0, -1));
        assert_eq!(duration.encode(), "timer (int:7200000 0)");

        let date = TimerHeader::for_spec(&spec(TimerType::Date, 42, 0, -1));
        assert_eq!(date.encode(), "timer (int:42 0)");
    }

    #[test]
    fn test_encode_other_language() {
        let header = TimerHeader::verbatim("cron", "0 0/5 * * * ?");
        assert_eq!(header.encode(), "timer (cron:0 0/5 * * * ?)");
    }

    #[test]
    fn test_decode_inverts_encode() {
        let headers = vec![
            TimerHeader::for_spec(&spec(TimerType::Cycle, 1000, 5000, -1)),
            TimerHeader::for_spec(&spec(TimerType::Cycle, 1000, 300000, 4)),
            TimerHeader::for_spec(&spec(TimerType::Duration, 60000, 0, -1)),
            TimerHeader::for_spec(&spec(TimerType::Date, -5, 0, -1)),
            TimerHeader::verbatim("cron", "0 0/5 * * * ?"),
            TimerHeader::verbatim("mvel", "(int) x"),
            TimerHeader::verbatim("http://www.mvel.org/2.0", "x + 1"),
            TimerHeader::verbatim("mvel", "a\nb"),
            TimerHeader::verbatim("http://www.mvel.org/2.0", "if (x) {\n  return \"a:b\";\n}"),
        ];
        for header in headers {
            assert_eq!(TimerHeader::decode(&header.encode()).unwrap(), header);
        }
    }

    #[test]
    fn test_decode_uri_language() {
        let header = TimerHeader::decode("timer (http://www.mvel.org/2.0:x + 1)").unwrap();
        assert_eq!(header.language, "http://www.mvel.org/2.0");
        assert_eq!(header.delay, "x + 1");
        assert!(!header.is_default_language());
    }

    #[test]
    fn test_decode_legacy_single_value() {
        let header = TimerHeader::decode("timer (int:5m)").unwrap();
        assert_eq!(header.delay, "5m");
        assert_eq!(header.period, None);
        assert_eq!(header.repeat_limit, None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        for text in ["", "timer", "timer ()", "timer (int:1 2 3)", "timer (int:1 2 repeat-limit=x)", "alarm (int:1 2)"] {
            assert!(
                matches!(TimerHeader::decode(text), Err(CompileError::MalformedTimerExpression { .. })),
                "expected '{}' to be rejected",
                text
            );
        }
    }
}
