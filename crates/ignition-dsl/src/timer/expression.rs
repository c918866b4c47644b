use chrono::{DateTime, FixedOffset, Utc};
use tracing::debug;

use super::duration::{is_iso_duration, parse_duration_ms, parse_instant, parse_time_string};
use crate::error::{CompileError, CompileResult};
use crate::model::TimerType;

/// Separator of the legacy `<delay>###<period>` cycle form
const DELAY_PERIOD_SEPARATOR: &str = "###";

/// Default minimum first-occurrence delay for repeating cycles (milliseconds)
pub const DEFAULT_MIN_START_DELAY_MS: i64 = 1_000;

/// A parsed timer definition.
///
/// The numeric fields are derived from `raw_definition`, which is kept
/// verbatim and remains the source of truth when writing the timer back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSpec {
    pub kind: TimerType,
    /// Milliseconds until the first firing
    pub delay: i64,
    /// Milliseconds between firings (0 for one-shot timers)
    pub period: i64,
    /// Total number of firings, or -1 when unbounded
    pub repeat_limit: i64,
    pub raw_definition: String,
}

/// Parses the three timer sub-forms relative to a reference instant.
#[derive(Debug, Clone)]
pub struct TimerParser {
    now: Option<DateTime<FixedOffset>>,
    min_start_delay_ms: i64,
}

impl Default for TimerParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerParser {
    /// Parser evaluating dates against the wall clock
    pub fn new() -> Self {
        TimerParser {
            now: None,
            min_start_delay_ms: DEFAULT_MIN_START_DELAY_MS,
        }
    }

    /// Parser evaluating dates against a fixed instant
    pub fn at(now: DateTime<FixedOffset>) -> Self {
        TimerParser {
            now: Some(now),
            ..Self::new()
        }
    }

    pub fn with_min_start_delay(mut self, ms: i64) -> Self {
        self.min_start_delay_ms = ms;
        self
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.now.unwrap_or_else(|| Utc::now().fixed_offset())
    }

    fn millis_until(&self, instant: DateTime<FixedOffset>) -> i64 {
        (instant - self.now()).num_milliseconds()
    }

    /// Parse a `timeCycle` expression.
    ///
    /// Repeating forms are `R[n]/<duration>`, `R[n]/<start>/<duration>`,
    /// `R[n]/<duration>/<end>` and `R[n]/<start>/<end>`. Anything else is a
    /// single value, or `<delay>###<period>`.
    pub fn parse_cycle(&self, expression: &str) -> CompileResult<TimerSpec> {
        let text = expression.trim();
        if text.is_empty() {
            return Err(CompileError::malformed_timer(expression, "empty cycle expression"));
        }

        let spec = if let Some(rest) = text.strip_prefix('R') {
            self.parse_repeating(expression, rest)?
        } else if let Some((delay, period)) = text.split_once(DELAY_PERIOD_SEPARATOR) {
            TimerSpec {
                kind: TimerType::Cycle,
                delay: parse_time_string(delay)?,
                period: parse_time_string(period)?,
                repeat_limit: -1,
                raw_definition: expression.to_string(),
            }
        } else {
            let value = parse_duration_ms(text)?;
            TimerSpec {
                kind: TimerType::Cycle,
                delay: value,
                period: value,
                repeat_limit: -1,
                raw_definition: expression.to_string(),
            }
        };

        debug!(
            expression,
            delay = spec.delay,
            period = spec.period,
            repeat_limit = spec.repeat_limit,
            "Parsed timer cycle"
        );
        Ok(spec)
    }

    fn parse_repeating(&self, expression: &str, rest: &str) -> CompileResult<TimerSpec> {
        let elements: Vec<&str> = rest.split('/').collect();
        let repeats = elements[0];
        let repeat_limit = if repeats.is_empty() {
            -1
        } else {
            let count = repeats.parse::<i64>().map_err(|_| {
                CompileError::malformed_timer(expression, format!("invalid repeat count '{}'", repeats))
            })?;
            if count < 0 {
                return Err(CompileError::malformed_timer(expression, "negative repeat count"));
            }
            count
                .checked_add(1)
                .ok_or_else(|| CompileError::malformed_timer(expression, "repeat count too large"))?
        };

        let (start_delay, period) = match elements.as_slice() {
            [_, period] => (0, parse_duration_ms(period)?),
            [_, first, second] if is_iso_duration(first) => {
                let period = parse_duration_ms(first)?;
                let end = parse_instant(second)?;
                let start = self
                    .millis_until(end)
                    .checked_sub(period)
                    .ok_or_else(|| CompileError::malformed_timer(expression, "interval start out of range"))?;
                (start, period)
            }
            [_, first, second] if is_iso_duration(second) => {
                let start = parse_instant(first)?;
                (self.millis_until(start), parse_duration_ms(second)?)
            }
            [_, first, second] => {
                let start = parse_instant(first)?;
                let end = parse_instant(second)?;
                (self.millis_until(start), (end - start).num_milliseconds())
            }
            _ => {
                return Err(CompileError::malformed_timer(
                    expression,
                    "repeating interval must have two or three '/'-separated parts",
                ))
            }
        };

        // the runtime needs a moment to initialise before the first firing
        let delay = if start_delay <= 0 {
            self.min_start_delay_ms
        } else {
            start_delay
        };

        Ok(TimerSpec {
            kind: TimerType::Cycle,
            delay,
            period,
            repeat_limit,
            raw_definition: expression.to_string(),
        })
    }

    /// Parse a `timeDuration` expression into a one-shot delay.
    pub fn parse_duration(&self, expression: &str) -> CompileResult<TimerSpec> {
        let delay = parse_duration_ms(expression)?;
        Ok(TimerSpec {
            kind: TimerType::Duration,
            delay,
            period: 0,
            repeat_limit: -1,
            raw_definition: expression.to_string(),
        })
    }

    /// Parse a `timeDate` expression into a delay measured from now.
    ///
    /// Text that is not a date-time is read as a legacy time string.
    pub fn parse_date(&self, expression: &str) -> CompileResult<TimerSpec> {
        let delay = match parse_instant(expression) {
            Ok(instant) => self.millis_until(instant),
            Err(_) => parse_time_string(expression)?,
        };
        Ok(TimerSpec {
            kind: TimerType::Date,
            delay,
            period: 0,
            repeat_limit: -1,
            raw_definition: expression.to_string(),
        })
    }

    /// Parse according to the sub-element kind
    pub fn parse(&self, kind: TimerType, expression: &str) -> CompileResult<TimerSpec> {
        match kind {
            TimerType::Cycle => self.parse_cycle(expression),
            TimerType::Duration => self.parse_duration(expression),
            TimerType::Date => self.parse_date(expression),
        }
    }
}
