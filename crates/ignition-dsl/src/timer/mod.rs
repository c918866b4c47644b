//! Timer expressions and the legacy timer header encoding.

mod duration;
mod expression;
mod header;

pub use duration::{
    format_duration, is_iso_duration, parse_duration_ms, parse_instant, parse_iso_duration,
    parse_time_string,
};
pub use expression::{TimerParser, TimerSpec, DEFAULT_MIN_START_DELAY_MS};
pub use header::{TimerHeader, DEFAULT_TIMER_LANGUAGE};
