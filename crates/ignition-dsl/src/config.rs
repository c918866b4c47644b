//! Configuration for the start-event compiler
//!
//! Values come from defaults, an optional YAML document and environment
//! overrides, in that order.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

use crate::error::{CompileError, CompileResult};
use crate::timer::{DEFAULT_MIN_START_DELAY_MS, DEFAULT_TIMER_LANGUAGE};

/// Rule language written on conditional start events
pub const DEFAULT_RULE_LANGUAGE: &str = "http://www.jboss.org/drools/rule";

/// Compiler and writer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Language assumed for `timeCycle` elements without one
    #[serde(default = "default_timer_language")]
    pub default_timer_language: String,

    /// Language attribute written on `condition` elements
    #[serde(default = "default_rule_language")]
    pub rule_language: String,

    /// First-firing delay used when a repeating cycle would start in the past
    #[serde(default = "default_min_start_delay_ms")]
    pub min_start_delay_ms: i64,

    /// Spaces per nesting level in written markup
    #[serde(default = "default_indent")]
    pub indent: usize,
}

fn default_timer_language() -> String {
    DEFAULT_TIMER_LANGUAGE.to_string()
}

fn default_rule_language() -> String {
    DEFAULT_RULE_LANGUAGE.to_string()
}

fn default_min_start_delay_ms() -> i64 {
    DEFAULT_MIN_START_DELAY_MS
}

fn default_indent() -> usize {
    2
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            default_timer_language: default_timer_language(),
            rule_language: default_rule_language(),
            min_start_delay_ms: default_min_start_delay_ms(),
            indent: default_indent(),
        }
    }
}

impl CompilerConfig {
    /// Parse a YAML document; missing keys take their defaults
    pub fn from_yaml_str(yaml: &str) -> CompileResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| CompileError::Config(e.to_string()))
    }

    /// Apply `IGNITION_*` environment variables. Invalid values are logged and ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(language) = env::var("IGNITION_DEFAULT_TIMER_LANGUAGE") {
            if language.trim().is_empty() {
                warn!("Ignoring blank IGNITION_DEFAULT_TIMER_LANGUAGE");
            } else {
                self.default_timer_language = language;
            }
        }

        if let Ok(language) = env::var("IGNITION_RULE_LANGUAGE") {
            if language.trim().is_empty() {
                warn!("Ignoring blank IGNITION_RULE_LANGUAGE");
            } else {
                self.rule_language = language;
            }
        }

        if let Ok(delay) = env::var("IGNITION_MIN_START_DELAY_MS") {
            match delay.parse::<i64>() {
                Ok(delay) if delay >= 0 => self.min_start_delay_ms = delay,
                _ => warn!("Invalid IGNITION_MIN_START_DELAY_MS value: {}", delay),
            }
        }

        if let Ok(indent) = env::var("IGNITION_WRITER_INDENT") {
            if let Ok(indent) = indent.parse::<usize>() {
                self.indent = indent;
            } else {
                warn!("Invalid IGNITION_WRITER_INDENT value: {}", indent);
            }
        }

        self
    }
}
