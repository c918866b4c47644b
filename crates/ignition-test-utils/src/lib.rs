//! Testing utilities for the Ignition start-event compiler.
//!
//! Markup generators for each start-event kind, registry fixtures and
//! small helpers for compiling and recompiling constructs in tests.

pub mod data_generators;
pub mod fixtures;

use chrono::DateTime;
use ignition_dsl::markup::parse_fragment;
use ignition_dsl::timer::TimerParser;
use ignition_dsl::{
    CollectingSink, CompileResult, Registries, StartConstruct, StartContext, StartEventCompiler,
};

/// Instant used as "now" by [`fixed_parser`]
pub const FIXED_NOW: &str = "2030-01-01T00:00:00Z";

/// Timer parser pinned to [`FIXED_NOW`]
pub fn fixed_parser() -> TimerParser {
    TimerParser::at(DateTime::parse_from_rfc3339(FIXED_NOW).expect("FIXED_NOW is RFC 3339"))
}

/// Compile `markup` with a pinned clock, returning the result and collected warnings
pub fn compile_with(
    markup: &str,
    context: StartContext<'_>,
    registries: &Registries,
) -> (CompileResult<StartConstruct>, CollectingSink) {
    let mut sink = CollectingSink::new();
    let result = parse_fragment(markup).and_then(|element| {
        StartEventCompiler::new(registries)
            .with_timer_parser(fixed_parser())
            .compile(&element, context, &mut sink)
    });
    (result, sink)
}

/// Compile a process-level start event, panicking on failure
pub fn compile_ok(markup: &str, registries: &Registries) -> StartConstruct {
    let (result, _) = compile_with(markup, StartContext::Process, registries);
    result.unwrap_or_else(|e| panic!("Failed to compile start event: {}\n{}", e, markup))
}

/// Install a test subscriber honouring `RUST_LOG`; repeated calls are harmless
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
