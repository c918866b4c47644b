//! # Ignition DSL
//!
//! Compiles the start events of BPMN process definitions into a trigger model
//! a process runtime can consume, and writes that model back out as markup.
//!
//! ## Features
//!
//! * Plain, conditional, signal, message, timer, error, escalation and
//!   compensation start events
//! * Timer expressions: ISO-8601 repeating intervals, durations and dates,
//!   plus the legacy time-string and timer-header encodings
//! * Reference resolution against declared messages, errors and escalations
//! * Event-subprocess rules for timers and error start events
//! * A writer that is the inverse of the compiler
//!
//! ## Example
//!
//! ```
//! use ignition_dsl::{compile_start_event, write_start_event, Registries, StartContext, TracingSink};
//!
//! let markup = r#"
//! <startEvent id="_1" name="StartProcess">
//!   <signalEventDefinition signalRef="MySignal"/>
//! </startEvent>
//! "#;
//!
//! let construct = compile_start_event(markup, StartContext::Process, &Registries::new(), &mut TracingSink)
//!     .unwrap();
//! assert_eq!(construct.triggers.len(), 1);
//!
//! let written = write_start_event(&construct).unwrap();
//! assert!(written.contains("signalRef=\"MySignal\""));
//! ```

mod builder;
mod config;
mod diagnostics;
mod error;
mod registry;
mod writer;

pub mod markup;
pub mod model;
pub mod timer;

pub use builder::{StartContext, StartEventCompiler};
pub use config::{CompilerConfig, DEFAULT_RULE_LANGUAGE};
pub use diagnostics::{CollectingSink, DiagnosticSink, TracingSink, Warning};
pub use error::{CompileError, CompileResult, ReferenceKind, RegistryKind};
pub use model::{
    ConstraintTrigger, EventKind, EventSubProcess, EventTrigger, EventTypeFilter, Metadata,
    StartConstruct, Timer, TimerType, Trigger,
};
pub use registry::{ErrorDefinition, Escalation, Message, Registries};
pub use writer::{write_start_event, StartEventWriter};

/// Parse and compile a `startEvent` markup fragment.
///
/// # Arguments
///
/// * `markup` - A fragment whose root element is `startEvent`
/// * `context` - Whether the start event belongs to an event-subprocess
/// * `registries` - Declared messages, errors and escalations
/// * `sink` - Receives non-fatal warnings
///
/// # Errors
///
/// * Markup that cannot be read
/// * Missing registries or unresolved references
/// * Unsupported child structure
/// * Malformed timer expressions
///
/// # Examples
///
/// ```
/// use ignition_dsl::{compile_start_event, CollectingSink, CompileError, Registries, StartContext};
///
/// let markup = r#"<startEvent id="_1"><messageEventDefinition messageRef="order"/></startEvent>"#;
/// let mut sink = CollectingSink::new();
///
/// let result = compile_start_event(markup, StartContext::Process, &Registries::new(), &mut sink);
/// assert!(matches!(result, Err(CompileError::MissingRegistry { .. })));
/// ```
pub fn compile_start_event(
    markup: &str,
    context: StartContext<'_>,
    registries: &Registries,
    sink: &mut dyn DiagnosticSink,
) -> Result<StartConstruct, CompileError> {
    let element = markup::parse_fragment(markup)?;
    StartEventCompiler::new(registries).compile(&element, context, sink)
}

/// Initialize tracing output filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init();
}

/// Returns a version string for the Ignition DSL crate
///
/// # Examples
///
/// ```
/// use ignition_dsl::version;
///
/// let ver = version();
/// assert!(ver.starts_with("0."));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
