use std::fmt;
use tracing::warn;

/// Non-fatal findings reported while compiling a start event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// An element was dropped for backward compatibility
    IgnoredConstruct { element: String, construct: String },

    /// A non-interrupting error start event was forced to interrupt
    InterruptingOverride { construct: String },
}

impl Warning {
    pub fn code(&self) -> &'static str {
        match self {
            Warning::IgnoredConstruct { .. } => "WARN_START_IGNORED_CONSTRUCT",
            Warning::InterruptingOverride { .. } => "WARN_START_INTERRUPTING_OVERRIDE",
        }
    }

    pub fn construct(&self) -> &str {
        match self {
            Warning::IgnoredConstruct { construct, .. } => construct,
            Warning::InterruptingOverride { construct } => construct,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::IgnoredConstruct { element, construct } => write!(
                f,
                "Ignoring <{}> element on start event '{}': <{}> elements should not be used on start or other catch events",
                element, construct, element
            ),
            Warning::InterruptingOverride { construct } => write!(
                f,
                "Ignoring 'isInterrupting' attribute on start event '{}': error start events in an event sub-process always interrupt the containing process",
                construct
            ),
        }
    }
}

/// Receives warnings as they are found
pub trait DiagnosticSink {
    fn warning(&mut self, warning: Warning);
}

/// Forwards warnings to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warning(&mut self, warning: Warning) {
        warn!(code = warning.code(), construct = warning.construct(), "{}", warning);
    }
}

/// Keeps warnings for later inspection
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub warnings: Vec<Warning>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of collected warnings with the given code
    pub fn count(&self, code: &str) -> usize {
        self.warnings.iter().filter(|w| w.code() == code).count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}

impl DiagnosticSink for Vec<Warning> {
    fn warning(&mut self, warning: Warning) {
        self.push(warning);
    }
}
