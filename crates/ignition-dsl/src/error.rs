use std::fmt;

use thiserror::Error;

/// The reference tables a start event may resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    Messages,
    Errors,
    Escalations,
}

impl RegistryKind {
    /// Singular noun used in diagnostics ("message", "error", ...)
    pub fn noun(&self) -> &'static str {
        match self {
            RegistryKind::Messages => "message",
            RegistryKind::Errors => "error",
            RegistryKind::Escalations => "escalation",
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryKind::Messages => write!(f, "Messages"),
            RegistryKind::Errors => write!(f, "Errors"),
            RegistryKind::Escalations => write!(f, "Escalations"),
        }
    }
}

/// What an unresolved reference was pointing at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Registry(RegistryKind),
    DataOutput,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Registry(kind) => write!(f, "{}", kind.noun()),
            ReferenceKind::DataOutput => write!(f, "dataOutput"),
        }
    }
}

/// All fatal errors that can occur while compiling or writing a start event
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// A reference table was never supplied to the compilation context
    #[error("No {kind} registry available while compiling start event '{construct}'")]
    MissingRegistry { kind: RegistryKind, construct: String },

    /// A reference did not match any declaration
    #[error("Could not find {kind} '{reference}' referenced by start event '{construct}'")]
    UnresolvedReference {
        kind: ReferenceKind,
        reference: String,
        construct: String,
    },

    /// The markup has a shape the compiler does not support
    #[error("Unsupported structure in start event '{construct}': {message}")]
    UnsupportedStructure { message: String, construct: String },

    /// A timer expression could not be parsed
    #[error("Malformed timer expression '{expression}': {reason}")]
    MalformedTimerExpression { expression: String, reason: String },

    /// The markup fragment itself could not be read
    #[error("Markup error: {0}")]
    Markup(String),

    /// Compiler configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CompileError {
    pub(crate) fn malformed_timer(expression: &str, reason: impl Into<String>) -> Self {
        CompileError::MalformedTimerExpression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(construct: &str, message: impl Into<String>) -> Self {
        CompileError::UnsupportedStructure {
            message: message.into(),
            construct: construct.to_string(),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CompileError::MissingRegistry { .. } => "ERR_START_MISSING_REGISTRY",
            CompileError::UnresolvedReference { .. } => "ERR_START_UNRESOLVED_REFERENCE",
            CompileError::UnsupportedStructure { .. } => "ERR_START_UNSUPPORTED_STRUCTURE",
            CompileError::MalformedTimerExpression { .. } => "ERR_START_MALFORMED_TIMER",
            CompileError::Markup(_) => "ERR_START_MARKUP",
            CompileError::Config(_) => "ERR_START_CONFIG",
        }
    }
}

impl From<quick_xml::Error> for CompileError {
    fn from(err: quick_xml::Error) -> Self {
        CompileError::Markup(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for CompileError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        CompileError::Markup(err.to_string())
    }
}

/// Shorthand used throughout the crate
pub type CompileResult<T> = Result<T, CompileError>;
