use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CompileError, CompileResult, ReferenceKind, RegistryKind};

/// A declared message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    /// Declared payload type
    #[serde(rename = "type")]
    pub message_type: String,
}

/// A declared error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDefinition {
    pub id: String,
    pub error_code: String,
}

/// A declared escalation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    pub id: String,
    pub escalation_code: String,
}

/// Reference tables supplied by the enclosing compilation unit.
///
/// A table that is `None` was never supplied; that is reported differently
/// from a reference missing in a supplied table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registries {
    #[serde(default)]
    pub messages: Option<HashMap<String, Message>>,
    #[serde(default)]
    pub errors: Option<HashMap<String, ErrorDefinition>>,
    #[serde(default)]
    pub escalations: Option<HashMap<String, Escalation>>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages = Some(messages.into_iter().map(|m| (m.id.clone(), m)).collect());
        self
    }

    pub fn with_errors(mut self, errors: impl IntoIterator<Item = ErrorDefinition>) -> Self {
        self.errors = Some(errors.into_iter().map(|e| (e.id.clone(), e)).collect());
        self
    }

    pub fn with_escalations(mut self, escalations: impl IntoIterator<Item = Escalation>) -> Self {
        self.escalations = Some(escalations.into_iter().map(|e| (e.id.clone(), e)).collect());
        self
    }

    /// Resolve `reference` in the registry of `kind` to its semantic code:
    /// the message type, error code or escalation code.
    pub fn resolve(&self, kind: RegistryKind, reference: &str, construct: &str) -> CompileResult<&str> {
        let missing = || CompileError::MissingRegistry {
            kind,
            construct: construct.to_string(),
        };
        let unresolved = || CompileError::UnresolvedReference {
            kind: ReferenceKind::Registry(kind),
            reference: reference.to_string(),
            construct: construct.to_string(),
        };

        match kind {
            RegistryKind::Messages => self
                .messages
                .as_ref()
                .ok_or_else(missing)?
                .get(reference)
                .map(|m| m.message_type.as_str())
                .ok_or_else(unresolved),
            RegistryKind::Errors => self
                .errors
                .as_ref()
                .ok_or_else(missing)?
                .get(reference)
                .map(|e| e.error_code.as_str())
                .ok_or_else(unresolved),
            RegistryKind::Escalations => self
                .escalations
                .as_ref()
                .ok_or_else(missing)?
                .get(reference)
                .map(|e| e.escalation_code.as_str())
                .ok_or_else(unresolved),
        }
    }
}
