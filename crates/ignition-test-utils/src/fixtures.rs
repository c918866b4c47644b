//! Registry fixtures.

use ignition_dsl::{ErrorDefinition, Escalation, Message, Registries};

/// Message declared by [`full_registries`]
pub const ORDER_MESSAGE: &str = "OrderMessage";
/// Payload type of [`ORDER_MESSAGE`]
pub const ORDER_MESSAGE_TYPE: &str = "com.example.Order";
/// Error declared by [`full_registries`]; its id equals its code so it survives a write
pub const FAILURE_ERROR: &str = "Failure";
/// Escalation declared by [`full_registries`]; its id equals its code
pub const LATE_ESCALATION: &str = "Late";

pub fn message(id: &str, message_type: &str) -> Message {
    Message {
        id: id.to_string(),
        message_type: message_type.to_string(),
    }
}

pub fn error(id: &str, code: &str) -> ErrorDefinition {
    ErrorDefinition {
        id: id.to_string(),
        error_code: code.to_string(),
    }
}

pub fn escalation(id: &str, code: &str) -> Escalation {
    Escalation {
        id: id.to_string(),
        escalation_code: code.to_string(),
    }
}

/// All three registries, each with one declaration
pub fn full_registries() -> Registries {
    Registries::new()
        .with_messages(vec![message(ORDER_MESSAGE, ORDER_MESSAGE_TYPE)])
        .with_errors(vec![error(FAILURE_ERROR, FAILURE_ERROR)])
        .with_escalations(vec![escalation(LATE_ESCALATION, LATE_ESCALATION)])
}
