mod timer;
mod trigger;

pub use timer::{EventSubProcess, Timer, TimerType};
pub use trigger::{
    ConstraintTrigger, EventKind, EventTrigger, EventTypeFilter, Mappings, Trigger,
    COMPENSATE_PREFIX, ERROR_PREFIX, ESCALATION_PREFIX, MESSAGE_PREFIX, TIMER_PREFIX,
};

use serde::{Deserialize, Serialize};

/// The compiled form of a start event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartConstruct {
    /// Identifier of the start event (used in diagnostics and synthetic ids)
    pub id: String,

    /// Optional human-readable name
    #[serde(default)]
    pub name: Option<String>,

    /// Whether firing interrupts the enclosing scope
    #[serde(default = "default_true")]
    pub interrupting: bool,

    /// At most one trigger once compiled
    #[serde(default)]
    pub triggers: Vec<Trigger>,

    /// Round-trip metadata recorded by the compiler
    #[serde(default)]
    pub metadata: Metadata,

    /// Process variable → output slot emitted by this start event
    #[serde(default)]
    pub out_mappings: Mappings,
}

impl StartConstruct {
    pub fn new(id: impl Into<String>) -> Self {
        StartConstruct {
            id: id.into(),
            name: None,
            interrupting: true,
            triggers: Vec::new(),
            metadata: Metadata::default(),
            out_mappings: Mappings::new(),
        }
    }

    pub fn add_trigger(&mut self, trigger: Trigger) {
        self.triggers.push(trigger);
    }

    pub fn add_out_mapping(&mut self, variable: impl Into<String>, slot: impl Into<String>) {
        self.out_mappings.insert(variable.into(), slot.into());
    }

    pub fn out_mapping(&self, variable: &str) -> Option<&str> {
        self.out_mappings.get(variable).map(String::as_str)
    }

    /// The single trigger of a compiled start event, if any
    pub fn trigger(&self) -> Option<&Trigger> {
        self.triggers.first()
    }
}

/// Known metadata recorded on a start construct
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Declared payload type of the referenced message
    #[serde(default)]
    pub message_type: Option<String>,

    /// Timer expression exactly as written
    #[serde(default)]
    pub timer_def: Option<String>,

    #[serde(default)]
    pub timer_type: Option<TimerType>,

    /// Language of a cycle timer, recorded only when it is not the default
    #[serde(default)]
    pub timer_language: Option<String>,

    /// Target variable of the start event's data output association
    #[serde(default)]
    pub trigger_mapping: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_construct_is_plain_start() {
        let construct = StartConstruct::new("_1");
        assert!(construct.interrupting);
        assert!(construct.trigger().is_none());
        assert_eq!(construct.metadata, Metadata::default());
    }

    #[test]
    fn test_out_mapping_lookup() {
        let mut construct = StartConstruct::new("_1");
        construct.add_out_mapping("order", "event");
        assert_eq!(construct.out_mapping("order"), Some("event"));
        assert_eq!(construct.out_mapping("missing"), None);
    }
}
