use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variable name → slot name
pub type Mappings = BTreeMap<String, String>;

pub const MESSAGE_PREFIX: &str = "Message-";
pub const ERROR_PREFIX: &str = "Error-";
pub const ESCALATION_PREFIX: &str = "Escalation-";
pub const COMPENSATE_PREFIX: &str = "Compensate-";
pub const TIMER_PREFIX: &str = "Timer-";

/// The compiled condition under which a start event fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    Constraint(ConstraintTrigger),
    Event(EventTrigger),
}

impl Trigger {
    pub fn as_constraint(&self) -> Option<&ConstraintTrigger> {
        match self {
            Trigger::Constraint(trigger) => Some(trigger),
            Trigger::Event(_) => None,
        }
    }

    pub fn as_event(&self) -> Option<&EventTrigger> {
        match self {
            Trigger::Event(trigger) => Some(trigger),
            Trigger::Constraint(_) => None,
        }
    }
}

/// A guard expression, or a legacy timer carried in `header`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintTrigger {
    pub constraint: String,
    #[serde(default)]
    pub header: Option<String>,
}

/// Fires when an event matching one of the filters arrives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTrigger {
    pub filters: Vec<EventTypeFilter>,
    #[serde(default)]
    pub in_mappings: Mappings,
    #[serde(default)]
    pub out_mappings: Mappings,
}

impl EventTrigger {
    /// Trigger with a single filter on `event_type`
    pub fn for_type(event_type: impl Into<String>) -> Self {
        EventTrigger {
            filters: vec![EventTypeFilter::new(event_type)],
            ..Default::default()
        }
    }

    pub fn primary_filter(&self) -> Option<&EventTypeFilter> {
        self.filters.first()
    }
}

/// Channel classification derived from an event type's prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind<'a> {
    Message(&'a str),
    Error(&'a str),
    Escalation(&'a str),
    Compensate(&'a str),
    Timer(&'a str),
    Signal(&'a str),
}

/// Matches events by channel name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventTypeFilter {
    #[serde(rename = "type")]
    pub event_type: String,
}

impl EventTypeFilter {
    pub fn new(event_type: impl Into<String>) -> Self {
        EventTypeFilter {
            event_type: event_type.into(),
        }
    }

    /// Split the event type into its channel kind and the remaining reference.
    /// Types without a recognised prefix are plain signals.
    pub fn kind(&self) -> EventKind<'_> {
        let t = self.event_type.as_str();
        if let Some(rest) = t.strip_prefix(MESSAGE_PREFIX) {
            EventKind::Message(rest)
        } else if let Some(rest) = t.strip_prefix(ERROR_PREFIX) {
            EventKind::Error(rest)
        } else if let Some(rest) = t.strip_prefix(ESCALATION_PREFIX) {
            EventKind::Escalation(rest)
        } else if let Some(rest) = t.strip_prefix(COMPENSATE_PREFIX) {
            EventKind::Compensate(rest)
        } else if let Some(rest) = t.strip_prefix(TIMER_PREFIX) {
            EventKind::Timer(rest)
        } else {
            EventKind::Signal(t)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_kind_by_prefix() {
        assert_eq!(EventTypeFilter::new("Message-order").kind(), EventKind::Message("order"));
        assert_eq!(EventTypeFilter::new("Error-500").kind(), EventKind::Error("500"));
        assert_eq!(EventTypeFilter::new("Escalation-late").kind(), EventKind::Escalation("late"));
        assert_eq!(EventTypeFilter::new("Compensate-_2").kind(), EventKind::Compensate("_2"));
        assert_eq!(EventTypeFilter::new("Timer-sub").kind(), EventKind::Timer("sub"));
        assert_eq!(EventTypeFilter::new("MySignal").kind(), EventKind::Signal("MySignal"));
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        assert_eq!(EventTypeFilter::new("message-x").kind(), EventKind::Signal("message-x"));
    }

    #[test]
    fn test_trigger_accessors() {
        let trigger = Trigger::Event(EventTrigger::for_type("Go"));
        assert!(trigger.as_constraint().is_none());
        assert_eq!(
            trigger.as_event().and_then(|t| t.primary_filter()).map(|f| f.event_type.as_str()),
            Some("Go")
        );
    }
}
