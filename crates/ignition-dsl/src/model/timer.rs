use serde::{Deserialize, Serialize};
use std::fmt;

/// Which timer sub-element a definition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerType {
    Cycle,
    Duration,
    Date,
}

impl TimerType {
    /// Name of the markup element carrying this timer kind
    pub fn element_name(&self) -> &'static str {
        match self {
            TimerType::Cycle => "timeCycle",
            TimerType::Duration => "timeDuration",
            TimerType::Date => "timeDate",
        }
    }

    pub fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "timeCycle" => Some(TimerType::Cycle),
            "timeDuration" => Some(TimerType::Duration),
            "timeDate" => Some(TimerType::Date),
            _ => None,
        }
    }
}

impl fmt::Display for TimerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// A concrete timer owned by an event-subprocess
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    #[serde(default)]
    pub delay: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub date: String,
    pub time_type: TimerType,
}

impl Timer {
    pub fn new(time_type: TimerType) -> Self {
        Timer {
            delay: String::new(),
            period: String::new(),
            date: String::new(),
            time_type,
        }
    }
}

/// The container an event-subprocess start event lives in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubProcess {
    pub id: String,
    #[serde(default)]
    pub timers: Vec<Timer>,
}

impl EventSubProcess {
    pub fn new(id: impl Into<String>) -> Self {
        EventSubProcess {
            id: id.into(),
            timers: Vec::new(),
        }
    }

    pub fn add_timer(&mut self, timer: Timer) {
        self.timers.push(timer);
    }
}
