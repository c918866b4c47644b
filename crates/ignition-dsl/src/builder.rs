//! Compiles the children of a `startEvent` element into a trigger model.

use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::config::CompilerConfig;
use crate::diagnostics::{DiagnosticSink, Warning};
use crate::error::{CompileError, CompileResult, ReferenceKind, RegistryKind};
use crate::markup::Element;
use crate::model::{
    ConstraintTrigger, EventSubProcess, EventTrigger, StartConstruct, Timer, TimerType, Trigger,
    COMPENSATE_PREFIX, ERROR_PREFIX, ESCALATION_PREFIX, MESSAGE_PREFIX, TIMER_PREFIX,
};
use crate::registry::Registries;
use crate::timer::{TimerHeader, TimerParser, TimerSpec, DEFAULT_TIMER_LANGUAGE};

/// Where the start event being compiled lives
#[derive(Debug)]
pub enum StartContext<'a> {
    /// Top-level process start event
    Process,
    /// Start event of an event-subprocess; timers are attached to the container
    EventSubProcess(&'a mut EventSubProcess),
}

/// Whether the child walk goes on after an element.
///
/// Conditional definitions and the first successful timer sub-element end
/// their walk: the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Continue,
    Stop,
}

/// State of one compilation, committed only on success
struct Staged<'c> {
    construct: StartConstruct,
    /// dataOutput id → name
    data_outputs: HashMap<String, String>,
    timers: Vec<Timer>,
    /// id of the enclosing event-subprocess, if any
    container: Option<&'c str>,
}

impl Staged<'_> {
    fn id(&self) -> &str {
        &self.construct.id
    }

    /// Attach an event trigger, wiring the recorded trigger mapping as its in-mapping
    fn add_event_trigger(&mut self, event_type: String) {
        let mut trigger = EventTrigger::for_type(event_type);
        if let Some(mapping) = &self.construct.metadata.trigger_mapping {
            if let Some(slot) = self.construct.out_mapping(mapping) {
                trigger.in_mappings.insert(mapping.clone(), slot.to_string());
            }
        }
        debug!(construct = %self.construct.id, event_type = %trigger.filters[0].event_type, "Attached event trigger");
        self.construct.add_trigger(Trigger::Event(trigger));
    }
}

/// Compiles start events against a set of registries
#[derive(Debug, Clone)]
pub struct StartEventCompiler<'r> {
    registries: &'r Registries,
    config: CompilerConfig,
    timer_parser: TimerParser,
}

impl<'r> StartEventCompiler<'r> {
    pub fn new(registries: &'r Registries) -> Self {
        Self::with_config(registries, CompilerConfig::default())
    }

    pub fn with_config(registries: &'r Registries, config: CompilerConfig) -> Self {
        let timer_parser = TimerParser::new().with_min_start_delay(config.min_start_delay_ms);
        StartEventCompiler {
            registries,
            config,
            timer_parser,
        }
    }

    /// Replace the timer parser, e.g. to pin "now" for date arithmetic
    pub fn with_timer_parser(mut self, parser: TimerParser) -> Self {
        self.timer_parser = parser;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a `startEvent` element into a new construct.
    pub fn compile(
        &self,
        element: &Element,
        context: StartContext<'_>,
        sink: &mut dyn DiagnosticSink,
    ) -> CompileResult<StartConstruct> {
        let id = element.attribute("id").unwrap_or_default();
        if element.name != "startEvent" {
            return Err(CompileError::unsupported(
                id,
                format!("expected a <startEvent> element, found <{}>", element.name),
            ));
        }

        let mut construct = StartConstruct::new(id);
        construct.name = element.non_blank_attribute("name").map(str::to_string);
        self.compile_into(&mut construct, element, context, sink)?;
        Ok(construct)
    }

    /// Compile the children of `element` onto an existing construct.
    ///
    /// On error neither `construct` nor the event-subprocess container is
    /// modified. Warnings already sent to `sink` stay sent.
    #[instrument(skip_all, fields(construct = %construct.id))]
    pub fn compile_into(
        &self,
        construct: &mut StartConstruct,
        element: &Element,
        context: StartContext<'_>,
        sink: &mut dyn DiagnosticSink,
    ) -> CompileResult<()> {
        let (staged_construct, timers) = {
            let container = match &context {
                StartContext::EventSubProcess(container) => Some(container.id.as_str()),
                StartContext::Process => None,
            };
            let mut staged = Staged {
                construct: construct.clone(),
                data_outputs: HashMap::new(),
                timers: Vec::new(),
                container,
            };

            if let Some(value) = element.attribute("isInterrupting") {
                staged.construct.interrupting = value.trim().eq_ignore_ascii_case("true");
            }

            for child in &element.children {
                if self.apply(&mut staged, child, sink)? == Walk::Stop {
                    debug!(element = %child.name, "First match wins; remaining children skipped");
                    break;
                }
            }
            (staged.construct, staged.timers)
        };

        if let StartContext::EventSubProcess(container) = context {
            for timer in timers {
                container.add_timer(timer);
            }
        }
        *construct = staged_construct;
        Ok(())
    }

    fn apply(&self, staged: &mut Staged<'_>, child: &Element, sink: &mut dyn DiagnosticSink) -> CompileResult<Walk> {
        debug!(element = %child.name, "Compiling start event child");
        match child.name.as_str() {
            "dataOutput" => {
                let id = child.attribute("id").unwrap_or_default().to_string();
                let name = child.attribute("name").unwrap_or_default().to_string();
                staged.data_outputs.insert(id, name);
            }
            "dataOutputAssociation" => self.read_data_output_association(staged, child)?,
            "outputSet" => {
                // ignored for backward compatibility; older versions dropped it silently
                sink.warning(Warning::IgnoredConstruct {
                    element: child.name.clone(),
                    construct: staged.id().to_string(),
                });
            }
            "conditionalEventDefinition" => {
                let constraint = child
                    .child("condition")
                    .map(|condition| condition.text_content().trim().to_string())
                    .unwrap_or_default();
                staged.construct.add_trigger(Trigger::Constraint(ConstraintTrigger {
                    constraint,
                    header: None,
                }));
                return Ok(Walk::Stop);
            }
            "signalEventDefinition" => {
                if let Some(signal) = child.non_blank_attribute("signalRef") {
                    staged.add_event_trigger(signal.to_string());
                }
            }
            "messageEventDefinition" => {
                let message_ref = child.attribute("messageRef").unwrap_or_default();
                let message_type = self
                    .registries
                    .resolve(RegistryKind::Messages, message_ref, staged.id())?
                    .to_string();
                staged.construct.metadata.message_type = Some(message_type);
                staged.add_event_trigger(format!("{}{}", MESSAGE_PREFIX, message_ref));
            }
            "timerEventDefinition" => self.read_timer_definition(staged, child)?,
            "errorEventDefinition" => {
                if staged.container.is_some() && !staged.construct.interrupting {
                    sink.warning(Warning::InterruptingOverride {
                        construct: staged.id().to_string(),
                    });
                    staged.construct.interrupting = true;
                }
                if let Some(error_ref) = child.non_blank_attribute("errorRef") {
                    let code = self
                        .registries
                        .resolve(RegistryKind::Errors, error_ref, staged.id())?
                        .to_string();
                    staged.add_event_trigger(format!("{}{}", ERROR_PREFIX, code));
                }
            }
            "escalationEventDefinition" => {
                if let Some(escalation_ref) = child.non_blank_attribute("escalationRef") {
                    let code = self
                        .registries
                        .resolve(RegistryKind::Escalations, escalation_ref, staged.id())?
                        .to_string();
                    staged.add_event_trigger(format!("{}{}", ESCALATION_PREFIX, code));
                }
            }
            "compensateEventDefinition" => {
                if let Some(activity_ref) = child.non_blank_attribute("activityRef") {
                    staged.add_event_trigger(format!("{}{}", COMPENSATE_PREFIX, activity_ref));
                }
            }
            other => debug!(element = other, "Skipping unrecognised start event child"),
        }
        Ok(Walk::Continue)
    }

    fn read_data_output_association(&self, staged: &mut Staged<'_>, association: &Element) -> CompileResult<()> {
        let children = &association.children;
        if let Some(extra) = children.get(2) {
            // no support for assignments or transformations
            return Err(CompileError::unsupported(
                staged.id(),
                format!("<{}> elements in dataOutputAssociation are not supported", extra.name),
            ));
        }

        let source = match children.first() {
            Some(node) if node.name == "sourceRef" => node.text_content().trim().to_string(),
            _ => {
                return Err(CompileError::unsupported(
                    staged.id(),
                    "no sourceRef found in dataOutputAssociation",
                ))
            }
        };
        let slot = staged.data_outputs.get(&source).cloned().ok_or_else(|| CompileError::UnresolvedReference {
            kind: ReferenceKind::DataOutput,
            reference: source.clone(),
            construct: staged.id().to_string(),
        })?;

        let target = match children.get(1) {
            Some(node) if node.name == "targetRef" => node.text_content().trim().to_string(),
            _ => {
                return Err(CompileError::unsupported(
                    staged.id(),
                    "no targetRef found in dataOutputAssociation",
                ))
            }
        };

        staged.construct.metadata.trigger_mapping = Some(target.clone());
        staged.construct.add_out_mapping(target, slot);
        Ok(())
    }

    fn read_timer_definition(&self, staged: &mut Staged<'_>, definition: &Element) -> CompileResult<()> {
        for sub in &definition.children {
            let Some(kind) = TimerType::from_element_name(&sub.name) else {
                continue;
            };
            let text = sub.text_content();
            let expression = text.trim();
            if expression.is_empty() {
                debug!(element = %sub.name, "Skipping empty timer expression");
                continue;
            }

            let language = match kind {
                TimerType::Cycle => sub
                    .non_blank_attribute("language")
                    .unwrap_or(&self.config.default_timer_language),
                _ => DEFAULT_TIMER_LANGUAGE,
            };

            let (header, timer) = if language.eq_ignore_ascii_case(DEFAULT_TIMER_LANGUAGE) {
                let spec = self.timer_parser.parse(kind, expression)?;
                (TimerHeader::for_spec(&spec), timer_for_spec(&spec))
            } else {
                staged.construct.metadata.timer_language = Some(language.to_string());
                let mut timer = Timer::new(TimerType::Cycle);
                timer.delay = expression.to_string();
                (TimerHeader::verbatim(language, expression), timer)
            };

            staged.construct.metadata.timer_def = Some(expression.to_string());
            staged.construct.metadata.timer_type = Some(kind);

            match staged.container {
                Some(container) => {
                    staged.timers.push(timer);
                    staged.add_event_trigger(format!("{}{}", TIMER_PREFIX, container));
                }
                None => {
                    staged.construct.add_trigger(Trigger::Constraint(ConstraintTrigger {
                        constraint: String::new(),
                        header: Some(header.encode()),
                    }));
                }
            }
            debug!(kind = %kind, expression, "Attached timer");
            // first successful sub-element wins
            break;
        }
        Ok(())
    }
}

fn timer_for_spec(spec: &TimerSpec) -> Timer {
    let mut timer = Timer::new(spec.kind);
    match spec.kind {
        TimerType::Cycle => {
            timer.delay = spec.delay.to_string();
            timer.period = spec.period.to_string();
        }
        TimerType::Duration => timer.delay = spec.delay.to_string(),
        TimerType::Date => timer.date = spec.delay.to_string(),
    }
    timer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::markup::parse_fragment;
    use crate::registry::{ErrorDefinition, Escalation, Message};
    use chrono::DateTime;

    fn registries() -> Registries {
        Registries::new()
            .with_messages(vec![Message {
                id: "msg-order".to_string(),
                message_type: "com.example.Order".to_string(),
            }])
            .with_errors(vec![ErrorDefinition {
                id: "err-fail".to_string(),
                error_code: "FAIL".to_string(),
            }])
            .with_escalations(vec![Escalation {
                id: "esc-late".to_string(),
                escalation_code: "LATE".to_string(),
            }])
    }

    fn compile(markup: &str, registries: &Registries) -> (CompileResult<StartConstruct>, CollectingSink) {
        let mut sink = CollectingSink::new();
        let element = parse_fragment(markup).unwrap();
        let compiler = StartEventCompiler::new(registries).with_timer_parser(TimerParser::at(
            DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z").unwrap(),
        ));
        let result = compiler.compile(&element, StartContext::Process, &mut sink);
        (result, sink)
    }

    fn event_type(construct: &StartConstruct) -> &str {
        &construct.trigger().and_then(Trigger::as_event).unwrap().filters[0].event_type
    }

    #[test]
    fn test_plain_start_has_no_trigger() {
        let (result, sink) = compile(r#"<startEvent id="_1" name="Start"/>"#, &registries());
        let construct = result.unwrap();
        assert_eq!(construct.id, "_1");
        assert_eq!(construct.name.as_deref(), Some("Start"));
        assert!(construct.interrupting);
        assert!(construct.triggers.is_empty());
        assert!(sink.warnings.is_empty());
    }

    #[test]
    fn test_signal_with_mapping() {
        let markup = r#"
            <startEvent id="_1">
              <dataOutput id="_1_Output" name="event"/>
              <dataOutputAssociation>
                <sourceRef>_1_Output</sourceRef>
                <targetRef>payload</targetRef>
              </dataOutputAssociation>
              <signalEventDefinition signalRef="Go"/>
            </startEvent>"#;
        let construct = compile(markup, &registries()).0.unwrap();

        assert_eq!(construct.metadata.trigger_mapping.as_deref(), Some("payload"));
        assert_eq!(construct.out_mapping("payload"), Some("event"));
        let trigger = construct.trigger().and_then(Trigger::as_event).unwrap();
        assert_eq!(trigger.filters[0].event_type, "Go");
        assert_eq!(trigger.in_mappings.get("payload").map(String::as_str), Some("event"));
    }

    #[test]
    fn test_blank_signal_ref_adds_nothing() {
        let construct = compile(r#"<startEvent id="_1"><signalEventDefinition signalRef="  "/></startEvent>"#, &registries())
            .0
            .unwrap();
        assert!(construct.triggers.is_empty());
    }

    #[test]
    fn test_message_records_type() {
        let construct = compile(
            r#"<startEvent id="_1"><messageEventDefinition messageRef="msg-order"/></startEvent>"#,
            &registries(),
        )
        .0
        .unwrap();
        assert_eq!(event_type(&construct), "Message-msg-order");
        assert_eq!(construct.metadata.message_type.as_deref(), Some("com.example.Order"));
    }

    #[test]
    fn test_error_escalation_compensate_filters() {
        let r = registries();
        let error = compile(r#"<startEvent id="e"><errorEventDefinition errorRef="err-fail"/></startEvent>"#, &r).0.unwrap();
        assert_eq!(event_type(&error), "Error-FAIL");

        let escalation = compile(r#"<startEvent id="e"><escalationEventDefinition escalationRef="esc-late"/></startEvent>"#, &r).0.unwrap();
        assert_eq!(event_type(&escalation), "Escalation-LATE");

        let compensate = compile(r#"<startEvent id="e"><compensateEventDefinition activityRef="_4"/></startEvent>"#, &r).0.unwrap();
        assert_eq!(event_type(&compensate), "Compensate-_4");
    }

    #[test]
    fn test_conditional_stops_walk() {
        let markup = r#"
            <startEvent id="_1">
              <conditionalEventDefinition>
                <condition xsi:type="tFormalExpression">Person( age &gt; 20 )</condition>
              </conditionalEventDefinition>
              <signalEventDefinition signalRef="Ignored"/>
            </startEvent>"#;
        let construct = compile(markup, &registries()).0.unwrap();
        assert_eq!(construct.triggers.len(), 1);
        let trigger = construct.trigger().and_then(Trigger::as_constraint).unwrap();
        assert_eq!(trigger.constraint, "Person( age > 20 )");
        assert_eq!(trigger.header, None);
    }

    #[test]
    fn test_timer_cycle_in_process() {
        let markup = r#"
            <startEvent id="_1">
              <timerEventDefinition>
                <timeCycle language="int">R3/PT5M</timeCycle>
              </timerEventDefinition>
            </startEvent>"#;
        let construct = compile(markup, &registries()).0.unwrap();
        let trigger = construct.trigger().and_then(Trigger::as_constraint).unwrap();
        assert_eq!(trigger.constraint, "");
        assert_eq!(trigger.header.as_deref(), Some("timer (int:1000 300000 repeat-limit=4)"));
        assert_eq!(construct.metadata.timer_def.as_deref(), Some("R3/PT5M"));
        assert_eq!(construct.metadata.timer_type, Some(TimerType::Cycle));
    }

    #[test]
    fn test_timer_other_language_is_verbatim() {
        let markup = r#"
            <startEvent id="_1">
              <timerEventDefinition>
                <timeCycle language="cron">0 0/5 * * * ?</timeCycle>
              </timerEventDefinition>
            </startEvent>"#;
        let construct = compile(markup, &registries()).0.unwrap();
        let trigger = construct.trigger().and_then(Trigger::as_constraint).unwrap();
        assert_eq!(trigger.header.as_deref(), Some("timer (cron:0 0/5 * * * ?)"));
        assert_eq!(construct.metadata.timer_language.as_deref(), Some("cron"));
    }

    #[test]
    fn test_timer_first_non_empty_sub_element_wins() {
        let markup = r#"
            <startEvent id="_1">
              <timerEventDefinition>
                <timeCycle></timeCycle>
                <timeDuration>PT10S</timeDuration>
                <timeDate>2030-01-01T00:00:05Z</timeDate>
              </timerEventDefinition>
            </startEvent>"#;
        let construct = compile(markup, &registries()).0.unwrap();
        assert_eq!(construct.triggers.len(), 1);
        assert_eq!(construct.metadata.timer_type, Some(TimerType::Duration));
        assert_eq!(construct.metadata.timer_def.as_deref(), Some("PT10S"));
        let trigger = construct.trigger().and_then(Trigger::as_constraint).unwrap();
        assert_eq!(trigger.header.as_deref(), Some("timer (int:10000 0)"));
    }

    #[test]
    fn test_timer_date_relative_to_compile_time() {
        let markup = r#"<startEvent id="_1"><timerEventDefinition><timeDate>2030-01-01T00:00:05Z</timeDate></timerEventDefinition></startEvent>"#;
        let construct = compile(markup, &registries()).0.unwrap();
        let trigger = construct.trigger().and_then(Trigger::as_constraint).unwrap();
        assert_eq!(trigger.header.as_deref(), Some("timer (int:5000 0)"));
        assert_eq!(construct.metadata.timer_def.as_deref(), Some("2030-01-01T00:00:05Z"));
    }

    #[test]
    fn test_malformed_timer_fails() {
        let markup = r#"<startEvent id="_1"><timerEventDefinition><timeCycle>every day</timeCycle></timerEventDefinition></startEvent>"#;
        let result = compile(markup, &registries()).0;
        assert!(matches!(result, Err(CompileError::MalformedTimerExpression { .. })));
    }

    #[test]
    fn test_timer_in_event_subprocess() {
        let markup = r#"
            <startEvent id="_2" isInterrupting="false">
              <timerEventDefinition>
                <timeDuration>PT1M</timeDuration>
              </timerEventDefinition>
            </startEvent>"#;
        let element = parse_fragment(markup).unwrap();
        let registries = registries();
        let mut container = EventSubProcess::new("sub");
        let mut sink = CollectingSink::new();

        let construct = StartEventCompiler::new(&registries)
            .compile(&element, StartContext::EventSubProcess(&mut container), &mut sink)
            .unwrap();

        assert!(!construct.interrupting);
        assert_eq!(event_type(&construct), "Timer-sub");
        assert_eq!(construct.metadata.timer_type, Some(TimerType::Duration));
        assert_eq!(container.timers.len(), 1);
        assert_eq!(container.timers[0].time_type, TimerType::Duration);
        assert_eq!(container.timers[0].delay, "60000");
    }

    #[test]
    fn test_error_in_event_subprocess_forces_interrupting() {
        let element = parse_fragment(
            r#"<startEvent id="_2" isInterrupting="false"><errorEventDefinition errorRef="err-fail"/></startEvent>"#,
        )
        .unwrap();
        let registries = registries();
        let mut container = EventSubProcess::new("sub");
        let mut sink = CollectingSink::new();

        let construct = StartEventCompiler::new(&registries)
            .compile(&element, StartContext::EventSubProcess(&mut container), &mut sink)
            .unwrap();

        assert!(construct.interrupting);
        assert_eq!(sink.count("WARN_START_INTERRUPTING_OVERRIDE"), 1);
        assert_eq!(sink.warnings.len(), 1);
    }

    #[test]
    fn test_error_in_process_keeps_declared_flag() {
        let (result, sink) = compile(
            r#"<startEvent id="_2" isInterrupting="false"><errorEventDefinition errorRef="err-fail"/></startEvent>"#,
            &registries(),
        );
        assert!(!result.unwrap().interrupting);
        assert!(sink.warnings.is_empty());
    }

    #[test]
    fn test_output_set_is_ignored_with_warning() {
        let (result, sink) = compile(r#"<startEvent id="_1"><outputSet/></startEvent>"#, &registries());
        assert!(result.unwrap().triggers.is_empty());
        assert_eq!(sink.count("WARN_START_IGNORED_CONSTRUCT"), 1);
    }

    #[test]
    fn test_association_with_unknown_source() {
        let markup = r#"
            <startEvent id="_1">
              <dataOutputAssociation>
                <sourceRef>nowhere</sourceRef>
                <targetRef>x</targetRef>
              </dataOutputAssociation>
            </startEvent>"#;
        match compile(markup, &registries()).0 {
            Err(CompileError::UnresolvedReference { kind, reference, .. }) => {
                assert_eq!(kind, ReferenceKind::DataOutput);
                assert_eq!(reference, "nowhere");
            }
            other => panic!("Expected UnresolvedReference, got {:?}", other),
        }
    }

    #[test]
    fn test_association_with_missing_target() {
        let markup = r#"
            <startEvent id="_1">
              <dataOutput id="o" name="n"/>
              <dataOutputAssociation><sourceRef>o</sourceRef></dataOutputAssociation>
            </startEvent>"#;
        assert!(matches!(
            compile(markup, &registries()).0,
            Err(CompileError::UnsupportedStructure { .. })
        ));
    }

    #[test]
    fn test_failure_leaves_construct_untouched() {
        let element = parse_fragment(
            r#"<startEvent id="_1" isInterrupting="false">
                 <signalEventDefinition signalRef="Go"/>
                 <messageEventDefinition messageRef="unknown"/>
               </startEvent>"#,
        )
        .unwrap();
        let registries = registries();
        let mut construct = StartConstruct::new("_1");
        let before = construct.clone();
        let mut sink = CollectingSink::new();

        let result = StartEventCompiler::new(&registries).compile_into(
            &mut construct,
            &element,
            StartContext::Process,
            &mut sink,
        );

        assert!(matches!(result, Err(CompileError::UnresolvedReference { .. })));
        assert_eq!(construct, before);
    }

    #[test]
    fn test_rejects_non_start_element() {
        let (result, _) = compile(r#"<endEvent id="_9"/>"#, &registries());
        assert!(matches!(result, Err(CompileError::UnsupportedStructure { .. })));
    }
}
