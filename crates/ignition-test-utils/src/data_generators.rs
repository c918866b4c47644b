//! Generators for start-event markup used in tests.

/// Creates a start event with the given children.
///
/// # Arguments
///
/// * `id` - The id of the start event
/// * `interrupting` - Value of `isInterrupting`, or `None` to leave it out
/// * `body` - Child markup placed inside the element
pub fn start_event_markup(id: &str, interrupting: Option<bool>, body: &str) -> String {
    let attribute = interrupting
        .map(|value| format!(" isInterrupting=\"{}\"", value))
        .unwrap_or_default();
    format!(
        "<bpmn2:startEvent id=\"{}\" name=\"Start\"{}>\n{}\n</bpmn2:startEvent>",
        id, attribute, body
    )
}

/// Creates a plain start event with no children.
pub fn plain_start(id: &str) -> String {
    format!("<bpmn2:startEvent id=\"{}\" name=\"Start\"/>", id)
}

/// Creates the `dataOutput` / `dataOutputAssociation` pair mapping the
/// event payload to `variable`.
pub fn data_output_mapping(id: &str, slot: &str, variable: &str) -> String {
    format!(
        r#"  <bpmn2:dataOutput id="{id}_Output" name="{slot}"/>
  <bpmn2:dataOutputAssociation>
    <bpmn2:sourceRef>{id}_Output</bpmn2:sourceRef>
    <bpmn2:targetRef>{variable}</bpmn2:targetRef>
  </bpmn2:dataOutputAssociation>"#,
        id = id,
        slot = slot,
        variable = variable
    )
}

/// Creates a signal start event, optionally mapping the payload to `variable`.
pub fn signal_start(id: &str, signal: &str, variable: Option<&str>) -> String {
    let mapping = variable
        .map(|v| data_output_mapping(id, "event", v))
        .unwrap_or_default();
    start_event_markup(
        id,
        None,
        &format!("{}\n  <bpmn2:signalEventDefinition signalRef=\"{}\"/>", mapping, signal),
    )
}

/// Creates a message start event.
pub fn message_start(id: &str, message_ref: &str) -> String {
    start_event_markup(
        id,
        None,
        &format!("  <bpmn2:messageEventDefinition messageRef=\"{}\"/>", message_ref),
    )
}

/// Creates an error start event.
pub fn error_start(id: &str, error_ref: &str, interrupting: Option<bool>) -> String {
    start_event_markup(
        id,
        interrupting,
        &format!("  <bpmn2:errorEventDefinition errorRef=\"{}\"/>", error_ref),
    )
}

/// Creates an escalation start event.
pub fn escalation_start(id: &str, escalation_ref: &str) -> String {
    start_event_markup(
        id,
        None,
        &format!("  <bpmn2:escalationEventDefinition escalationRef=\"{}\"/>", escalation_ref),
    )
}

/// Creates a compensation start event.
pub fn compensate_start(id: &str, activity_ref: &str) -> String {
    start_event_markup(
        id,
        None,
        &format!("  <bpmn2:compensateEventDefinition activityRef=\"{}\"/>", activity_ref),
    )
}

/// Creates a conditional start event.
pub fn conditional_start(id: &str, condition: &str) -> String {
    start_event_markup(
        id,
        None,
        &format!(
            r#"  <bpmn2:conditionalEventDefinition>
    <bpmn2:condition xsi:type="bpmn2:tFormalExpression" language="http://www.jboss.org/drools/rule">{}</bpmn2:condition>
  </bpmn2:conditionalEventDefinition>"#,
            condition
        ),
    )
}

/// Creates a timer start event with a single sub-element.
///
/// # Arguments
///
/// * `element` - `timeCycle`, `timeDuration` or `timeDate`
/// * `language` - Optional `language` attribute (only meaningful for cycles)
/// * `expression` - The timer expression text
pub fn timer_start(id: &str, element: &str, language: Option<&str>, expression: &str) -> String {
    let language = language
        .map(|l| format!(" language=\"{}\"", l))
        .unwrap_or_default();
    start_event_markup(
        id,
        None,
        &format!(
            r#"  <bpmn2:timerEventDefinition>
    <bpmn2:{element} xsi:type="bpmn2:tFormalExpression"{language}>{expression}</bpmn2:{element}>
  </bpmn2:timerEventDefinition>"#,
            element = element,
            language = language,
            expression = expression
        ),
    )
}
