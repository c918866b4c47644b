//! Writes a compiled start event back out as markup.

use std::fmt::Write as _;

use crate::config::CompilerConfig;
use crate::error::{CompileError, CompileResult};
use crate::markup::escape;
use crate::model::{ConstraintTrigger, EventKind, EventTrigger, StartConstruct, TimerType, Trigger};
use crate::timer::{format_duration, TimerHeader};

/// Serializes [`StartConstruct`]s as `startEvent` elements
#[derive(Debug, Clone)]
pub struct StartEventWriter {
    rule_language: String,
    default_timer_language: String,
    indent: usize,
}

impl Default for StartEventWriter {
    fn default() -> Self {
        Self::new(&CompilerConfig::default())
    }
}

/// Accumulates indented lines
struct Output {
    buf: String,
    indent: usize,
}

impl Output {
    fn line(&mut self, depth: usize, content: &str) {
        let _ = writeln!(self.buf, "{:width$}{}", "", content, width = depth * self.indent);
    }
}

impl StartEventWriter {
    pub fn new(config: &CompilerConfig) -> Self {
        StartEventWriter {
            rule_language: config.rule_language.clone(),
            default_timer_language: config.default_timer_language.clone(),
            indent: config.indent,
        }
    }

    /// Serialize a construct. Fails if it holds more than one trigger.
    pub fn write(&self, construct: &StartConstruct) -> CompileResult<String> {
        if construct.triggers.len() > 1 {
            return Err(CompileError::unsupported(
                &construct.id,
                format!("multiple start triggers not supported ({} found)", construct.triggers.len()),
            ));
        }

        let mut open = format!("<startEvent id=\"{}\"", escape(&construct.id));
        if let Some(name) = &construct.name {
            let _ = write!(open, " name=\"{}\"", escape(name));
        }
        let _ = write!(open, " isInterrupting=\"{}\"", construct.interrupting);

        let mut out = Output {
            buf: String::new(),
            indent: self.indent,
        };
        match construct.trigger() {
            None => out.line(0, &format!("{}/>", open)),
            Some(trigger) => {
                out.line(0, &format!("{}>", open));
                match trigger {
                    Trigger::Constraint(constraint) => self.write_constraint(&mut out, construct, constraint)?,
                    Trigger::Event(event) => self.write_event(&mut out, construct, event)?,
                }
                out.line(0, "</startEvent>");
            }
        }
        Ok(out.buf)
    }

    fn write_constraint(
        &self,
        out: &mut Output,
        construct: &StartConstruct,
        trigger: &ConstraintTrigger,
    ) -> CompileResult<()> {
        match &trigger.header {
            None => {
                out.line(1, "<conditionalEventDefinition>");
                out.line(
                    2,
                    &format!(
                        "<condition xsi:type=\"tFormalExpression\" language=\"{}\">{}</condition>",
                        escape(&self.rule_language),
                        escape(&trigger.constraint)
                    ),
                );
                out.line(1, "</conditionalEventDefinition>");
                Ok(())
            }
            Some(header) => self.write_header_timer(out, construct, header),
        }
    }

    /// Timer carried in a legacy header; metadata wins when present
    fn write_header_timer(&self, out: &mut Output, construct: &StartConstruct, header: &str) -> CompileResult<()> {
        let metadata = &construct.metadata;
        match (metadata.timer_type, &metadata.timer_def) {
            (Some(kind @ (TimerType::Duration | TimerType::Date)), Some(def)) => {
                write_timer(out, kind, None, def);
            }
            (Some(kind @ (TimerType::Duration | TimerType::Date)), None) => {
                let decoded = TimerHeader::decode(header)?;
                let delay = decoded
                    .delay
                    .parse::<i64>()
                    .map_err(|e| CompileError::malformed_timer(header, e.to_string()))?;
                // a date without its definition is only known as an offset in milliseconds
                let text = match kind {
                    TimerType::Date => delay.to_string(),
                    _ => format_duration(delay),
                };
                write_timer(out, kind, None, &text);
            }
            (_, def) => {
                let decoded = TimerHeader::decode(header)?;
                let cycle = match def {
                    Some(def) => def.clone(),
                    None => legacy_cycle_text(&decoded),
                };
                let language = metadata.timer_language.as_deref().unwrap_or(&decoded.language);
                write_timer(out, TimerType::Cycle, Some(language), &cycle);
            }
        }
        Ok(())
    }

    fn write_event(&self, out: &mut Output, construct: &StartConstruct, trigger: &EventTrigger) -> CompileResult<()> {
        let filter = trigger.primary_filter().ok_or_else(|| {
            CompileError::unsupported(&construct.id, "event trigger without an event filter")
        })?;

        let mapping = trigger
            .in_mappings
            .keys()
            .next()
            .or(construct.metadata.trigger_mapping.as_ref());
        if let Some(mapping) = mapping {
            let output_id = format!("{}_Output", construct.id);
            let slot = trigger
                .in_mappings
                .get(mapping)
                .map(String::as_str)
                .or_else(|| construct.out_mapping(mapping));
            match slot {
                Some(slot) => out.line(
                    1,
                    &format!("<dataOutput id=\"{}\" name=\"{}\"/>", escape(&output_id), escape(slot)),
                ),
                None => out.line(1, &format!("<dataOutput id=\"{}\"/>", escape(&output_id))),
            }
            out.line(1, "<dataOutputAssociation>");
            out.line(2, &format!("<sourceRef>{}</sourceRef>", escape(&output_id)));
            out.line(2, &format!("<targetRef>{}</targetRef>", escape(mapping)));
            out.line(1, "</dataOutputAssociation>");
        }

        match filter.kind() {
            EventKind::Message(reference) => {
                out.line(1, &format!("<messageEventDefinition messageRef=\"{}\"/>", escape(reference)))
            }
            EventKind::Error(code) => {
                out.line(1, &format!("<errorEventDefinition errorRef=\"{}\"/>", escape(code)))
            }
            EventKind::Escalation(code) => out.line(
                1,
                &format!("<escalationEventDefinition escalationRef=\"{}\"/>", escape(code)),
            ),
            EventKind::Compensate(activity) => out.line(
                1,
                &format!("<compensateEventDefinition activityRef=\"{}\"/>", escape(activity)),
            ),
            EventKind::Timer(_) if construct.metadata.timer_def.is_some() => {
                let metadata = &construct.metadata;
                let kind = metadata.timer_type.unwrap_or(TimerType::Cycle);
                let language = match kind {
                    TimerType::Cycle => Some(
                        metadata
                            .timer_language
                            .as_deref()
                            .unwrap_or(&self.default_timer_language),
                    ),
                    _ => None,
                };
                let def = metadata.timer_def.as_deref().unwrap_or_default();
                write_timer(out, kind, language, def);
            }
            // unknown prefixes, and timers without metadata, are plain signals
            EventKind::Timer(_) | EventKind::Signal(_) => out.line(
                1,
                &format!("<signalEventDefinition signalRef=\"{}\"/>", escape(&filter.event_type)),
            ),
        }
        Ok(())
    }
}

fn write_timer(out: &mut Output, kind: TimerType, language: Option<&str>, expression: &str) {
    let element = kind.element_name();
    let language = language
        .map(|l| format!(" language=\"{}\"", escape(l)))
        .unwrap_or_default();
    out.line(1, "<timerEventDefinition>");
    out.line(
        2,
        &format!(
            "<{} xsi:type=\"tFormalExpression\"{}>{}</{}>",
            element,
            language,
            escape(expression),
            element
        ),
    );
    out.line(1, "</timerEventDefinition>");
}

/// Cycle text recovered from a header when no timer definition was recorded
fn legacy_cycle_text(header: &TimerHeader) -> String {
    if !header.is_default_language() {
        return header.delay.clone();
    }
    match (&header.period, header.repeat_limit) {
        (None, _) => header.delay.clone(),
        (Some(period), _) if period == &header.delay || period == "0" => header.delay.clone(),
        (Some(period), Some(limit)) => match period.parse::<i64>() {
            Ok(ms) if limit > 0 => format!("R{}/{}", limit - 1, format_duration(ms)),
            Ok(ms) => format!("R/{}", format_duration(ms)),
            Err(_) => header.delay.clone(),
        },
        (Some(period), None) => format!("{}###{}", header.delay, period),
    }
}

/// Write with default settings
pub fn write_start_event(construct: &StartConstruct) -> CompileResult<String> {
    StartEventWriter::default().write(construct)
}
