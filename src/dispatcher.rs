//! Client tool routing for invocations emitted by the remote agent.
//!
//! Dispatch is synchronous and never fails across the widget boundary: every
//! invocation yields a [`ToolResult`], plus at most one [`ToolEffect`] for the
//! caller to run once controller state is released.

use std::collections::HashSet;

use serde_json::Value;
use session_protocol::{ColorScheme, FactRecord, ToolInvocation, ToolResult};

use crate::error::SessionError;

pub const SWITCH_THEME_TOOL: &str = "switch_theme";
pub const RECORD_FACT_TOOL: &str = "record_fact";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    SwitchTheme { scheme: ColorScheme },
    RecordFact { fact_id: String, fact_text: String },
}

impl ToolCall {
    pub fn parse(invocation: &ToolInvocation) -> Result<Self, SessionError> {
        match invocation.name.as_str() {
            SWITCH_THEME_TOOL => {
                let scheme = invocation
                    .param("theme")
                    .and_then(Value::as_str)
                    .and_then(ColorScheme::parse)
                    .ok_or_else(|| {
                        SessionError::Protocol(format!(
                            "{SWITCH_THEME_TOOL} requires theme 'light' or 'dark', got {}",
                            invocation.param("theme").unwrap_or(&Value::Null)
                        ))
                    })?;
                Ok(Self::SwitchTheme { scheme })
            }
            RECORD_FACT_TOOL => Ok(Self::RecordFact {
                fact_id: coerce_param(invocation.param("fact_id")),
                fact_text: coerce_param(invocation.param("fact_text")),
            }),
            unknown => Err(SessionError::Protocol(format!("unknown tool '{unknown}'"))),
        }
    }
}

/// Side effect requested by a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolEffect {
    ApplyTheme(ColorScheme),
    PersistFact(FactRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub result: ToolResult,
    pub effect: Option<ToolEffect>,
}

impl Dispatch {
    fn success(effect: Option<ToolEffect>) -> Self {
        Self {
            result: ToolResult::success(),
            effect,
        }
    }

    fn failure() -> Self {
        Self {
            result: ToolResult::failure(),
            effect: None,
        }
    }
}

/// Routes tool invocations and remembers fact ids already handled in the
/// current thread.
#[derive(Debug, Default, Clone)]
pub struct ToolDispatcher {
    processed_facts: HashSet<String>,
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, invocation: &ToolInvocation) -> Dispatch {
        match ToolCall::parse(invocation) {
            Ok(ToolCall::SwitchTheme { scheme }) => {
                Dispatch::success(Some(ToolEffect::ApplyTheme(scheme)))
            }
            Ok(ToolCall::RecordFact { fact_id, fact_text }) => {
                self.record_fact(fact_id, &fact_text)
            }
            Err(error) => {
                tracing::debug!(tool = %invocation.name, %error, "rejected client tool invocation");
                Dispatch::failure()
            }
        }
    }

    fn record_fact(&mut self, fact_id: String, fact_text: &str) -> Dispatch {
        if fact_id.is_empty() {
            return Dispatch::success(None);
        }
        // Marked before the handler runs so a replay racing a slow handler is a no-op.
        if !self.processed_facts.insert(fact_id.clone()) {
            tracing::debug!(%fact_id, "fact already recorded in this thread");
            return Dispatch::success(None);
        }

        Dispatch::success(Some(ToolEffect::PersistFact(FactRecord {
            fact_id,
            text: normalize_fact_text(fact_text),
        })))
    }

    pub fn has_processed(&self, fact_id: &str) -> bool {
        self.processed_facts.contains(fact_id)
    }

    pub fn processed_count(&self) -> usize {
        self.processed_facts.len()
    }

    pub fn clear_processed_facts(&mut self) {
        self.processed_facts.clear();
    }
}

/// Decodes a `{name, params}` envelope as delivered by the widget. A
/// non-string `name` or non-object `params` is a protocol error.
pub fn decode_invocation(envelope: Value) -> Result<ToolInvocation, SessionError> {
    ToolInvocation::from_json(envelope)
        .map_err(|error| SessionError::Protocol(format!("malformed tool invocation: {error}")))
}

/// Collapses whitespace runs to one space and trims both ends.
pub fn normalize_fact_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn coerce_param(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
