//! Widget-boundary contract for one embedded chat session.
//!
//! This crate defines only the types exchanged between the embedded chat
//! widget, the session controller, and the host application: tool invocation
//! envelopes, lifecycle events, and the collaborator traits the host injects.
//! It excludes negotiation transport details and controller state.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Monotonic counter identifying one incarnation of the embedded widget.
pub type Generation = u64;

/// Opaque, short-lived bearer value authorizing one widget session.
///
/// The controller never inspects the value; it only forwards it to the widget.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionCredential(<redacted, {} bytes>)", self.0.len())
    }
}

/// Color scheme the remote agent may ask the host to switch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ColorScheme {
    /// Parses an exact scheme name. Case and surrounding whitespace matter.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Client-side tool call emitted by the remote agent through the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ToolInvocation {
    #[must_use]
    pub fn new(name: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Decodes a `{name, params}` envelope as delivered by the widget.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// Structured answer returned to the widget for every tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
}

impl ToolResult {
    #[must_use]
    pub fn success() -> Self {
        Self { success: true }
    }

    #[must_use]
    pub fn failure() -> Self {
        Self { success: false }
    }
}

/// Normalized fact handed to the host persistence handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactRecord {
    pub fact_id: String,
    pub text: String,
}

/// Lifecycle event emitted by a mounted widget.
///
/// Readiness is not an event: the widget signals it by handing over its
/// [`WidgetControl`] handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    ResponseStart,
    ResponseEnd,
    ThreadChange { thread_id: Option<String> },
    Error { message: String },
}

impl WidgetEvent {
    /// Stable event name used for logging and dispatch.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResponseStart => "response_start",
            Self::ResponseEnd => "response_end",
            Self::ThreadChange { .. } => "thread_change",
            Self::Error { .. } => "error",
        }
    }
}

/// Error reported by a host or widget collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorError {
    message: String,
}

impl CollaboratorError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CollaboratorError {}

impl From<String> for CollaboratorError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for CollaboratorError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Handle exposed by a mounted widget.
#[async_trait]
pub trait WidgetControl: Send + Sync + 'static {
    /// Sends `text` as a user message, optionally starting a new thread.
    async fn send_user_message(&self, text: &str, new_thread: bool)
        -> Result<(), CollaboratorError>;
}

/// Host callback that applies a color scheme change.
pub trait ThemeSink: Send + Sync + 'static {
    fn request_theme(&self, scheme: ColorScheme);
}

impl<F> ThemeSink for F
where
    F: Fn(ColorScheme) + Send + Sync + 'static,
{
    fn request_theme(&self, scheme: ColorScheme) {
        self(scheme)
    }
}

/// Host persistence handler for facts recorded by the agent.
#[async_trait]
pub trait FactSink: Send + Sync + 'static {
    async fn persist(&self, fact: FactRecord) -> Result<(), CollaboratorError>;
}

/// Host notification invoked whenever the widget finishes a response.
pub trait ResponseEndListener: Send + Sync + 'static {
    fn on_response_end(&self);
}

impl<F> ResponseEndListener for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn on_response_end(&self) {
        self()
    }
}
