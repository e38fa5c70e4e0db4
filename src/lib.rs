//! Session lifecycle and tool-dispatch controller for an embedded chat widget.
//!
//! # Public API Overview
//! - Negotiate ephemeral session credentials through a [`CredentialBroker`]
//!   ([`HttpCredentialBroker`] talks to the backend endpoint).
//! - Route agent tool calls with [`ToolDispatcher`]; fact ids are deduplicated
//!   per conversation thread.
//! - Drive the widget lifecycle with [`SessionController`]: credential
//!   requests, widget events, auto-start, retry and reset.
//! - Render [`SurfaceView`] around the widget; it carries at most one error.
//!
//! Widget-boundary types are re-exported from `session_protocol`.

pub mod broker;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod surface;

pub use broker::{CredentialBroker, HttpCredentialBroker, NegotiationOutcome};
pub use config::SessionConfig;
pub use controller::{Collaborators, SessionController};
pub use dispatcher::{decode_invocation, Dispatch, ToolCall, ToolDispatcher, ToolEffect};
pub use error::{ErrorKind, SessionError};
pub use lifecycle::{Lifecycle, Phase};
pub use surface::{ErrorSurface, SurfaceView, INITIALIZING_FALLBACK};

pub use session_protocol::{
    CollaboratorError, ColorScheme, FactRecord, FactSink, Generation, ResponseEndListener,
    SessionCredential, ThemeSink, ToolInvocation, ToolResult, WidgetControl, WidgetEvent,
};
