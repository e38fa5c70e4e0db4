//! Transport-only client for the chat session negotiation endpoint.
//!
//! This crate owns request building, response classification, and error-detail
//! extraction for the backend endpoint that issues ephemeral client secrets.
//! It contains no controller state and no widget coupling, and it never
//! retries: every call is one request/response pair.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod url;

pub use client::{classify_response, SessionApiClient};
pub use config::SessionApiConfig;
pub use error::{extract_error_detail, SessionApiError};
pub use payload::{SessionGrant, SessionRequest, PLACEHOLDER_WORKFLOW_PREFIX};
pub use url::{normalize_session_endpoint, DEFAULT_SESSION_ENDPOINT};
