use std::fmt;

use session_api::SessionApiError;
use thiserror::Error;

use crate::config::WORKFLOW_ID_ENV_VAR;

/// User-facing message when the workflow id is unset or still a placeholder.
pub const WORKFLOW_NOT_CONFIGURED_MESSAGE: &str =
    "Set CHATKIT_WORKFLOW_ID to a published workflow id before starting a session.";

/// User-facing notice when the session works but the auto-start message failed.
pub const AUTO_START_FAILED_MESSAGE: &str =
    "Connected, but failed to send the initial message. You can type manually.";

/// Failure taxonomy for the session controller.
///
/// `Display` renders exactly the text shown to the end user (or, for
/// `Protocol`, the text logged for the agent-facing failure).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Workflow or endpoint misconfigured; needs operator action.
    #[error("{0}")]
    Configuration(String),

    /// Transport or backend-reported negotiation failure.
    #[error("{0}")]
    Negotiation(String),

    /// Unrecognized tool or malformed tool params; only reported to the agent.
    #[error("{0}")]
    Protocol(String),

    /// Best-effort auto-start send failed; the session remains usable.
    #[error("{0}")]
    AutoStart(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Negotiation,
    Protocol,
    AutoStart,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Negotiation => "negotiation",
            Self::Protocol => "protocol",
            Self::AutoStart => "auto_start",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Negotiation(_) => ErrorKind::Negotiation,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::AutoStart(_) => ErrorKind::AutoStart,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Configuration(message)
            | Self::Negotiation(message)
            | Self::Protocol(message)
            | Self::AutoStart(message) => message,
        }
    }

    /// Whether the error surface offers a manual retry for this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Negotiation(_))
    }

    pub fn auto_start_failed() -> Self {
        Self::AutoStart(AUTO_START_FAILED_MESSAGE.to_string())
    }
}

impl From<SessionApiError> for SessionError {
    fn from(error: SessionApiError) -> Self {
        match error {
            SessionApiError::MissingWorkflowId | SessionApiError::PlaceholderWorkflowId(_) => {
                tracing::debug!(env = WORKFLOW_ID_ENV_VAR, %error, "workflow id rejected");
                Self::Configuration(WORKFLOW_NOT_CONFIGURED_MESSAGE.to_string())
            }
            error if error.is_configuration() => Self::Configuration(error.to_string()),
            error => Self::Negotiation(error.to_string()),
        }
    }
}
