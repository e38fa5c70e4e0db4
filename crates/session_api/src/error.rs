use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub const MISSING_CLIENT_SECRET_MESSAGE: &str = "Missing client secret in response";

#[derive(Debug, Error)]
pub enum SessionApiError {
    #[error("workflow id is not configured")]
    MissingWorkflowId,

    #[error("workflow id '{0}' is still a placeholder value")]
    PlaceholderWorkflowId(String),

    #[error("invalid session endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("invalid header {0}")]
    InvalidHeader(String),

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status; `message` is the extracted user-facing detail.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Missing client secret in response")]
    MissingClientSecret,
}

impl SessionApiError {
    /// True for failures that require operator action before any request can be made.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingWorkflowId
                | Self::PlaceholderWorkflowId(_)
                | Self::InvalidEndpoint(_)
                | Self::InvalidHeader(_)
        )
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(error) => error.status(),
            _ => None,
        }
    }
}

/// Error-carrying value shapes accepted in a failed negotiation body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorShape<'a> {
    Text(&'a str),
    WithMessage(&'a str),
    Absent,
}

impl<'a> ErrorShape<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::String(text)) => Self::Text(text),
            Some(Value::Object(fields)) => match fields.get("message") {
                Some(Value::String(message)) => Self::WithMessage(message),
                _ => Self::Absent,
            },
            _ => Self::Absent,
        }
    }

    fn message(self) -> Option<&'a str> {
        match self {
            Self::Text(text) | Self::WithMessage(text) => Some(text),
            Self::Absent => None,
        }
    }
}

/// Extract the user-facing failure detail from a negotiation response payload.
///
/// First match wins:
/// 1) `error` as a string
/// 2) `error.message` as a string
/// 3) `details` as a string
/// 4) `details.error`, with the same string-or-`{message}` rule
/// 5) top-level `message` as a string
/// 6) `fallback` (the transport status text)
///
/// Absent or wrong-typed fields count as "not present"; a non-object payload
/// falls straight through to `fallback`.
pub fn extract_error_detail(payload: &Value, fallback: &str) -> String {
    let Some(fields) = payload.as_object() else {
        return fallback.to_string();
    };

    if let Some(message) = ErrorShape::of(fields.get("error")).message() {
        return message.to_string();
    }

    match fields.get("details") {
        Some(Value::String(details)) => return details.clone(),
        Some(Value::Object(details)) => {
            if let Some(message) = ErrorShape::of(details.get("error")).message() {
                return message.to_string();
            }
        }
        _ => {}
    }

    if let Some(Value::String(message)) = fields.get("message") {
        return message.clone();
    }

    fallback.to_string()
}

/// Reason phrase used as the last-resort failure detail.
pub fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("request failed")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_shape_ignores_wrong_typed_message() {
        assert_eq!(
            ErrorShape::of(Some(&json!({ "message": 42 }))),
            ErrorShape::Absent
        );
        assert_eq!(ErrorShape::of(Some(&json!(null))), ErrorShape::Absent);
        assert_eq!(ErrorShape::of(None), ErrorShape::Absent);
    }

    #[test]
    fn empty_string_error_still_wins() {
        let payload = json!({ "error": "", "message": "later" });
        assert_eq!(extract_error_detail(&payload, "Bad Request"), "");
    }

    #[test]
    fn status_text_falls_back_for_unknown_codes() {
        let status = StatusCode::from_u16(599).expect("valid status");
        assert_eq!(status_text(status), "request failed");
        assert_eq!(status_text(StatusCode::BAD_GATEWAY), "Bad Gateway");
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(SessionApiError::MissingWorkflowId.is_configuration());
        assert!(SessionApiError::PlaceholderWorkflowId("wf_replace_me".into()).is_configuration());
        assert!(!SessionApiError::MissingClientSecret.is_configuration());
    }
}
