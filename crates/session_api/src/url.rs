use url::Url;

use crate::error::SessionApiError;

/// Default endpoint used when no negotiation URL is configured.
pub const DEFAULT_SESSION_ENDPOINT: &str = "http://localhost:3000/api/create-session";

/// Normalize a configured negotiation endpoint.
///
/// Normalization rules:
/// 1) blank input falls back to [`DEFAULT_SESSION_ENDPOINT`]
/// 2) surrounding whitespace and trailing `/` are removed
/// 3) the result must be an absolute `http` or `https` URL
pub fn normalize_session_endpoint(input: &str) -> Result<String, SessionApiError> {
    let base = if input.trim().is_empty() {
        DEFAULT_SESSION_ENDPOINT
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|error| SessionApiError::InvalidEndpoint(format!("{trimmed}: {error}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        scheme => Err(SessionApiError::InvalidEndpoint(format!(
            "{trimmed}: unsupported scheme '{scheme}'"
        ))),
    }
}
