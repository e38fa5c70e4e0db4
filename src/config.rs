//! Environment configuration.

use std::env;
use std::time::Duration;

use session_api::{SessionApiConfig, SessionRequest, DEFAULT_SESSION_ENDPOINT};

use crate::error::SessionError;

pub const WORKFLOW_ID_ENV_VAR: &str = "CHATKIT_WORKFLOW_ID";
pub const ENDPOINT_ENV_VAR: &str = "CHATKIT_SESSION_ENDPOINT";
pub const FILE_UPLOAD_ENV_VAR: &str = "CHATKIT_FILE_UPLOAD";
pub const TIMEOUT_ENV_VAR: &str = "CHATKIT_TIMEOUT_SEC";
pub const AUTO_START_ENV_VAR: &str = "CHATKIT_AUTO_START";

/// Host-supplied settings for one session controller.
///
/// A missing workflow id is not an error here: it is reported as a
/// configuration failure on the first negotiation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub workflow_id: Option<String>,
    pub endpoint: String,
    pub file_upload_enabled: bool,
    pub timeout: Option<Duration>,
    pub auto_start: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            workflow_id: None,
            endpoint: DEFAULT_SESSION_ENDPOINT.to_string(),
            file_upload_enabled: true,
            timeout: None,
            auto_start: None,
        }
    }
}

impl SessionConfig {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: Some(workflow_id.into()),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, SessionError> {
        let timeout = match env_string_opt(TIMEOUT_ENV_VAR) {
            Some(raw) => Some(parse_timeout(&raw)?),
            None => None,
        };

        Ok(Self {
            workflow_id: env_string_opt(WORKFLOW_ID_ENV_VAR).map(|value| value.trim().to_string()),
            endpoint: env_string_opt(ENDPOINT_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_SESSION_ENDPOINT.to_string()),
            file_upload_enabled: env_flag_default_on(FILE_UPLOAD_ENV_VAR),
            timeout,
            auto_start: env_string_opt(AUTO_START_ENV_VAR),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_file_upload(mut self, enabled: bool) -> Self {
        self.file_upload_enabled = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_auto_start(mut self, text: impl Into<String>) -> Self {
        self.auto_start = Some(text.into());
        self
    }

    /// Negotiation body for the configured workflow. An unset id yields an
    /// empty one so the request is rejected before any network call.
    pub fn session_request(&self) -> SessionRequest {
        SessionRequest::new(
            self.workflow_id.clone().unwrap_or_default(),
            self.file_upload_enabled,
        )
    }

    pub fn api_config(&self) -> SessionApiConfig {
        let config = SessionApiConfig::new(self.endpoint.clone());
        match self.timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, SessionError> {
    match raw.trim().parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(SessionError::Configuration(format!(
            "{TIMEOUT_ENV_VAR} must be a positive number of seconds, got '{raw}'"
        ))),
    }
}

fn env_flag_default_on(key: &str) -> bool {
    match env_string_opt(key) {
        Some(value) => !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => true,
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
