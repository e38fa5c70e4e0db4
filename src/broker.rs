//! Credential broker: turns one negotiation attempt into one outcome.
//!
//! The broker holds no controller state. It never retries and never panics;
//! every failure, including transport errors, comes back as
//! [`NegotiationOutcome::Failure`].

use async_trait::async_trait;
use session_api::{SessionApiClient, SessionApiError, SessionGrant, SessionRequest};
use session_protocol::SessionCredential;

use crate::config::SessionConfig;
use crate::error::SessionError;

/// Result of exactly one negotiation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationOutcome {
    Success { credential: SessionCredential },
    Failure { error: SessionError },
}

impl NegotiationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn into_result(self) -> Result<SessionCredential, SessionError> {
        match self {
            Self::Success { credential } => Ok(credential),
            Self::Failure { error } => Err(error),
        }
    }
}

impl From<Result<SessionGrant, SessionApiError>> for NegotiationOutcome {
    fn from(result: Result<SessionGrant, SessionApiError>) -> Self {
        match result {
            Ok(grant) => Self::Success {
                credential: SessionCredential::new(grant.client_secret),
            },
            Err(error) => Self::Failure {
                error: error.into(),
            },
        }
    }
}

/// Source of session credentials.
///
/// `previous` is `None` on the first request and carries the superseded
/// credential on refresh.
#[async_trait]
pub trait CredentialBroker: Send + Sync + 'static {
    async fn negotiate(&self, previous: Option<&str>) -> NegotiationOutcome;
}

enum Transport {
    Ready(SessionApiClient),
    Misconfigured(SessionError),
}

/// Broker backed by the HTTP negotiation endpoint.
pub struct HttpCredentialBroker {
    request: SessionRequest,
    transport: Transport,
}

impl HttpCredentialBroker {
    /// Builds the broker. An invalid endpoint is kept as a configuration
    /// failure and reported on every negotiation.
    pub fn new(config: &SessionConfig) -> Self {
        let transport = match SessionApiClient::new(config.api_config()) {
            Ok(client) => Transport::Ready(client),
            Err(error) => Transport::Misconfigured(error.into()),
        };
        Self {
            request: config.session_request(),
            transport,
        }
    }

    pub fn request(&self) -> &SessionRequest {
        &self.request
    }

    async fn negotiate_once(&self) -> NegotiationOutcome {
        if let Err(error) = self.request.validate() {
            return NegotiationOutcome::Failure {
                error: error.into(),
            };
        }

        match &self.transport {
            Transport::Misconfigured(error) => NegotiationOutcome::Failure {
                error: error.clone(),
            },
            Transport::Ready(client) => client.create_session(&self.request).await.into(),
        }
    }
}

#[async_trait]
impl CredentialBroker for HttpCredentialBroker {
    async fn negotiate(&self, previous: Option<&str>) -> NegotiationOutcome {
        let refresh = previous.is_some();
        let outcome = self.negotiate_once().await;

        match &outcome {
            NegotiationOutcome::Success { .. } => {
                tracing::debug!(refresh, "session credential issued");
            }
            NegotiationOutcome::Failure { error } => {
                tracing::warn!(refresh, kind = %error.kind(), %error, "session negotiation failed");
            }
        }
        outcome
    }
}
