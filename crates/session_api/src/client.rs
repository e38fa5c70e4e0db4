use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};

use crate::config::SessionApiConfig;
use crate::error::{extract_error_detail, status_text, SessionApiError};
use crate::headers::build_headers;
use crate::payload::{SessionGrant, SessionRequest};
use crate::url::normalize_session_endpoint;

#[derive(Debug)]
pub struct SessionApiClient {
    http: Client,
    config: SessionApiConfig,
    endpoint: String,
}

impl SessionApiClient {
    pub fn new(config: SessionApiConfig) -> Result<Self, SessionApiError> {
        let endpoint = normalize_session_endpoint(&config.endpoint)?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            config,
            endpoint,
        })
    }

    pub fn build_headers(&self) -> Result<HeaderMap, SessionApiError> {
        let mut out = HeaderMap::new();
        for (key, value) in build_headers(&self.config) {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| SessionApiError::InvalidHeader(format!("key: {key}")))?,
                HeaderValue::from_str(&value)
                    .map_err(|_| SessionApiError::InvalidHeader(format!("value for {key}")))?,
            );
        }
        Ok(out)
    }

    /// Builds the negotiation request. Fails before touching the network when
    /// the workflow id is unset or still a placeholder.
    pub fn build_request(
        &self,
        request: &SessionRequest,
    ) -> Result<reqwest::RequestBuilder, SessionApiError> {
        request.validate()?;

        let headers = self.build_headers()?;
        Ok(self.http.post(self.endpoint.as_str()).headers(headers).json(request))
    }

    /// Performs exactly one negotiation round-trip.
    pub async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<SessionGrant, SessionApiError> {
        let response = self.build_request(request)?.send().await?;
        let status = response.status();
        let body = response.text().await?;
        classify_response(status, &body)
    }
}

/// Classify a negotiation response from its status and raw body text.
///
/// Success requires both a 2xx status and a non-empty `client_secret` string.
pub fn classify_response(status: StatusCode, body: &str) -> Result<SessionGrant, SessionApiError> {
    let payload = parse_payload(body);

    if !status.is_success() {
        return Err(SessionApiError::Status {
            status,
            message: extract_error_detail(&payload, status_text(status)),
        });
    }

    payload
        .get("client_secret")
        .and_then(Value::as_str)
        .filter(|secret| !secret.is_empty())
        .map(|secret| SessionGrant {
            client_secret: secret.to_string(),
        })
        .ok_or(SessionApiError::MissingClientSecret)
}

fn parse_payload(body: &str) -> Value {
    if body.is_empty() {
        return Value::Object(Map::new());
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(error) => {
            tracing::debug!(%error, "session response body is not JSON; treating as empty");
            Value::Object(Map::new())
        }
    }
}
