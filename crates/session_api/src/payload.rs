use serde::{Deserialize, Serialize};

use crate::error::SessionApiError;

/// Prefix of the workflow id shipped in sample configuration files.
pub const PLACEHOLDER_WORKFLOW_PREFIX: &str = "wf_replace";

/// Request body for the session negotiation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub workflow: WorkflowRef,
    #[serde(rename = "chatkit_configuration")]
    pub configuration: SessionConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfiguration {
    pub file_upload: FileUpload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub enabled: bool,
}

impl SessionRequest {
    /// Builds a request body; surrounding whitespace in the workflow id is
    /// dropped before it reaches the wire.
    pub fn new(workflow_id: impl Into<String>, file_upload_enabled: bool) -> Self {
        let workflow_id = workflow_id.into();
        Self {
            workflow: WorkflowRef {
                id: workflow_id.trim().to_string(),
            },
            configuration: SessionConfiguration {
                file_upload: FileUpload {
                    enabled: file_upload_enabled,
                },
            },
        }
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow.id
    }

    /// Rejects requests that must never reach the network.
    pub fn validate(&self) -> Result<(), SessionApiError> {
        let id = self.workflow.id.trim();
        if id.is_empty() {
            return Err(SessionApiError::MissingWorkflowId);
        }
        if id.starts_with(PLACEHOLDER_WORKFLOW_PREFIX) {
            return Err(SessionApiError::PlaceholderWorkflowId(id.to_string()));
        }
        Ok(())
    }
}

/// Successful negotiation result.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub client_secret: String,
}

impl std::fmt::Debug for SessionGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGrant")
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
