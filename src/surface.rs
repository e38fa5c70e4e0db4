use crate::error::SessionError;
use crate::lifecycle::Phase;

/// Fallback text shown while a session is being prepared and nothing failed.
pub const INITIALIZING_FALLBACK: &str = "Loading assistant session...";

/// Single user-visible error slot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorSurface {
    current: Option<SessionError>,
}

impl ErrorSurface {
    pub fn set(&mut self, error: SessionError) {
        self.current = Some(error);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Clears the slot only when it holds an informational notice.
    pub fn dismiss_notice(&mut self) -> bool {
        if self
            .current
            .as_ref()
            .is_some_and(|error| !error.is_retryable())
        {
            self.current = None;
            return true;
        }
        false
    }

    pub fn current(&self) -> Option<&SessionError> {
        self.current.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.current.as_ref().map(SessionError::message)
    }

    pub fn retry_offered(&self) -> bool {
        self.current.as_ref().is_some_and(SessionError::is_retryable)
    }

    pub fn view(&self, phase: &Phase) -> SurfaceView {
        let message = self.message().map(str::to_string);
        let fallback = match (&message, phase) {
            (None, Phase::Initializing) => Some(INITIALIZING_FALLBACK),
            _ => None,
        };
        SurfaceView {
            message,
            fallback,
            retry_offered: self.retry_offered(),
        }
    }
}

/// What the host renders around the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceView {
    pub message: Option<String>,
    pub fallback: Option<&'static str>,
    pub retry_offered: bool,
}
