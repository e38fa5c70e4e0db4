//! Mount-scoped session state machine.
//!
//! Every transition is synchronous. Operations that suspend (credential
//! negotiation, the auto-start send) take a ticket before suspending and hand
//! it back afterwards; results for a generation that has since been reset are
//! rejected.

use session_protocol::Generation;

use crate::error::SessionError;
use crate::surface::{ErrorSurface, SurfaceView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Ready,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiationTicket {
    pub generation: Generation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoStartTicket {
    pub generation: Generation,
    pub text: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct AutoStart {
    text: Option<String>,
    fired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    phase: Phase,
    generation: Generation,
    control_attached: bool,
    surface: ErrorSurface,
    auto_start: AutoStart,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: Phase::Initializing,
            generation: 0,
            control_attached: false,
            surface: ErrorSurface::default(),
            auto_start: AutoStart::default(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn control_attached(&self) -> bool {
        self.control_attached
    }

    pub fn surface(&self) -> &ErrorSurface {
        &self.surface
    }

    pub fn view(&self) -> SurfaceView {
        self.surface.view(&self.phase)
    }

    pub fn auto_start_fired(&self) -> bool {
        self.auto_start.fired
    }

    /// Starts a credential request. Only a first request (no previous
    /// credential) forces `Initializing`.
    pub fn begin_negotiation(&mut self, refresh: bool) -> NegotiationTicket {
        if !refresh {
            self.phase = Phase::Initializing;
        } else if matches!(self.phase, Phase::Error(_)) {
            self.phase = self.settled_phase();
        }
        self.surface.clear();

        NegotiationTicket {
            generation: self.generation,
        }
    }

    /// Applies a negotiation result. Returns `false` when the ticket belongs to
    /// an earlier generation and nothing changed. A success on a widget that
    /// already handed over its control settles straight to `Ready`.
    pub fn apply_negotiation(
        &mut self,
        ticket: NegotiationTicket,
        outcome: Result<(), SessionError>,
    ) -> bool {
        if ticket.generation != self.generation {
            return false;
        }

        match outcome {
            Ok(()) => {
                self.surface.clear();
                if self.control_attached || matches!(self.phase, Phase::Error(_)) {
                    self.phase = self.settled_phase();
                }
            }
            Err(error) => {
                self.phase = Phase::Error(error.message().to_string());
                self.surface.set(error);
            }
        }
        true
    }

    /// The widget mounted and handed over its control handle.
    pub fn on_control_ready(&mut self) {
        self.control_attached = true;
        if !matches!(self.phase, Phase::Error(_)) {
            self.phase = Phase::Ready;
        }
    }

    /// The widget owns error surfacing once a response is streaming.
    pub fn on_response_start(&mut self) {
        self.surface.clear();
        if matches!(self.phase, Phase::Error(_)) {
            self.phase = self.settled_phase();
        }
    }

    pub fn on_thread_change(&mut self) {
        self.auto_start.fired = false;
    }

    pub fn configure_auto_start(&mut self, text: Option<String>) {
        self.auto_start.text = text.filter(|value| !value.trim().is_empty());
    }

    /// Claims the auto-start send for this generation. The guard is set here,
    /// before the send starts.
    pub fn claim_auto_start(&mut self) -> Option<AutoStartTicket> {
        if !self.control_attached || self.auto_start.fired {
            return None;
        }
        let text = self.auto_start.text.clone()?;
        self.auto_start.fired = true;

        Some(AutoStartTicket {
            generation: self.generation,
            text,
        })
    }

    /// Surfaces a failed auto-start without leaving the current phase. The
    /// guard stays set. A blocking error already on the surface is kept.
    pub fn apply_auto_start_failure(&mut self, ticket: &AutoStartTicket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        if !self.surface.retry_offered() {
            self.surface.set(SessionError::auto_start_failed());
        }
        true
    }

    pub fn dismiss_notice(&mut self) -> bool {
        self.surface.dismiss_notice()
    }

    /// Manual retry; only honoured while a retryable error is shown.
    pub fn retry(&mut self) -> Option<Generation> {
        if !self.surface.retry_offered() {
            return None;
        }
        Some(self.reset())
    }

    /// Discards the current widget incarnation and re-arms auto-start.
    pub fn reset(&mut self) -> Generation {
        self.generation += 1;
        self.phase = Phase::Initializing;
        self.control_attached = false;
        self.surface.clear();
        self.auto_start.fired = false;
        self.generation
    }

    fn settled_phase(&self) -> Phase {
        if self.control_attached {
            Phase::Ready
        } else {
            Phase::Initializing
        }
    }
}
