//! Runtime wiring between the widget, the broker and the host collaborators.
//!
//! Controller state lives behind one mutex that is only held for synchronous
//! transitions. The two suspending operations, credential negotiation and the
//! auto-start send, capture the generation first and re-check liveness when
//! they resume. Host callbacks and spawned work always run with the lock
//! released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use session_protocol::{
    FactRecord, FactSink, Generation, ResponseEndListener, SessionCredential, ThemeSink,
    ToolInvocation, ToolResult, WidgetControl, WidgetEvent,
};
use serde_json::Value;
use tokio::runtime::Handle;

use crate::broker::{CredentialBroker, HttpCredentialBroker};
use crate::config::SessionConfig;
use crate::dispatcher::{decode_invocation, ToolDispatcher, ToolEffect};
use crate::error::SessionError;
use crate::lifecycle::{AutoStartTicket, Lifecycle, Phase};
use crate::surface::SurfaceView;

/// Host-side callbacks injected into the controller.
#[derive(Clone)]
pub struct Collaborators {
    pub theme: Arc<dyn ThemeSink>,
    pub facts: Arc<dyn FactSink>,
    pub response_end: Arc<dyn ResponseEndListener>,
}

struct SessionState {
    lifecycle: Lifecycle,
    dispatcher: ToolDispatcher,
    control: Option<Arc<dyn WidgetControl>>,
}

pub struct SessionController {
    state: Mutex<SessionState>,
    broker: Arc<dyn CredentialBroker>,
    collaborators: Collaborators,
    runtime: Handle,
    mounted: AtomicBool,
}

impl SessionController {
    /// Creates a mounted controller. Fire-and-forget work (fact persistence,
    /// the auto-start send) is spawned on `runtime`.
    pub fn new(
        broker: Arc<dyn CredentialBroker>,
        collaborators: Collaborators,
        runtime: Handle,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SessionState {
                lifecycle: Lifecycle::new(),
                dispatcher: ToolDispatcher::new(),
                control: None,
            }),
            broker,
            collaborators,
            runtime,
            mounted: AtomicBool::new(true),
        })
    }

    /// Controller negotiating over HTTP with the configured auto-start text.
    pub fn from_config(
        config: &SessionConfig,
        collaborators: Collaborators,
        runtime: Handle,
    ) -> Arc<Self> {
        let controller = Self::new(
            Arc::new(HttpCredentialBroker::new(config)),
            collaborators,
            runtime,
        );
        lock_unpoisoned(&controller.state)
            .lifecycle
            .configure_auto_start(config.auto_start.clone());
        controller
    }

    /// Widget credential callback. `previous` is `None` on the first request.
    pub async fn get_client_secret(
        &self,
        previous: Option<&str>,
    ) -> Result<SessionCredential, SessionError> {
        let ticket = {
            let mut state = lock_unpoisoned(&self.state);
            state.lifecycle.begin_negotiation(previous.is_some())
        };

        let outcome = self.broker.negotiate(previous).await.into_result();

        if !self.is_mounted() {
            tracing::debug!(
                generation = ticket.generation,
                "negotiation finished after teardown; result discarded"
            );
            return outcome;
        }

        let applied = {
            let mut state = lock_unpoisoned(&self.state);
            let status = outcome.as_ref().map(|_| ()).map_err(SessionError::clone);
            state.lifecycle.apply_negotiation(ticket, status)
        };
        if !applied {
            tracing::debug!(
                generation = ticket.generation,
                "negotiation finished for a reset session; result discarded"
            );
        }
        outcome
    }

    /// The widget is mounted and ready; this also triggers the auto-start.
    pub fn attach_control(self: &Arc<Self>, control: Arc<dyn WidgetControl>) {
        if !self.is_mounted() {
            return;
        }
        {
            let mut state = lock_unpoisoned(&self.state);
            state.control = Some(control);
            state.lifecycle.on_control_ready();
        }
        self.maybe_auto_start();
    }

    /// Sets (or clears) the message sent once per generation after the widget
    /// is ready.
    pub fn configure_auto_start(self: &Arc<Self>, text: Option<String>) {
        lock_unpoisoned(&self.state)
            .lifecycle
            .configure_auto_start(text);
        self.maybe_auto_start();
    }

    fn maybe_auto_start(self: &Arc<Self>) {
        if !self.is_mounted() {
            return;
        }

        let claimed = {
            let mut state = lock_unpoisoned(&self.state);
            match state.control.clone() {
                Some(control) => state
                    .lifecycle
                    .claim_auto_start()
                    .map(|ticket| (ticket, control)),
                None => None,
            }
        };
        let Some((ticket, control)) = claimed else {
            return;
        };

        tracing::debug!(generation = ticket.generation, "sending auto-start message");
        let controller = Arc::clone(self);
        self.runtime.spawn(async move {
            if let Err(error) = control.send_user_message(&ticket.text, true).await {
                tracing::warn!(generation = ticket.generation, %error, "auto-start send failed");
                controller.apply_auto_start_failure(&ticket);
            }
        });
    }

    fn apply_auto_start_failure(&self, ticket: &AutoStartTicket) {
        if !self.is_mounted() {
            tracing::debug!("auto-start failed after teardown; notice dropped");
            return;
        }
        if !lock_unpoisoned(&self.state)
            .lifecycle
            .apply_auto_start_failure(ticket)
        {
            tracing::debug!(
                generation = ticket.generation,
                "auto-start failed for a reset session; notice dropped"
            );
        }
    }

    pub fn handle_event(&self, event: WidgetEvent) {
        if !self.is_mounted() {
            tracing::debug!(event = event.name(), "widget event after teardown ignored");
            return;
        }

        match event {
            WidgetEvent::ResponseStart => self.on_response_start(),
            WidgetEvent::ResponseEnd => self.on_response_end(),
            WidgetEvent::ThreadChange { thread_id } => self.on_thread_change(thread_id.as_deref()),
            WidgetEvent::Error { message } => self.on_widget_error(&message),
        }
    }

    pub fn on_response_start(&self) {
        lock_unpoisoned(&self.state).lifecycle.on_response_start();
    }

    pub fn on_response_end(&self) {
        self.collaborators.response_end.on_response_end();
    }

    /// A new conversation thread began: facts may be recorded again and the
    /// next ready signal may auto-start.
    pub fn on_thread_change(&self, thread_id: Option<&str>) {
        let mut state = lock_unpoisoned(&self.state);
        state.dispatcher.clear_processed_facts();
        state.lifecycle.on_thread_change();
        tracing::debug!(?thread_id, "thread changed; processed facts cleared");
    }

    pub fn on_widget_error(&self, message: &str) {
        tracing::warn!(widget_error = message, "widget reported an error");
    }

    /// Client tool callback. Always answers; effects run with the state lock
    /// released.
    pub fn on_client_tool(&self, invocation: &ToolInvocation) -> ToolResult {
        if !self.is_mounted() {
            return ToolResult::failure();
        }

        let dispatch = lock_unpoisoned(&self.state)
            .dispatcher
            .dispatch(invocation);

        match dispatch.effect {
            Some(ToolEffect::ApplyTheme(scheme)) => {
                self.collaborators.theme.request_theme(scheme);
            }
            Some(ToolEffect::PersistFact(fact)) => self.spawn_persist(fact),
            None => {}
        }
        dispatch.result
    }

    /// Client tool callback for a raw `{name, params}` envelope. Malformed
    /// envelopes answer with a failed result and are only logged.
    pub fn on_client_tool_json(&self, envelope: Value) -> ToolResult {
        match decode_invocation(envelope) {
            Ok(invocation) => self.on_client_tool(&invocation),
            Err(error) => {
                tracing::debug!(%error, "rejected client tool envelope");
                ToolResult::failure()
            }
        }
    }

    fn spawn_persist(&self, fact: FactRecord) {
        let facts = Arc::clone(&self.collaborators.facts);
        self.runtime.spawn(async move {
            let fact_id = fact.fact_id.clone();
            if let Err(error) = facts.persist(fact).await {
                tracing::warn!(%fact_id, %error, "fact persistence failed");
            }
        });
    }

    /// Manual retry from the error surface. Returns the new generation, or
    /// `None` when no retryable error is shown.
    pub fn retry(&self) -> Option<Generation> {
        if !self.is_mounted() {
            return None;
        }
        let mut state = lock_unpoisoned(&self.state);
        let generation = state.lifecycle.retry()?;
        Self::discard_incarnation(&mut state);
        tracing::info!(generation, "session reset after retry");
        Some(generation)
    }

    /// Unconditional reset: the host remounts the widget under the returned
    /// generation.
    pub fn reset(&self) -> Generation {
        let mut state = lock_unpoisoned(&self.state);
        let generation = state.lifecycle.reset();
        Self::discard_incarnation(&mut state);
        tracing::debug!(generation, "session reset");
        generation
    }

    fn discard_incarnation(state: &mut SessionState) {
        state.dispatcher.clear_processed_facts();
        state.control = None;
    }

    /// Dismisses an informational notice, e.g. when the user starts typing.
    pub fn dismiss_notice(&self) -> bool {
        lock_unpoisoned(&self.state).lifecycle.dismiss_notice()
    }

    /// Marks the controller unmounted. In-flight work finishes but applies no
    /// further state.
    pub fn teardown(&self) {
        if self.mounted.swap(false, Ordering::SeqCst) {
            lock_unpoisoned(&self.state).control = None;
            tracing::debug!("session controller torn down");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> Phase {
        lock_unpoisoned(&self.state).lifecycle.phase().clone()
    }

    pub fn generation(&self) -> Generation {
        lock_unpoisoned(&self.state).lifecycle.generation()
    }

    pub fn view(&self) -> SurfaceView {
        lock_unpoisoned(&self.state).lifecycle.view()
    }

    pub fn has_processed_fact(&self, fact_id: &str) -> bool {
        lock_unpoisoned(&self.state).dispatcher.has_processed(fact_id)
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
