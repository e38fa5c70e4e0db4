#![allow(dead_code)]

pub mod http;

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chatkit_session::{
    Collaborators, CollaboratorError, ColorScheme, CredentialBroker, FactRecord, FactSink,
    NegotiationOutcome, SessionController, SessionCredential, SessionError, WidgetControl,
};
use tokio::sync::Semaphore;

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Polls `condition` until it holds, panicking after one second.
pub async fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Lets spawned tasks run for a moment so absent effects can be asserted.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}

pub fn success(secret: &str) -> NegotiationOutcome {
    NegotiationOutcome::Success {
        credential: SessionCredential::new(secret),
    }
}

pub fn failure(error: SessionError) -> NegotiationOutcome {
    NegotiationOutcome::Failure { error }
}

/// Broker replaying scripted outcomes. A broker built with
/// [`ScriptedBroker::held`] makes each negotiation wait for one `release`.
#[derive(Default)]
pub struct ScriptedBroker {
    outcomes: Mutex<VecDeque<NegotiationOutcome>>,
    previous: Mutex<Vec<Option<String>>>,
    gate: Option<Semaphore>,
}

impl ScriptedBroker {
    pub fn new(outcomes: Vec<NegotiationOutcome>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            ..Self::default()
        })
    }

    pub fn held(outcomes: Vec<NegotiationOutcome>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            previous: Mutex::default(),
            gate: Some(Semaphore::new(0)),
        })
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        lock_unpoisoned(&self.previous).len()
    }

    pub fn previous_values(&self) -> Vec<Option<String>> {
        lock_unpoisoned(&self.previous).clone()
    }
}

#[async_trait]
impl CredentialBroker for ScriptedBroker {
    async fn negotiate(&self, previous: Option<&str>) -> NegotiationOutcome {
        lock_unpoisoned(&self.previous).push(previous.map(str::to_string));
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        lock_unpoisoned(&self.outcomes)
            .pop_front()
            .unwrap_or_else(|| failure(SessionError::Negotiation("no scripted outcome".into())))
    }
}

/// Widget control recording every send; can be switched to fail.
#[derive(Default)]
pub struct RecordingWidget {
    sends: Mutex<Vec<(String, bool)>>,
    fail: AtomicBool,
}

impl RecordingWidget {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let widget = Self::default();
        widget.fail.store(true, Ordering::SeqCst);
        Arc::new(widget)
    }

    pub fn sends(&self) -> Vec<(String, bool)> {
        lock_unpoisoned(&self.sends).clone()
    }

    pub fn send_count(&self) -> usize {
        lock_unpoisoned(&self.sends).len()
    }
}

#[async_trait]
impl WidgetControl for RecordingWidget {
    async fn send_user_message(
        &self,
        text: &str,
        new_thread: bool,
    ) -> Result<(), CollaboratorError> {
        lock_unpoisoned(&self.sends).push((text.to_string(), new_thread));
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::from("widget rejected the message"));
        }
        Ok(())
    }
}

/// Fact handler that blocks each persist until released, so duplicate
/// invocations can race an in-flight handler.
pub struct GatedFacts {
    calls: Mutex<Vec<FactRecord>>,
    completed: AtomicUsize,
    gate: Semaphore,
    fail: AtomicBool,
}

impl GatedFacts {
    pub fn open() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::default(),
            completed: AtomicUsize::new(0),
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
            fail: AtomicBool::new(false),
        })
    }

    pub fn closed() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::default(),
            completed: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            fail: AtomicBool::new(false),
        })
    }

    pub fn failing() -> Arc<Self> {
        let facts = Self::open();
        facts.fail.store(true, Ordering::SeqCst);
        facts
    }

    pub fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    pub fn calls(&self) -> Vec<FactRecord> {
        lock_unpoisoned(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock_unpoisoned(&self.calls).len()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FactSink for GatedFacts {
    async fn persist(&self, fact: FactRecord) -> Result<(), CollaboratorError> {
        lock_unpoisoned(&self.calls).push(fact);
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::from("storage unavailable"));
        }
        Ok(())
    }
}

/// Host collaborators with observable theme and response-end callbacks.
pub struct Host {
    pub themes: Arc<Mutex<Vec<ColorScheme>>>,
    pub response_ends: Arc<AtomicUsize>,
    pub facts: Arc<GatedFacts>,
}

impl Host {
    pub fn new(facts: Arc<GatedFacts>) -> Self {
        Self {
            themes: Arc::default(),
            response_ends: Arc::default(),
            facts,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        let themes = Arc::clone(&self.themes);
        let response_ends = Arc::clone(&self.response_ends);
        Collaborators {
            theme: Arc::new(move |scheme: ColorScheme| lock_unpoisoned(&themes).push(scheme)),
            facts: self.facts.clone(),
            response_end: Arc::new(move || {
                response_ends.fetch_add(1, Ordering::SeqCst);
            }),
        }
    }

    pub fn themes(&self) -> Vec<ColorScheme> {
        lock_unpoisoned(&self.themes).clone()
    }

    pub fn response_end_count(&self) -> usize {
        self.response_ends.load(Ordering::SeqCst)
    }
}

/// Mounted controller over a scripted broker and a recording host.
pub struct Harness {
    pub controller: Arc<SessionController>,
    pub broker: Arc<ScriptedBroker>,
    pub host: Host,
}

impl Harness {
    pub fn new(broker: Arc<ScriptedBroker>) -> Self {
        Self::with_facts(broker, GatedFacts::open())
    }

    pub fn with_facts(broker: Arc<ScriptedBroker>, facts: Arc<GatedFacts>) -> Self {
        let host = Host::new(facts);
        let controller = SessionController::new(
            broker.clone(),
            host.collaborators(),
            tokio::runtime::Handle::current(),
        );
        Self {
            controller,
            broker,
            host,
        }
    }

    /// Negotiates a first credential and attaches `widget`, the way a
    /// freshly mounted widget would.
    pub async fn mount(&self, widget: &Arc<RecordingWidget>) {
        self.controller
            .get_client_secret(None)
            .await
            .expect("scripted negotiation should succeed");
        self.controller.attach_control(widget.clone());
    }
}

pub async fn with_timeout<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), future)
        .await
        .expect("operation should finish")
}
