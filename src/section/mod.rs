//! Section registry and orchestration.
//!
//! A [`Dashboard`] owns one poll schedule, one fault compartment, and one
//! published view-model per registered section. Sections are isolated
//! from each other: a failing upstream or a render fault in one section
//! never blocks its siblings from rendering or polling.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::compartment::{
    shared_failure_state, FailureState, FaultCompartment, SectionPhase, SharedFailureState,
};
use crate::envelope::normalize;
use crate::errors::UpstreamError;
use crate::scheduler::{PollOperation, PollPolicy, PollScheduler};
use crate::viewmodel::{assemble, SectionKind, SectionViewModel};
use crate::visualization::{EngineLoader, LazyVisualization};

/// Upstream fetch seam: pages supply an async call returning either a raw
/// envelope or a transport error. The core assumes nothing beyond
/// "JSON-like with an optional data/Data wrapper".
pub type SectionFetcher =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Value, UpstreamError>> + Send + Sync>;

/// Wrap an async closure as a [`SectionFetcher`].
pub fn fetcher_fn<F, Fut>(f: F) -> SectionFetcher
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, UpstreamError>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Per-section fetch counters, in the spirit of connection statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SectionStats {
    pub fetches: u64,
    pub successes: u64,
    pub failures: u64,
    /// Epoch milliseconds of the last successful apply.
    pub last_success_at: Option<i64>,
}

impl SectionStats {
    fn record_fetch(&mut self) {
        self.fetches += 1;
    }

    fn record_success(&mut self, at: i64) {
        self.successes += 1;
        self.last_success_at = Some(at);
    }

    fn record_failure(&mut self) {
        self.failures += 1;
    }
}

struct SectionEntry {
    kind: SectionKind,
    policy: PollPolicy,
    fetcher: SectionFetcher,
    /// Bumped on every (re)schedule; results carrying a stale generation
    /// are discarded instead of overwriting newer state.
    generation: Arc<AtomicU64>,
    state: SharedFailureState,
    stats: Arc<Mutex<SectionStats>>,
    view_tx: watch::Sender<Option<SectionViewModel>>,
    compartment: Arc<FaultCompartment>,
}

struct DashboardInner {
    scheduler: PollScheduler,
    visualization: Arc<LazyVisualization>,
    sections: Mutex<FxHashMap<String, SectionEntry>>,
}

/// The dashboard aggregation core. Cheap to clone; all clones share the
/// same section registry and engine handle.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

impl Dashboard {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            inner: Arc::new(DashboardInner {
                scheduler: PollScheduler::new(),
                visualization: Arc::new(LazyVisualization::new(loader)),
                sections: Mutex::new(FxHashMap::default()),
            }),
        }
    }

    /// The shared lazy visualization loader (one engine per process).
    pub fn visualization(&self) -> &Arc<LazyVisualization> {
        &self.inner.visualization
    }

    /// Register a section and start polling it immediately.
    ///
    /// Re-registering an id cancels and replaces the prior schedule; the
    /// superseded schedule's in-flight results are discarded.
    pub fn register_section(
        &self,
        id: &str,
        kind: SectionKind,
        fetcher: SectionFetcher,
        policy: PollPolicy,
    ) -> SectionHandle {
        let state = shared_failure_state();
        let stats = Arc::new(Mutex::new(SectionStats::default()));
        let (view_tx, view_rx) = watch::channel(None);
        let compartment = Arc::new(FaultCompartment::new(id, state.clone()));

        let entry = SectionEntry {
            kind,
            policy,
            fetcher,
            generation: Arc::new(AtomicU64::new(0)),
            state: state.clone(),
            stats: Arc::clone(&stats),
            view_tx,
            compartment: Arc::clone(&compartment),
        };

        let replaced = self
            .inner
            .sections
            .lock()
            .unwrap()
            .insert(id.to_string(), entry)
            .is_some();
        if replaced {
            debug!(section = %id, "re-registering section, prior registration replaced");
        }
        info!(section = %id, kind = kind.as_str(), "section registered");

        self.start_poll(id);

        SectionHandle {
            id: id.to_string(),
            inner: Arc::clone(&self.inner),
            view_rx,
            state,
            stats,
            compartment,
        }
    }

    /// Manual retry for a section: resets its failure state and
    /// compartment, then re-schedules polling from scratch.
    pub fn retry_section(&self, id: &str) -> bool {
        let known = {
            let sections = self.inner.sections.lock().unwrap();
            match sections.get(id) {
                Some(entry) => {
                    entry.state.lock().unwrap().reset();
                    entry.compartment.reset();
                    true
                }
                None => false,
            }
        };
        if known {
            info!(section = %id, "manual retry requested");
            self.start_poll(id);
        }
        known
    }

    /// Tear down a section: cancels its timers, discards in-flight
    /// results, and forgets its state. Idempotent.
    pub fn unmount_section(&self, id: &str) -> bool {
        self.inner.scheduler.cancel(id);
        match self.inner.sections.lock().unwrap().remove(id) {
            Some(entry) => {
                // In-flight results from this registration become stale.
                entry.generation.fetch_add(1, Ordering::SeqCst);
                info!(section = %id, "section unmounted");
                true
            }
            None => false,
        }
    }

    /// Tear down every section (dashboard unmount).
    pub fn unmount_all(&self) {
        self.inner.scheduler.cancel_all();
        let mut sections = self.inner.sections.lock().unwrap();
        for entry in sections.values() {
            entry.generation.fetch_add(1, Ordering::SeqCst);
        }
        sections.clear();
    }

    /// Aggregate per-section phase into a readiness summary.
    pub fn health(&self) -> Value {
        let sections = self.inner.sections.lock().unwrap();
        let mut checks = serde_json::Map::new();
        let mut degraded = false;
        let mut failed = false;

        for (id, entry) in sections.iter() {
            let snapshot: FailureState = entry.state.lock().unwrap().clone();
            let status = match snapshot.phase {
                SectionPhase::Idle => "idle",
                SectionPhase::Loading => "loading",
                SectionPhase::Succeeded => "healthy",
                SectionPhase::Failed => {
                    degraded = true;
                    "degraded"
                }
                SectionPhase::TerminallyFailed => {
                    failed = true;
                    "failed"
                }
            };
            checks.insert(
                id.clone(),
                json!({
                    "status": status,
                    "attempts": snapshot.attempts,
                    "error": snapshot.last_error.as_ref().map(|e| e.message.clone()),
                }),
            );
        }

        let overall = if failed {
            "failed"
        } else if degraded {
            "degraded"
        } else {
            "ok"
        };
        json!({
            "status": overall,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "sections": checks,
        })
    }

    /// Bump the section's generation and (re)schedule its poll loop.
    fn start_poll(&self, id: &str) {
        let (op, policy, state) = {
            let sections = self.inner.sections.lock().unwrap();
            let Some(entry) = sections.get(id) else {
                return;
            };
            let my_gen = entry.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let op = build_poll_operation(id, entry, my_gen);
            (op, entry.policy.clone(), entry.state.clone())
        };
        self.inner.scheduler.schedule(id, op, policy, state);
    }
}

/// One poll pass: fetch, normalize, check for a declared failure,
/// assemble, and publish — unless the result went stale in flight.
fn build_poll_operation(id: &str, entry: &SectionEntry, my_gen: u64) -> PollOperation {
    let id = id.to_string();
    let kind = entry.kind;
    let fetcher = entry.fetcher.clone();
    let generation = Arc::clone(&entry.generation);
    let stats = Arc::clone(&entry.stats);
    let view_tx = entry.view_tx.clone();

    Arc::new(move || {
        let id = id.clone();
        let fetcher = fetcher.clone();
        let generation = Arc::clone(&generation);
        let stats = Arc::clone(&stats);
        let view_tx = view_tx.clone();

        async move {
            stats.lock().unwrap().record_fetch();

            let raw = match fetcher().await {
                Ok(raw) => raw,
                Err(err) => {
                    stats.lock().unwrap().record_failure();
                    return Err(err.into());
                }
            };

            let record = normalize(&raw);
            if record.has_declared_errors() {
                stats.lock().unwrap().record_failure();
                return Err(UpstreamError::Declared(record.errors().join("; ")).into());
            }

            let view_model = assemble(&record, kind);

            if generation.load(Ordering::SeqCst) != my_gen {
                debug!(section = %id, "discarding stale fetch result from superseded schedule");
                return Ok(());
            }

            view_tx.send_replace(Some(view_model));
            stats
                .lock()
                .unwrap()
                .record_success(chrono::Utc::now().timestamp_millis());
            Ok(())
        }
        .boxed()
    })
}

/// Caller-facing handle for one registered section.
pub struct SectionHandle {
    id: String,
    inner: Arc<DashboardInner>,
    view_rx: watch::Receiver<Option<SectionViewModel>>,
    state: SharedFailureState,
    stats: Arc<Mutex<SectionStats>>,
    compartment: Arc<FaultCompartment>,
}

impl SectionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The latest assembled view-model; survives later failures so the
    /// section can keep showing last-known data.
    pub fn view(&self) -> Option<SectionViewModel> {
        self.view_rx.borrow().clone()
    }

    /// A watch receiver for change-driven rendering.
    pub fn watch_view(&self) -> watch::Receiver<Option<SectionViewModel>> {
        self.view_rx.clone()
    }

    /// Snapshot of the section's failure state.
    pub fn failure(&self) -> FailureState {
        self.state.lock().unwrap().clone()
    }

    pub fn stats(&self) -> SectionStats {
        self.stats.lock().unwrap().clone()
    }

    /// The containment boundary to render this section inside.
    pub fn compartment(&self) -> Arc<FaultCompartment> {
        Arc::clone(&self.compartment)
    }

    /// Manual retry: clears failure state and restarts polling.
    pub fn retry(&self) {
        Dashboard {
            inner: Arc::clone(&self.inner),
        }
        .retry_section(&self.id);
    }

    /// Cancel timers and forget this section. Idempotent.
    pub fn unmount(&self) {
        Dashboard {
            inner: Arc::clone(&self.inner),
        }
        .unmount_section(&self.id);
    }
}
