//! Fault compartments: per-section containment for render-time failures.
//!
//! A single malformed payload or a panic in one section's render path must
//! never blank the whole dashboard. The compartment catches the failure,
//! records it into the section's [`FailureState`], and serves a fallback
//! until a manual reset.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::ErrorKind;

/// Lifecycle phase of a section's data pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SectionPhase {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
    /// Retries exhausted; only a manual retry leaves this phase.
    TerminallyFailed,
}

/// Last recorded failure for a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureInfo {
    pub kind: ErrorKind,
    pub message: String,
}

/// Per-section record of retry attempts and last error, driving the
/// fallback UI.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct FailureState {
    pub attempts: u32,
    pub last_error: Option<FailureInfo>,
    /// Epoch milliseconds of the next scheduled retry, if any.
    pub retry_scheduled_at: Option<i64>,
    pub phase: SectionPhase,
}

impl FailureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_attempt(&mut self) {
        self.phase = SectionPhase::Loading;
        self.retry_scheduled_at = None;
    }

    pub fn succeed(&mut self) {
        self.attempts = 0;
        self.last_error = None;
        self.retry_scheduled_at = None;
        self.phase = SectionPhase::Succeeded;
    }

    pub fn fail_retrying(&mut self, kind: ErrorKind, message: String, attempts: u32, retry_at: i64) {
        self.attempts = attempts;
        self.last_error = Some(FailureInfo { kind, message });
        self.retry_scheduled_at = Some(retry_at);
        self.phase = SectionPhase::Failed;
    }

    pub fn fail_terminal(&mut self, kind: ErrorKind, message: String, attempts: u32) {
        self.attempts = attempts;
        self.last_error = Some(FailureInfo { kind, message });
        self.retry_scheduled_at = None;
        self.phase = SectionPhase::TerminallyFailed;
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == SectionPhase::TerminallyFailed
    }

    /// Manual retry / successful refresh returns the state to idle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Shared, lockable failure state for one section.
pub type SharedFailureState = Arc<Mutex<FailureState>>;

pub fn shared_failure_state() -> SharedFailureState {
    Arc::new(Mutex::new(FailureState::new()))
}

/// Containment boundary around one section's render path.
///
/// After a caught fault the compartment is tripped: content is not
/// re-attempted until [`FaultCompartment::reset`] is called.
pub struct FaultCompartment {
    section_id: String,
    state: SharedFailureState,
    tripped: AtomicBool,
}

impl FaultCompartment {
    pub fn new(section_id: impl Into<String>, state: SharedFailureState) -> Self {
        Self {
            section_id: section_id.into(),
            state,
            tripped: AtomicBool::new(false),
        }
    }

    pub fn section_id(&self) -> &str {
        &self.section_id
    }

    /// Evaluate `content`, containing any panic to this compartment.
    ///
    /// On a caught fault (or while tripped from a previous fault) the
    /// fallback is rendered instead; the error never reaches the caller,
    /// so sibling sections keep functioning.
    pub fn render<T>(
        &self,
        content: impl FnOnce() -> T,
        fallback: impl FnOnce(&FailureState) -> T,
    ) -> T {
        if self.tripped.load(Ordering::Acquire) {
            debug!(section = %self.section_id, "compartment tripped, serving fallback");
            return fallback(&self.snapshot());
        }

        match panic::catch_unwind(AssertUnwindSafe(content)) {
            Ok(rendered) => rendered,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(
                    section = %self.section_id,
                    error = %message,
                    "render fault contained; section falls back"
                );
                self.tripped.store(true, Ordering::Release);
                if let Ok(mut state) = self.state.lock() {
                    let attempts = state.attempts + 1;
                    state.fail_terminal(ErrorKind::RenderFault, message, attempts);
                }
                fallback(&self.snapshot())
            }
        }
    }

    /// Render with the default `"<section> unavailable"` placeholder.
    pub fn render_or_placeholder(&self, content: impl FnOnce() -> String) -> String {
        let section_id = self.section_id.clone();
        self.render(content, move |_| format!("{} unavailable", section_id))
    }

    /// True once a fault has been contained and not yet reset.
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Manual reset: clears the failure state and re-attempts content on
    /// the next render pass.
    pub fn reset(&self) {
        self.tripped.store(false, Ordering::Release);
        if let Ok(mut state) = self.state.lock() {
            state.reset();
        }
    }

    fn snapshot(&self) -> FailureState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
