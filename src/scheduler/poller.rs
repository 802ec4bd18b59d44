//! The retry/poll loop governing when each section's data source is
//! fetched, retried after failure, and re-polled on its interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::compartment::SharedFailureState;
use crate::errors::AggregationError;

use super::policy::PollPolicy;

/// One polled fetch-and-apply pass for a section. The operation owns the
/// whole pipeline (fetch, normalize, assemble, publish); the scheduler
/// only cares whether the pass succeeded.
pub type PollOperation =
    Arc<dyn Fn() -> BoxFuture<'static, Result<(), AggregationError>> + Send + Sync>;

/// Cancellation handle for one section's poll loop.
///
/// `cancel` is idempotent: the first call stops all pending timers and
/// aborts any in-flight fetch; later calls are no-ops.
#[derive(Clone)]
pub struct PollHandle {
    cancelled: Arc<AtomicBool>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl PollHandle {
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            if let Ok(mut guard) = self.task.lock() {
                if let Some(handle) = guard.take() {
                    handle.abort();
                }
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Governs poll loops for all registered sections, at most one active
/// timer per section id.
pub struct PollScheduler {
    active: Arc<Mutex<FxHashMap<String, PollHandle>>>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self {
            active: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// Start polling for a section, replacing (and cancelling) any prior
    /// schedule under the same id.
    pub fn schedule(
        &self,
        section_id: &str,
        op: PollOperation,
        policy: PollPolicy,
        state: SharedFailureState,
    ) -> PollHandle {
        let handle = spawn_poll_loop(section_id.to_string(), op, policy, state);
        let prior = self
            .active
            .lock()
            .unwrap()
            .insert(section_id.to_string(), handle.clone());
        if let Some(prior) = prior {
            debug!(section = %section_id, "replacing prior poll schedule");
            prior.cancel();
        }
        handle
    }

    /// Cancel the active schedule for one section, if any.
    pub fn cancel(&self, section_id: &str) -> bool {
        match self.active.lock().unwrap().remove(section_id) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every active schedule (dashboard teardown).
    pub fn cancel_all(&self) {
        let drained: Vec<PollHandle> = self.active.lock().unwrap().drain().map(|(_, h)| h).collect();
        for handle in drained {
            handle.cancel();
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// The poll loop: immediate first fetch; steady interval on success;
/// bounded backoff on failure; terminal failure once retries exhaust.
///
/// With `max_retries = N`, a permanently failing operation runs exactly
/// `N + 1` times before the loop parks in terminal failure.
fn spawn_poll_loop(
    section_id: String,
    op: PollOperation,
    policy: PollPolicy,
    state: SharedFailureState,
) -> PollHandle {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);

    let task = tokio::spawn(async move {
        let mut attempts: u32 = 0;
        loop {
            if flag.load(Ordering::SeqCst) {
                break;
            }
            state.lock().unwrap().begin_attempt();

            let result = op().await;
            if flag.load(Ordering::SeqCst) {
                // Superseded mid-flight; the result is discardable.
                break;
            }

            match result {
                Ok(()) => {
                    attempts = 0;
                    state.lock().unwrap().succeed();
                    debug!(section = %section_id, interval = ?policy.interval, "poll pass ok");
                    sleep(policy.interval).await;
                }
                Err(err) => {
                    attempts += 1;
                    if attempts > policy.max_retries {
                        warn!(
                            section = %section_id,
                            attempts,
                            error = %err,
                            "retries exhausted; terminally failed until manual retry"
                        );
                        state
                            .lock()
                            .unwrap()
                            .fail_terminal(err.kind(), err.to_string(), attempts);
                        break;
                    }
                    let delay = policy.backoff.delay(attempts);
                    let retry_at = chrono::Utc::now().timestamp_millis() + delay.as_millis() as i64;
                    warn!(
                        section = %section_id,
                        attempt = attempts,
                        max_retries = policy.max_retries,
                        error = %err,
                        "fetch failed, retrying in {:?}",
                        delay
                    );
                    state
                        .lock()
                        .unwrap()
                        .fail_retrying(err.kind(), err.to_string(), attempts, retry_at);
                    sleep(delay).await;
                }
            }
        }
        debug!(section = %section_id, "poll loop stopped");
    });

    PollHandle {
        cancelled,
        task: Arc::new(Mutex::new(Some(task))),
    }
}
