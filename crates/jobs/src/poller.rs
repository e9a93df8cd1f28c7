//! Progress poller for long-running register jobs.
//!
//! [`JobPoller`] owns one job at a time and walks it through
//!
//! ```text
//! Idle -> Started -> Polling -> { Completed | Cancelled | Failed } -> Idle
//! ```
//!
//! Starting a job calls the start endpoint, polls once right away so the
//! first render shows real counters, then arms a repeating timer. The job
//! ends when a report says `finished`, when `total` or `processed` is the
//! `-1` sentinel, when the user cancels, or when a call fails. Completion
//! and failure both refresh the affected list; failures are also published
//! on the [`AlertBus`].
//!
//! At most one timer is armed per poller. Dropping the poller cancels it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use logibooks_core::types::DbId;
use logibooks_core::{JobHandle, JobOperation, PollingJob};
use tokio::sync::{watch, Mutex};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::alerts::{Alert, AlertBus};
use crate::api::{JobApi, ListRefresher};

/// Interval between progress polls unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// What a single poll did to the job.
enum PollOutcome {
    /// Still running; keep polling.
    Running,
    /// Completed or failed; the job is back to idle.
    Ended,
    /// The job polled is no longer the current one.
    Superseded,
}

/// The currently armed repeating timer.
struct ArmedTimer {
    id: u64,
    token: CancellationToken,
}

struct PollerInner {
    api: Arc<dyn JobApi>,
    refresher: Arc<dyn ListRefresher>,
    alerts: Arc<AlertBus>,
    interval: Duration,
    state: watch::Sender<PollingJob>,
    timer: Mutex<Option<ArmedTimer>>,
    next_timer_id: AtomicU64,
    /// Parent of every timer token; cancelled when the poller is dropped.
    master: CancellationToken,
}

/// Drives one register job at a time.
///
/// Create one poller per register view; pollers share nothing with each
/// other.
pub struct JobPoller {
    inner: Arc<PollerInner>,
}

impl JobPoller {
    pub fn new(
        api: Arc<dyn JobApi>,
        refresher: Arc<dyn ListRefresher>,
        alerts: Arc<AlertBus>,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(PollingJob::default());
        Self {
            inner: Arc::new(PollerInner {
                api,
                refresher,
                alerts,
                interval,
                state,
                timer: Mutex::new(None),
                next_timer_id: AtomicU64::new(0),
                master: CancellationToken::new(),
            }),
        }
    }

    /// Current job state.
    pub fn snapshot(&self) -> PollingJob {
        self.inner.state.borrow().clone()
    }

    /// Follow job state changes, e.g. to redraw a progress bar.
    pub fn subscribe(&self) -> watch::Receiver<PollingJob> {
        self.inner.state.subscribe()
    }

    /// Start a job for `register_id` and begin polling it.
    ///
    /// Any timer left from a previous job is stopped first. Returns the
    /// server handle, or `None` if the start call failed (the failure is
    /// published as an alert).
    pub async fn start(&self, register_id: DbId, operation: JobOperation) -> Option<JobHandle> {
        self.stop().await;

        let handle = match self.inner.api.start(register_id, operation).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(register_id, %operation, error = %e, "Failed to start job");
                self.inner.fail(register_id, operation, e.to_string());
                return None;
            }
        };

        tracing::info!(register_id, %operation, handle = %handle, "Job started");
        self.inner
            .state
            .send_replace(PollingJob::started(register_id, handle.clone(), operation));

        if let PollOutcome::Running = self.inner.poll_once(register_id, operation, &handle).await {
            self.inner.arm(register_id, operation, handle.clone()).await;
        }

        Some(handle)
    }

    /// Cancel the current job.
    ///
    /// The progress view is hidden and the timer stopped right away; the
    /// server is notified in the background and a failed notification is
    /// only logged. Does nothing when no job is active.
    pub async fn cancel(&self) {
        let job = self.snapshot();
        let (Some(handle), Some(operation)) = (job.handle, job.operation) else {
            return;
        };

        self.inner.state.send_modify(PollingJob::finish);
        self.stop().await;

        tracing::info!(%operation, handle = %handle, "Cancelling job");
        let api = Arc::clone(&self.inner.api);
        tokio::spawn(async move {
            if let Err(e) = api.cancel(operation, &handle).await {
                tracing::warn!(%operation, handle = %handle, error = %e, "Cancel request failed");
            }
        });
    }

    /// Stop the repeating timer without touching job state.
    pub async fn stop(&self) {
        self.inner.disarm(None).await;
    }

    /// Whether a repeating timer is currently armed.
    pub async fn is_running(&self) -> bool {
        self.inner
            .timer
            .lock()
            .await
            .as_ref()
            .is_some_and(|timer| !timer.token.is_cancelled())
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        self.inner.master.cancel();
    }
}

impl PollerInner {
    /// Fetch one progress report and apply it.
    async fn poll_once(
        &self,
        register_id: DbId,
        operation: JobOperation,
        handle: &JobHandle,
    ) -> PollOutcome {
        match self.api.progress(operation, handle).await {
            Ok(progress) => {
                let mut outcome = PollOutcome::Superseded;
                self.state.send_if_modified(|job| {
                    if job.handle.as_ref() == Some(handle) {
                        job.apply(&progress);
                        if progress.is_terminal() {
                            job.finish();
                            outcome = PollOutcome::Ended;
                        } else {
                            outcome = PollOutcome::Running;
                        }
                        true
                    } else if job.handle.is_none() {
                        // Report arriving after a cancel: counters update,
                        // the view stays hidden.
                        job.apply(&progress);
                        true
                    } else {
                        false
                    }
                });

                match outcome {
                    PollOutcome::Running => {
                        tracing::debug!(
                            %operation,
                            handle = %handle,
                            total = progress.total,
                            processed = progress.processed,
                            "Job progress",
                        );
                    }
                    PollOutcome::Ended => {
                        tracing::info!(
                            register_id,
                            %operation,
                            handle = %handle,
                            total = progress.total,
                            processed = progress.processed,
                            finished = progress.finished,
                            "Job completed",
                        );
                        self.spawn_refresh(register_id, operation);
                    }
                    PollOutcome::Superseded => {
                        tracing::debug!(%operation, handle = %handle, "Ignoring report for superseded job");
                    }
                }
                outcome
            }
            Err(e) => {
                let current = self.state.send_if_modified(|job| {
                    if job.handle.as_ref() == Some(handle) {
                        job.finish();
                        true
                    } else {
                        false
                    }
                });

                if !current {
                    tracing::debug!(%operation, handle = %handle, error = %e, "Ignoring error for superseded job");
                    return PollOutcome::Superseded;
                }

                tracing::error!(register_id, %operation, handle = %handle, error = %e, "Job polling failed");
                self.alerts
                    .publish(Alert::new(e.to_string()).with_operation(operation.name()));
                self.spawn_refresh(register_id, operation);
                PollOutcome::Ended
            }
        }
    }

    /// Report a start failure: alert, hide the view, refresh the list.
    fn fail(&self, register_id: DbId, operation: JobOperation, message: String) {
        self.state.send_modify(PollingJob::finish);
        self.alerts
            .publish(Alert::new(message).with_operation(operation.name()));
        self.spawn_refresh(register_id, operation);
    }

    fn spawn_refresh(&self, register_id: DbId, operation: JobOperation) {
        let refresher = Arc::clone(&self.refresher);
        tokio::spawn(async move {
            if let Err(e) = refresher.refresh(register_id, operation).await {
                tracing::warn!(register_id, %operation, error = %e, "List refresh failed");
            }
        });
    }

    /// Arm the repeating timer for `handle`, replacing any armed one.
    async fn arm(self: &Arc<Self>, register_id: DbId, operation: JobOperation, handle: JobHandle) {
        let id = self.next_timer_id.fetch_add(1, Ordering::Relaxed);
        let token = self.master.child_token();

        {
            let mut slot = self.timer.lock().await;
            // Cancelled while the first poll was in flight.
            let still_current = self.state.borrow().handle.as_ref() == Some(&handle);
            if !still_current {
                return;
            }
            if let Some(previous) = slot.replace(ArmedTimer {
                id,
                token: token.clone(),
            }) {
                previous.token.cancel();
            }
        }

        tracing::debug!(%operation, handle = %handle, timer_id = id, "Polling timer armed");

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner
                .run_timer(id, token, register_id, operation, handle)
                .await;
        });
    }

    async fn run_timer(
        self: Arc<Self>,
        id: u64,
        token: CancellationToken,
        register_id: DbId,
        operation: JobOperation,
        handle: JobHandle,
    ) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let current = self.state.borrow().handle.as_ref() == Some(&handle);
                    if !current {
                        break;
                    }
                    match self.poll_once(register_id, operation, &handle).await {
                        PollOutcome::Running => {}
                        PollOutcome::Ended | PollOutcome::Superseded => break,
                    }
                }
            }
        }

        self.disarm(Some(id)).await;
        tracing::debug!(%operation, handle = %handle, timer_id = id, "Polling timer stopped");
    }

    /// Cancel and clear the armed timer. With `only`, the timer is cleared
    /// only if it is the one with that id.
    async fn disarm(&self, only: Option<u64>) {
        let mut slot = self.timer.lock().await;
        let matches = match (slot.as_ref(), only) {
            (Some(timer), Some(id)) => timer.id == id,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if matches {
            if let Some(timer) = slot.take() {
                timer.token.cancel();
            }
        }
    }
}
