//! Frame-rate coalescing of snapshot deliveries.
//!
//! Renderers only need the latest state once per frame. The coalescer keeps a
//! single pending snapshot (last-intent-wins) and a timer armed by the first
//! `schedule` of each window; when the timer fires the newest pending snapshot
//! is handed to the sink.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::models::Snapshot;

/// Default frame window, roughly one 60 Hz display refresh.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Consumer of coalesced snapshots.
pub type SnapshotSink = Arc<dyn Fn(Snapshot) + Send + Sync>;

#[derive(Debug, Default)]
struct CoalescerState {
    /// Newest snapshot not yet delivered
    pending: Option<Snapshot>,
    /// Whether a frame timer is currently waiting
    timer_armed: bool,
    /// Set by `cancel` and `flush_with`; nothing is delivered afterwards
    closed: bool,
}

fn lock(state: &Mutex<CoalescerState>) -> MutexGuard<'_, CoalescerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Throttles snapshot deliveries to at most one per frame window.
///
/// Deliveries happen under the state lock, so the sink never sees two
/// snapshots concurrently or out of order. Dropping the coalescer cancels any
/// pending delivery.
pub struct FrameCoalescer {
    state: Arc<Mutex<CoalescerState>>,
    sink: SnapshotSink,
    frame_interval: Duration,
    timer: Option<JoinHandle<()>>,
}

impl FrameCoalescer {
    /// Create a coalescer delivering to `sink` at most once per `frame_interval`.
    pub fn new(frame_interval: Duration, sink: SnapshotSink) -> Self {
        Self {
            state: Arc::new(Mutex::new(CoalescerState::default())),
            sink,
            frame_interval,
            timer: None,
        }
    }

    /// Frame window length.
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Whether a snapshot is waiting for the next frame.
    pub fn has_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    /// Queue a snapshot for the next frame, replacing any queued one.
    pub fn schedule(&mut self, snapshot: Snapshot) {
        let should_arm = {
            let mut state = lock(&self.state);
            if state.closed {
                return;
            }
            state.pending = Some(snapshot);

            if state.timer_armed {
                false
            } else {
                state.timer_armed = true;
                true
            }
        };

        if should_arm {
            self.arm_timer();
        }
    }

    /// Deliver the queued snapshot now, if there is one.
    pub fn flush(&mut self) {
        self.abort_timer();

        let mut state = lock(&self.state);
        state.timer_armed = false;
        if state.closed {
            return;
        }
        if let Some(snapshot) = state.pending.take() {
            (self.sink)(snapshot);
        }
    }

    /// Replace whatever is queued with `snapshot`, deliver it now and close.
    ///
    /// Used for the final state of a stream: nothing reaches the sink after it.
    pub fn flush_with(&mut self, snapshot: Snapshot) {
        self.abort_timer();

        let mut state = lock(&self.state);
        state.timer_armed = false;
        if state.closed {
            return;
        }
        state.pending = None;
        state.closed = true;
        (self.sink)(snapshot);
    }

    /// Drop any queued snapshot; the sink is not invoked again.
    pub fn cancel(&mut self) {
        self.abort_timer();

        let mut state = lock(&self.state);
        if state.pending.is_some() {
            tracing::trace!("Dropping pending frame delivery");
        }
        state.pending = None;
        state.timer_armed = false;
        state.closed = true;
    }

    fn arm_timer(&mut self) {
        // Guard: without a runtime there is no frame clock, deliver immediately
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            let mut state = lock(&self.state);
            state.timer_armed = false;
            if let Some(snapshot) = state.pending.take() {
                (self.sink)(snapshot);
            }
            return;
        };

        let state = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);
        let frame_interval = self.frame_interval;

        self.timer = Some(handle.spawn(async move {
            tokio::time::sleep(frame_interval).await;

            let mut state = lock(&state);
            state.timer_armed = false;
            if state.closed {
                return;
            }
            if let Some(snapshot) = state.pending.take() {
                sink(snapshot);
            }
        }));
    }

    fn abort_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for FrameCoalescer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for FrameCoalescer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCoalescer")
            .field("frame_interval", &self.frame_interval)
            .field("state", &*lock(&self.state))
            .finish()
    }
}
