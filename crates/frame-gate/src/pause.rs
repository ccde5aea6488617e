//! Post-detection suppression and explicit pause state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

/// Default suppression window after a successful detection.
pub const DEFAULT_SUPPRESS_WINDOW_MS: u64 = 1000;

/// Whether frames are currently admitted to analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Running,
    /// A barcode was just reported; skip analysis until the window elapses so
    /// a code still in frame is not reported on every accepted frame.
    SuppressedAfterDetection,
    ExplicitlyPaused,
}

#[derive(Debug)]
struct PauseInner {
    state: ScanState,
    /// Bumped on every transition; a pending auto-revert only applies if the
    /// generation it captured is still current.
    generation: u64,
}

/// State machine gating the frame path.
///
/// `notify_detection` arms a one-shot auto-revert timer on the current tokio
/// runtime; `pause`/`resume` invalidate it via the generation counter, so at
/// most one pending revert is ever live and a stale one never overrides a
/// later transition.
#[derive(Debug)]
pub struct PauseController {
    suppress_window: Duration,
    inner: Mutex<PauseInner>,
}

impl PauseController {
    pub fn new(suppress_window: Duration) -> Self {
        Self {
            suppress_window,
            inner: Mutex::new(PauseInner {
                state: ScanState::Running,
                generation: 0,
            }),
        }
    }

    pub fn state(&self) -> ScanState {
        self.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == ScanState::Running
    }

    pub fn is_explicitly_paused(&self) -> bool {
        self.state() == ScanState::ExplicitlyPaused
    }

    /// A detection was reported; suppress analysis for the window.
    ///
    /// Must be called from within a tokio runtime. No-op while explicitly
    /// paused. A repeat detection re-arms the window.
    pub fn notify_detection(self: &Arc<Self>) {
        let generation = {
            let mut inner = self.lock();
            if inner.state == ScanState::ExplicitlyPaused {
                return;
            }
            inner.state = ScanState::SuppressedAfterDetection;
            inner.generation += 1;
            inner.generation
        };

        let controller = Arc::clone(self);
        let window = self.suppress_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let mut inner = controller.lock();
            if inner.generation == generation
                && inner.state == ScanState::SuppressedAfterDetection
            {
                debug!("suppression window elapsed, resuming analysis");
                inner.state = ScanState::Running;
            }
        });
    }

    /// Caller-requested pause; sticks until `resume`, even if a suppression
    /// window expires in the meantime.
    pub fn pause(&self) {
        let mut inner = self.lock();
        inner.state = ScanState::ExplicitlyPaused;
        inner.generation += 1;
    }

    /// Return to `Running` from any state, cancelling any pending revert.
    pub fn resume(&self) {
        let mut inner = self.lock();
        inner.state = ScanState::Running;
        inner.generation += 1;
    }

    fn lock(&self) -> MutexGuard<'_, PauseInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PauseController {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_SUPPRESS_WINDOW_MS))
    }
}
