//! Periodic and on-demand focus metering.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use frame_capture::{CameraControl, FocusAction};
use frame_gate::PauseController;

use crate::FocusError;

/// Timing knobs for the focus schedule.
#[derive(Debug, Clone)]
pub struct FocusConfig {
    /// Auto-cancel for the wide initial sweep issued right after start.
    pub initial_auto_cancel: Duration,
    /// Spacing between periodic center-focus nudges.
    pub periodic_interval: Duration,
    /// Auto-cancel for each periodic nudge; shorter than the interval so an
    /// action never outlives its slot.
    pub periodic_auto_cancel: Duration,
    /// Auto-cancel for a caller-requested tap-to-focus.
    pub touch_auto_cancel: Duration,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            initial_auto_cancel: Duration::from_secs(3),
            periodic_interval: Duration::from_millis(2500),
            periodic_auto_cancel: Duration::from_secs(2),
            touch_auto_cancel: Duration::from_secs(5),
        }
    }
}

/// Drives the camera's focus actuator on a schedule.
///
/// Owns at most one periodic task; restarting replaces it and `stop` aborts
/// it. Periodic nudges are skipped while scanning is paused or suppressed so
/// the actuator is not disturbed when no frames are being analyzed.
pub struct FocusScheduler {
    control: Arc<dyn CameraControl>,
    pause: Arc<PauseController>,
    config: FocusConfig,
    periodic: Mutex<Option<JoinHandle<()>>>,
}

impl FocusScheduler {
    pub fn new(
        control: Arc<dyn CameraControl>,
        pause: Arc<PauseController>,
        config: FocusConfig,
    ) -> Self {
        Self {
            control,
            pause,
            config,
            periodic: Mutex::new(None),
        }
    }

    /// Wide five-point sweep over the center region, issued once right after
    /// the camera starts to pull focus off infinity quickly.
    pub fn trigger_center_region(&self) -> Result<(), FocusError> {
        self.control
            .start_focus_metering(FocusAction::wide_center(self.config.initial_auto_cancel))?;
        Ok(())
    }

    /// Start (or restart) the periodic center-focus loop on the current
    /// tokio runtime.
    pub fn start_periodic(self: &Arc<Self>) {
        let scheduler = Arc::clone(self);
        let interval = self.config.periodic_interval;
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if !scheduler.pause.is_running() {
                    debug!("scanning inactive, skipping periodic focus");
                    continue;
                }
                let action = FocusAction::center(scheduler.config.periodic_auto_cancel);
                if let Err(e) = scheduler.control.start_focus_metering(action) {
                    warn!("periodic focus metering failed: {e}");
                }
            }
        });

        if let Some(previous) = self.set_periodic(Some(handle)) {
            previous.abort();
        }
    }

    /// Tap-to-focus at a normalized coordinate.
    ///
    /// Coordinates must be finite and within `[0, 1]` on both axes.
    pub fn trigger_at(&self, x: f32, y: f32) -> Result<(), FocusError> {
        if !valid_coordinate(x) || !valid_coordinate(y) {
            return Err(FocusError::InvalidCoordinate { x, y });
        }
        self.control
            .start_focus_metering(FocusAction::at(x, y, self.config.touch_auto_cancel))?;
        Ok(())
    }

    /// Abort the periodic loop and cancel any active metering action.
    pub fn stop(&self) {
        if let Some(handle) = self.set_periodic(None) {
            handle.abort();
        }
        if let Err(e) = self.control.cancel_focus_metering() {
            warn!("cancelling focus metering failed: {e}");
        }
    }

    fn set_periodic(&self, handle: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        std::mem::replace(
            &mut self
                .periodic
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
            handle,
        )
    }
}

impl Drop for FocusScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.set_periodic(None) {
            handle.abort();
        }
    }
}

fn valid_coordinate(v: f32) -> bool {
    v.is_finite() && (0.0..=1.0).contains(&v)
}
