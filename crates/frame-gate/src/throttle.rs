//! Analysis rate throttle.

use std::sync::atomic::{AtomicU64, Ordering};

/// Default minimum spacing between analyzed frames.
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 200;

/// Sentinel for "no frame accepted yet"; the first frame is always admitted.
const NEVER: u64 = u64::MAX;

/// Accept iff at least `min_interval_ms` elapsed since the last accepted
/// frame. Pure; the caller owns the bookkeeping.
pub fn should_accept(now_ms: u64, last_accepted_ms: u64, min_interval_ms: u64) -> bool {
    now_ms.saturating_sub(last_accepted_ms) >= min_interval_ms
}

/// Backpressure valve for the capture thread.
///
/// The decode capability can take longer than the frame-arrival interval;
/// dispatching every frame would queue unbounded in-flight decodes. Excess
/// frames are dropped rather than queued: stale detections are worthless for
/// a live scan. The admission decision and the last-accepted update happen in
/// one atomic step, so concurrent callers cannot both claim the same slot.
#[derive(Debug)]
pub struct FrameThrottle {
    min_interval_ms: u64,
    last_accepted: AtomicU64,
}

impl FrameThrottle {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_accepted: AtomicU64::new(NEVER),
        }
    }

    /// Admit or drop a frame captured at `now_ms` (monotonic milliseconds).
    pub fn admit(&self, now_ms: u64) -> bool {
        self.last_accepted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                if last == NEVER || should_accept(now_ms, last, self.min_interval_ms) {
                    Some(now_ms)
                } else {
                    None
                }
            })
            .is_ok()
    }

    /// Forget the last-accepted stamp; the next frame is admitted.
    pub fn reset(&self) {
        self.last_accepted.store(NEVER, Ordering::Release);
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    /// Timestamp of the most recently accepted frame, if any.
    pub fn last_accepted_ms(&self) -> Option<u64> {
        match self.last_accepted.load(Ordering::Acquire) {
            NEVER => None,
            value => Some(value),
        }
    }
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reference_pattern_at_200ms() {
        let throttle = FrameThrottle::new(200);
        let decisions: Vec<bool> = [0u64, 100, 250, 260, 500]
            .iter()
            .map(|&t| throttle.admit(t))
            .collect();
        assert_eq!(decisions, vec![true, false, true, false, true]);
    }

    #[test]
    fn first_frame_is_always_admitted() {
        let throttle = FrameThrottle::new(200);
        assert!(throttle.admit(0));
        assert_eq!(throttle.last_accepted_ms(), Some(0));
    }

    #[test]
    fn reset_reopens_the_gate() {
        let throttle = FrameThrottle::new(200);
        assert!(throttle.admit(1000));
        assert!(!throttle.admit(1001));
        throttle.reset();
        assert!(throttle.admit(1002));
    }

    #[test]
    fn pure_form_matches_the_contract() {
        assert!(should_accept(200, 0, 200));
        assert!(!should_accept(199, 0, 200));
        // Clock regression never underflows.
        assert!(!should_accept(0, 500, 200));
    }

    proptest! {
        /// Accepted timestamps are always at least the interval apart.
        #[test]
        fn accepted_frames_are_spaced(
            deltas in proptest::collection::vec(0u64..500, 1..64),
            interval in 1u64..400,
        ) {
            let throttle = FrameThrottle::new(interval);
            let mut now = 0u64;
            let mut accepted = Vec::new();
            for delta in deltas {
                now += delta;
                if throttle.admit(now) {
                    accepted.push(now);
                }
            }
            prop_assert!(!accepted.is_empty());
            for pair in accepted.windows(2) {
                prop_assert!(pair[1] - pair[0] >= interval);
            }
        }
    }
}
