//! Frame admission control.
//!
//! Two gates sit between the capture callback and the decode pool:
//! - [`FrameThrottle`] bounds the analysis rate, dropping excess frames
//!   instead of queuing them
//! - [`PauseController`] suppresses analysis for a window after each
//!   detection and while the caller has paused the session
//!
//! Both run inline on the capture thread and are O(1), non-blocking.

pub mod pause;
pub mod throttle;

pub use pause::{PauseController, ScanState, DEFAULT_SUPPRESS_WINDOW_MS};
pub use throttle::{should_accept, FrameThrottle, DEFAULT_MIN_INTERVAL_MS};
