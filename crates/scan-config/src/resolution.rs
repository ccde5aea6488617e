//! Capture resolution selection policy.

use frame_capture::Resolution;

use crate::options::{Quality, ResolutionRequest};

/// Used whenever a request cannot be honored; scanning at HD is a safe
/// default on every device tier.
pub const FALLBACK_RESOLUTION: Resolution = Resolution::new(1280, 720);

const MAX_CAP: Resolution = Resolution::new(1920, 1080);

/// Current display orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOrientation {
    Portrait,
    Landscape,
}

/// Display pixel dimensions and orientation at session bind time.
#[derive(Debug, Clone, Copy)]
pub struct DisplayMetrics {
    pub width_px: u32,
    pub height_px: u32,
    pub orientation: DisplayOrientation,
}

/// Everything the selector needs to know about the device.
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    pub display: DisplayMetrics,
    /// Analysis output sizes reported by the camera hardware.
    pub supported: Vec<Resolution>,
}

/// Map a resolution request to a concrete capture resolution.
///
/// Pure and total: identical inputs give identical outputs, and every input
/// maps to some resolution.
pub fn select_resolution(request: ResolutionRequest, caps: &DeviceCapabilities) -> Resolution {
    match request {
        ResolutionRequest::Explicit(resolution) => {
            if resolution.width > 0 && resolution.height > 0 {
                resolution
            } else {
                FALLBACK_RESOLUTION
            }
        }
        ResolutionRequest::Quality(quality) => match quality {
            Quality::Max => best_supported(&caps.supported),
            Quality::High => MAX_CAP,
            Quality::Medium | Quality::Unspecified => FALLBACK_RESOLUTION,
            Quality::Low => Resolution::new(640, 480),
        },
        ResolutionRequest::Auto => optimal_for_display(caps.display),
    }
}

/// Largest hardware-reported size that fits within 1920x1080, by pixel area.
/// Falls back to the largest reported size, then to 1080p itself.
fn best_supported(supported: &[Resolution]) -> Resolution {
    let mut sizes = supported.to_vec();
    sizes.sort_by(|a, b| b.area().cmp(&a.area()));
    sizes
        .iter()
        .copied()
        .find(|s| s.width <= MAX_CAP.width && s.height <= MAX_CAP.height)
        .or_else(|| sizes.first().copied())
        .unwrap_or(MAX_CAP)
}

/// Device-optimal default: snap to the preset nearest the display size,
/// swapped for portrait.
fn optimal_for_display(display: DisplayMetrics) -> Resolution {
    match display.orientation {
        DisplayOrientation::Portrait => {
            if display.height_px >= 1080 {
                Resolution::new(1080, 1920)
            } else if display.height_px >= 720 {
                Resolution::new(720, 1280)
            } else {
                Resolution::new(480, 640)
            }
        }
        DisplayOrientation::Landscape => {
            if display.width_px >= 1920 {
                Resolution::new(1920, 1080)
            } else if display.width_px >= 1280 {
                Resolution::new(1280, 720)
            } else {
                Resolution::new(640, 480)
            }
        }
    }
}
