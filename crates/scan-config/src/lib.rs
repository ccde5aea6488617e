//! Decode configuration and capture resolution policy.
//!
//! Everything here is pure: format-name resolution, option parsing, and the
//! resolution selector depend only on their inputs, never on live hardware
//! state.

pub mod format;
pub mod options;
pub mod resolution;

pub use format::{resolve_formats, BarcodeFormat, FormatSelector};
pub use options::{Quality, ResolutionRequest, ScanOptions};
pub use resolution::{
    select_resolution, DeviceCapabilities, DisplayMetrics, DisplayOrientation, FALLBACK_RESOLUTION,
};
