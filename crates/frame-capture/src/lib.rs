//! Camera frame acquisition layer for the barcode scanning pipeline.
//!
//! Provides:
//! - `Frame` and the fixed `BufferPool` the capture side recycles
//! - `FrameSource` / `CameraControl` capability traits
//! - rotation correction arithmetic
//! - a scriptable `MockCamera` for tests and demos

pub mod buffer;
pub mod control;
pub mod frame;
pub mod mock;
pub mod source;

pub use buffer::{BufferPool, PixelBuffer};
pub use control::{CameraControl, FocusAction, MeteringPoint};
pub use frame::{corrected_rotation, Frame, LumaImage, PixelFormat, Rotation};
pub use mock::{FrameEmitter, MockCamera, MockControl};
pub use source::{CaptureConfig, FrameSink, FrameSource, Resolution};

use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("failed to open camera: {0}")]
    Open(String),

    #[error("invalid frame format: {0}")]
    Format(String),

    #[error("pixel buffer unavailable")]
    Buffer,

    #[error("streaming error: {0}")]
    Stream(String),

    #[error("camera control failed: {0}")]
    Control(String),

    #[error("camera not initialized")]
    NotInitialized,
}
