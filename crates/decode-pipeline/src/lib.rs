//! Per-frame barcode decoding.
//!
//! Adapts accepted frames to the decode capability, filters and batches the
//! results, and guarantees that every frame's buffer is released exactly once
//! regardless of which path completes first.

pub mod decoder;
pub mod pipeline;
pub mod result;

pub use decoder::{BarcodeDecoder, DecoderFactory, RawBarcode, ScriptedDecoder, ScriptedFactory};
pub use pipeline::DecodePipeline;
pub use result::{CornerPoint, DetectionResult};

use thiserror::Error;

/// Decode capability error types
#[derive(Error, Debug, Clone)]
pub enum DecodeError {
    #[error("failed to construct decoder: {0}")]
    Construction(String),

    #[error("decode capability unavailable: {0}")]
    Unavailable(String),

    #[error("decode failed: {0}")]
    Decode(String),
}
