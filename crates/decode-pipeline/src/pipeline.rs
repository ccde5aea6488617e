//! Frame analysis: normalize, decode, filter, batch.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use frame_capture::{corrected_rotation, Frame, Rotation};

use crate::decoder::BarcodeDecoder;
use crate::result::DetectionResult;

/// Runs one frame at a time through the decode capability.
///
/// The pipeline never holds a frame past `analyze`: the frame is consumed by
/// value and its buffer returns to the pool when the local binding drops,
/// whether decoding succeeded, failed, or never started. Results are batched
/// per frame and sent on an unbounded channel; a closed receiver only means
/// the session is tearing down and is not an error.
pub struct DecodePipeline {
    decoder: Mutex<Arc<dyn BarcodeDecoder>>,
    batches: mpsc::UnboundedSender<Vec<DetectionResult>>,
    display_rotation: Option<Rotation>,
}

impl DecodePipeline {
    pub fn new(
        decoder: Arc<dyn BarcodeDecoder>,
        batches: mpsc::UnboundedSender<Vec<DetectionResult>>,
    ) -> Self {
        Self {
            decoder: Mutex::new(decoder),
            batches,
            display_rotation: None,
        }
    }

    /// Correct frame rotations against a fixed display rotation. Without this
    /// the sensor-reported rotation is used as-is.
    pub fn with_display_rotation(mut self, display: Rotation) -> Self {
        self.display_rotation = Some(display);
        self
    }

    /// Swap in a freshly built decoder; in-flight frames finish on the old
    /// one, later frames see the new one.
    pub fn replace_decoder(&self, decoder: Arc<dyn BarcodeDecoder>) {
        *self
            .decoder
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = decoder;
    }

    /// Decode one frame and report any non-empty results.
    ///
    /// Blocking; run on the analysis pool, not the event loop.
    pub fn analyze(&self, frame: Frame) {
        if frame.buffer().is_none() {
            debug!(timestamp_ms = frame.timestamp_ms(), "frame carried no image");
            return;
        }

        let image = match frame.to_luma() {
            Ok(image) => image,
            Err(e) => {
                warn!("frame normalization failed: {e}");
                return;
            }
        };

        let rotation = match self.display_rotation {
            Some(display) => corrected_rotation(display, frame.rotation()),
            None => frame.rotation(),
        };

        let decoder = Arc::clone(
            &self
                .decoder
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        match decoder.decode(&image, rotation) {
            Ok(raw) => {
                let results: Vec<DetectionResult> = raw
                    .into_iter()
                    .filter_map(DetectionResult::from_raw)
                    .collect();
                if results.is_empty() {
                    return;
                }
                if self.batches.send(results).is_err() {
                    debug!("result channel closed, dropping batch");
                }
            }
            Err(e) => warn!("barcode decode failed: {e}"),
        }
    }
}
