//! The opaque barcode decode capability.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use frame_capture::{LumaImage, Rotation};
use scan_config::BarcodeFormat;

use crate::result::CornerPoint;
use crate::DecodeError;

/// One barcode as reported by the decode capability, before filtering.
#[derive(Debug, Clone)]
pub struct RawBarcode {
    /// May be absent or empty; such entries never reach the caller.
    pub value: Option<String>,
    pub format: BarcodeFormat,
    pub corner_points: Vec<CornerPoint>,
}

/// External barcode-recognition engine: given an image and a rotation hint,
/// returns zero or more decoded results or fails. Implementations may be
/// invoked concurrently from the analysis pool.
pub trait BarcodeDecoder: Send + Sync {
    fn decode(&self, image: &LumaImage, rotation: Rotation) -> Result<Vec<RawBarcode>, DecodeError>;
}

/// Builds decoder instances for a resolved symbology set.
///
/// An options update replaces the decoder wholesale through this factory;
/// the old instance is never mutated in place.
pub trait DecoderFactory: Send + Sync {
    fn create(
        &self,
        formats: &BTreeSet<BarcodeFormat>,
    ) -> Result<Arc<dyn BarcodeDecoder>, DecodeError>;
}

/// Scriptable decoder for tests and demos.
pub struct ScriptedDecoder {
    responses: Mutex<VecDeque<Result<Vec<RawBarcode>, DecodeError>>>,
    repeat: Option<Vec<RawBarcode>>,
    calls: AtomicUsize,
}

impl ScriptedDecoder {
    /// Always decodes nothing.
    pub fn empty() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            repeat: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Reports the same barcodes on every call.
    pub fn repeating(barcodes: Vec<RawBarcode>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            repeat: Some(barcodes),
            calls: AtomicUsize::new(0),
        }
    }

    /// Plays back the given responses in order, then decodes nothing.
    pub fn with_responses(responses: Vec<Result<Vec<RawBarcode>, DecodeError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeat: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BarcodeDecoder for ScriptedDecoder {
    fn decode(
        &self,
        _image: &LumaImage,
        _rotation: Rotation,
    ) -> Result<Vec<RawBarcode>, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match scripted {
            Some(response) => response,
            None => Ok(self.repeat.clone().unwrap_or_default()),
        }
    }
}

/// Factory that hands out a fixed decoder and records what it was asked for.
pub struct ScriptedFactory {
    decoder: Arc<dyn BarcodeDecoder>,
    fail: AtomicBool,
    created: AtomicUsize,
    last_formats: Mutex<Option<BTreeSet<BarcodeFormat>>>,
}

impl ScriptedFactory {
    pub fn new(decoder: Arc<dyn BarcodeDecoder>) -> Self {
        Self {
            decoder,
            fail: AtomicBool::new(false),
            created: AtomicUsize::new(0),
            last_formats: Mutex::new(None),
        }
    }

    /// Make subsequent `create` calls fail, for initialization-error paths.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Format set from the most recent `create` call.
    pub fn last_formats(&self) -> Option<BTreeSet<BarcodeFormat>> {
        self.last_formats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DecoderFactory for ScriptedFactory {
    fn create(
        &self,
        formats: &BTreeSet<BarcodeFormat>,
    ) -> Result<Arc<dyn BarcodeDecoder>, DecodeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DecodeError::Construction("scripted factory failure".into()));
        }
        *self
            .last_formats
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(formats.clone());
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.decoder))
    }
}
