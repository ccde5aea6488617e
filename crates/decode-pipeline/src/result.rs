//! Caller-visible detection results.

use scan_config::BarcodeFormat;
use serde::{Deserialize, Serialize};

use crate::decoder::RawBarcode;

/// One corner of a detected barcode, device-space pixels.
///
/// Order is decoder-defined; no winding direction is guaranteed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CornerPoint {
    pub x: i32,
    pub y: i32,
}

impl CornerPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One decoded barcode as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// Raw decoded value; never empty.
    pub value: String,
    pub format: BarcodeFormat,
    pub corner_points: Vec<CornerPoint>,
}

impl DetectionResult {
    /// Empty-valued decodes carry nothing reportable and are discarded.
    pub fn from_raw(raw: RawBarcode) -> Option<Self> {
        let value = raw.value?;
        if value.is_empty() {
            return None;
        }
        Some(Self {
            value,
            format: raw.format,
            corner_points: raw.corner_points,
        })
    }
}
