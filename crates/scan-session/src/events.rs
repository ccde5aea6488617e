//! Caller-visible session events.

use decode_pipeline::DetectionResult;
use serde::{Deserialize, Serialize};

/// Event pushed to the session's delivery channel.
///
/// Events are delivered by a single forwarder task, so a subscriber never
/// observes two events concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ScanEvent {
    /// One analyzed frame produced at least one decoded barcode.
    #[serde(rename = "onBarcodeDetected")]
    BarcodeDetected { barcodes: Vec<DetectionResult> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use decode_pipeline::CornerPoint;
    use scan_config::BarcodeFormat;

    #[test]
    fn detection_event_wire_shape() {
        let event = ScanEvent::BarcodeDetected {
            barcodes: vec![DetectionResult {
                value: "4006381333931".into(),
                format: BarcodeFormat::Ean13,
                corner_points: vec![CornerPoint::new(4, 8)],
            }],
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "onBarcodeDetected");
        assert_eq!(json["barcodes"][0]["value"], "4006381333931");
        assert_eq!(json["barcodes"][0]["format"], "ean13");
        assert_eq!(json["barcodes"][0]["cornerPoints"][0]["y"], 8);
    }
}
