//! Wire-facing scanner options.

use std::collections::BTreeSet;

use frame_capture::Resolution;
use serde::{Deserialize, Serialize};

use crate::format::{resolve_formats, BarcodeFormat};

/// Named capture quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Max,
    High,
    Medium,
    Low,
    /// Unknown quality strings behave like the default tier.
    #[serde(other)]
    Unspecified,
}

/// Decode configuration as supplied by the caller.
///
/// All fields are optional on the wire; an absent/empty `formats` list means
/// "all symbologies", and an explicit `resolution` overrides `quality`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub formats: Vec<String>,
    pub resolution: Option<Resolution>,
    pub quality: Option<Quality>,
}

impl ScanOptions {
    /// Concrete symbology set for the decoder; never empty.
    pub fn resolved_formats(&self) -> BTreeSet<BarcodeFormat> {
        resolve_formats(&self.formats)
    }

    /// Resolution precedence: explicit size, then quality tier, then the
    /// device-optimal default.
    pub fn resolution_request(&self) -> ResolutionRequest {
        if let Some(resolution) = self.resolution {
            ResolutionRequest::Explicit(resolution)
        } else if let Some(quality) = self.quality {
            ResolutionRequest::Quality(quality)
        } else {
            ResolutionRequest::Auto
        }
    }
}

/// Resolved form of the caller's resolution preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionRequest {
    Explicit(Resolution),
    Quality(Quality),
    Auto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_auto_and_all_formats() {
        let options = ScanOptions::default();
        assert_eq!(options.resolution_request(), ResolutionRequest::Auto);
        assert_eq!(options.resolved_formats().len(), 13);
    }

    #[test]
    fn explicit_resolution_beats_quality() {
        let options = ScanOptions {
            resolution: Some(Resolution::new(800, 600)),
            quality: Some(Quality::Max),
            ..Default::default()
        };
        assert_eq!(
            options.resolution_request(),
            ResolutionRequest::Explicit(Resolution::new(800, 600))
        );
    }

    #[test]
    fn parses_the_wire_shape() {
        let options: ScanOptions = serde_json::from_str(
            r#"{"formats": ["ean13", "qrCode"], "resolution": {"width": 1920, "height": 1080}}"#,
        )
        .unwrap();
        assert_eq!(options.formats.len(), 2);
        assert_eq!(options.resolution, Some(Resolution::new(1920, 1080)));
        assert_eq!(options.quality, None);
    }

    #[test]
    fn unknown_quality_becomes_unspecified() {
        let options: ScanOptions =
            serde_json::from_str(r#"{"quality": "ultra"}"#).unwrap();
        assert_eq!(options.quality, Some(Quality::Unspecified));
    }

    #[test]
    fn quality_names_parse_lowercase() {
        let options: ScanOptions = serde_json::from_str(r#"{"quality": "max"}"#).unwrap();
        assert_eq!(options.quality, Some(Quality::Max));
        assert_eq!(
            options.resolution_request(),
            ResolutionRequest::Quality(Quality::Max)
        );
    }
}
