//! Barcode symbology names and format-set resolution.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Supported barcode symbologies, named as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BarcodeFormat {
    // 1D
    Code128,
    Code39,
    Code93,
    Codabar,
    Ean13,
    Ean8,
    Itf,
    UpcA,
    UpcE,
    // 2D
    QrCode,
    DataMatrix,
    Pdf417,
    Aztec,
    /// Reported by the decoder for symbologies outside the known set.
    Unknown,
}

impl BarcodeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeFormat::Code128 => "code128",
            BarcodeFormat::Code39 => "code39",
            BarcodeFormat::Code93 => "code93",
            BarcodeFormat::Codabar => "codabar",
            BarcodeFormat::Ean13 => "ean13",
            BarcodeFormat::Ean8 => "ean8",
            BarcodeFormat::Itf => "itf",
            BarcodeFormat::UpcA => "upcA",
            BarcodeFormat::UpcE => "upcE",
            BarcodeFormat::QrCode => "qrCode",
            BarcodeFormat::DataMatrix => "dataMatrix",
            BarcodeFormat::Pdf417 => "pdf417",
            BarcodeFormat::Aztec => "aztec",
            BarcodeFormat::Unknown => "unknown",
        }
    }

    fn parse(name: &str) -> Option<BarcodeFormat> {
        match name {
            "code128" => Some(BarcodeFormat::Code128),
            "code39" => Some(BarcodeFormat::Code39),
            "code93" => Some(BarcodeFormat::Code93),
            "codabar" => Some(BarcodeFormat::Codabar),
            "ean13" => Some(BarcodeFormat::Ean13),
            "ean8" => Some(BarcodeFormat::Ean8),
            "itf" => Some(BarcodeFormat::Itf),
            "upcA" => Some(BarcodeFormat::UpcA),
            "upcE" => Some(BarcodeFormat::UpcE),
            "qrCode" => Some(BarcodeFormat::QrCode),
            "dataMatrix" => Some(BarcodeFormat::DataMatrix),
            "pdf417" => Some(BarcodeFormat::Pdf417),
            "aztec" => Some(BarcodeFormat::Aztec),
            _ => None,
        }
    }

    pub fn one_dimensional() -> [BarcodeFormat; 9] {
        [
            BarcodeFormat::Code128,
            BarcodeFormat::Code39,
            BarcodeFormat::Code93,
            BarcodeFormat::Codabar,
            BarcodeFormat::Ean13,
            BarcodeFormat::Ean8,
            BarcodeFormat::Itf,
            BarcodeFormat::UpcA,
            BarcodeFormat::UpcE,
        ]
    }

    pub fn two_dimensional() -> [BarcodeFormat; 4] {
        [
            BarcodeFormat::QrCode,
            BarcodeFormat::DataMatrix,
            BarcodeFormat::Pdf417,
            BarcodeFormat::Aztec,
        ]
    }

    /// Every concrete symbology (`Unknown` excluded).
    pub fn all() -> BTreeSet<BarcodeFormat> {
        Self::one_dimensional()
            .into_iter()
            .chain(Self::two_dimensional())
            .collect()
    }
}

/// One requested format name: either a concrete symbology or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSelector {
    Single(BarcodeFormat),
    All,
    All1d,
    All2d,
}

impl FormatSelector {
    pub fn parse(name: &str) -> Option<FormatSelector> {
        match name {
            // "auto" lets the decoder pick, which means enabling everything.
            "all" | "auto" => Some(FormatSelector::All),
            "all1D" => Some(FormatSelector::All1d),
            "all2D" => Some(FormatSelector::All2d),
            other => BarcodeFormat::parse(other).map(FormatSelector::Single),
        }
    }
}

/// Resolve requested format names to the concrete set handed to the decoder.
///
/// An empty request, or one containing nothing recognizable, resolves to all
/// symbologies; the returned set is never empty.
pub fn resolve_formats(names: &[String]) -> BTreeSet<BarcodeFormat> {
    if names.is_empty() {
        return BarcodeFormat::all();
    }

    let mut set = BTreeSet::new();
    for name in names {
        match FormatSelector::parse(name) {
            Some(FormatSelector::All) => return BarcodeFormat::all(),
            Some(FormatSelector::All1d) => set.extend(BarcodeFormat::one_dimensional()),
            Some(FormatSelector::All2d) => set.extend(BarcodeFormat::two_dimensional()),
            Some(FormatSelector::Single(format)) => {
                set.insert(format);
            }
            None => warn!(format = %name, "ignoring unknown barcode format name"),
        }
    }

    if set.is_empty() {
        BarcodeFormat::all()
    } else {
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_request_enables_everything() {
        let set = resolve_formats(&[]);
        assert_eq!(set.len(), 13);
        assert!(set.contains(&BarcodeFormat::QrCode));
        assert!(!set.contains(&BarcodeFormat::Unknown));
    }

    #[test]
    fn concrete_names_resolve_exactly() {
        let set = resolve_formats(&names(&["ean13", "qrCode"]));
        assert_eq!(
            set.into_iter().collect::<Vec<_>>(),
            vec![BarcodeFormat::Ean13, BarcodeFormat::QrCode]
        );
    }

    #[test]
    fn groups_expand() {
        assert_eq!(resolve_formats(&names(&["all1D"])).len(), 9);
        assert_eq!(resolve_formats(&names(&["all2D"])).len(), 4);
        assert_eq!(resolve_formats(&names(&["all1D", "all2D"])).len(), 13);
    }

    #[test]
    fn all_short_circuits() {
        let set = resolve_formats(&names(&["all", "ean13"]));
        assert_eq!(set.len(), 13);
    }

    #[test]
    fn unknown_only_falls_back_to_everything() {
        let set = resolve_formats(&names(&["telepathy", "morse"]));
        assert_eq!(set.len(), 13);
    }

    #[test]
    fn unknown_mixed_with_known_is_ignored() {
        let set = resolve_formats(&names(&["telepathy", "aztec"]));
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![BarcodeFormat::Aztec]);
    }

    #[test]
    fn wire_names_round_trip() {
        for format in BarcodeFormat::all() {
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json, format!("\"{}\"", format.as_str()));
            let parsed: BarcodeFormat = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, format);
        }
    }
}
