use crate::core::barcode::{BarcodeMatch, BarcodeSpec};
use crate::core::types::{BarcodeLocation, OrientationType};
use crate::matching::matcher::find_first_match;

/// Label of the category for reads without a barcode
pub const NO_BARCODE: &str = "noBarcode";

/// How categories are named for a set of barcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationMode {
    /// One barcode, or several without known locations: `barcode_orientFR` / `RC`
    SingleBarcode,
    /// Barcodes tagged 5'/3': `barcode5_orientFR`, `barcode3_orientRC`, ...
    Located,
}

impl ClassificationMode {
    #[must_use]
    pub fn for_barcodes(barcodes: &[BarcodeSpec]) -> Self {
        if barcodes.len() == 1 || barcodes.iter().all(|b| !b.location().is_known()) {
            Self::SingleBarcode
        } else {
            Self::Located
        }
    }
}

/// Output partition a read is assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Barcode {
        location: BarcodeLocation,
        orientation: OrientationType,
    },
    NoBarcode,
}

impl Category {
    /// Category of a match under the given mode.
    ///
    /// In located mode a barcode with an unknown location falls back to the
    /// location-free name.
    #[must_use]
    pub fn for_match(barcode_match: &BarcodeMatch<'_>, mode: ClassificationMode) -> Self {
        let location = match mode {
            ClassificationMode::SingleBarcode => BarcodeLocation::Unknown,
            ClassificationMode::Located => barcode_match.barcode.location(),
        };
        Self::Barcode {
            location,
            orientation: barcode_match.orientation,
        }
    }

    #[must_use]
    pub fn is_match(self) -> bool {
        matches!(self, Self::Barcode { .. })
    }

    /// Both orientation categories for a location
    fn pair(location: BarcodeLocation) -> [Self; 2] {
        OrientationType::SEARCHED.map(|orientation| Self::Barcode {
            location,
            orientation,
        })
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Barcode {
                location,
                orientation,
            } => write!(
                f,
                "barcode{}_orient{}",
                location.category_label().unwrap_or(""),
                orientation
            ),
            Self::NoBarcode => f.write_str(NO_BARCODE),
        }
    }
}

/// Classify a read by the first barcode match in configuration order.
///
/// Each barcode is tried forward, then reverse complement; the first hit wins
/// and no later barcode or orientation is inspected, even when a later barcode
/// would match with fewer edits.
#[must_use]
pub fn classify<'a>(
    sequence: &[u8],
    barcodes: &'a [BarcodeSpec],
    max_mismatches: usize,
    mode: ClassificationMode,
) -> (Option<BarcodeMatch<'a>>, Category) {
    if sequence.is_empty() {
        return (None, Category::NoBarcode);
    }

    let sequence = sequence.to_ascii_uppercase();
    for barcode in barcodes {
        for orientation in OrientationType::SEARCHED {
            if let Some(found) = find_first_match(&sequence, barcode, orientation, max_mismatches)
            {
                let category = Category::for_match(&found, mode);
                return (Some(found), category);
            }
        }
    }

    (None, Category::NoBarcode)
}

/// Categories that get an output bucket, in output order.
#[must_use]
pub fn prepare_categories(barcodes: &[BarcodeSpec], keep_unmatched: bool) -> Vec<Category> {
    let mut categories = Vec::new();

    match ClassificationMode::for_barcodes(barcodes) {
        ClassificationMode::SingleBarcode => {
            categories.extend(Category::pair(BarcodeLocation::Unknown));
        }
        ClassificationMode::Located => {
            for barcode in barcodes.iter().filter(|b| b.location().is_known()) {
                for category in Category::pair(barcode.location()) {
                    if !categories.contains(&category) {
                        categories.push(category);
                    }
                }
            }
            // Located-mode matches of unknown-location barcodes keep their fallback bucket
            if barcodes.iter().any(|b| !b.location().is_known()) {
                categories.extend(Category::pair(BarcodeLocation::Unknown));
            }
        }
    }

    if keep_unmatched {
        categories.push(Category::NoBarcode);
    }

    categories
}
