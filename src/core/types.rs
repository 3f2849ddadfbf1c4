use serde::{Deserialize, Serialize};

/// Orientation in which a barcode was searched or found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrientationType {
    /// Barcode sequence found as-is
    #[serde(rename = "FR")]
    Forward,
    /// Reverse complement of the barcode found
    #[serde(rename = "RC")]
    ReverseComplement,
    /// Either orientation; only meaningful in configuration, never a match result
    #[serde(rename = "ANY")]
    Any,
}

impl OrientationType {
    /// Orientations searched for every barcode, in scan order
    pub const SEARCHED: [OrientationType; 2] = [Self::Forward, Self::ReverseComplement];

    /// Short label used in category names and statistics ("FR", "RC", "ANY")
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Forward => "FR",
            Self::ReverseComplement => "RC",
            Self::Any => "ANY",
        }
    }
}

impl std::fmt::Display for OrientationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Where in the read a barcode is expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BarcodeLocation {
    #[serde(rename = "5", alias = "five_prime")]
    FivePrime,
    #[serde(rename = "3", alias = "three_prime")]
    ThreePrime,
    #[default]
    #[serde(rename = "UNK", alias = "unknown")]
    Unknown,
}

impl BarcodeLocation {
    /// Label used in category names; `None` for an unknown location
    #[must_use]
    pub fn category_label(self) -> Option<&'static str> {
        match self {
            Self::FivePrime => Some("5"),
            Self::ThreePrime => Some("3"),
            Self::Unknown => None,
        }
    }

    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for BarcodeLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FivePrime => write!(f, "5"),
            Self::ThreePrime => write!(f, "3"),
            Self::Unknown => write!(f, "UNK"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_labels() {
        assert_eq!(OrientationType::Forward.to_string(), "FR");
        assert_eq!(OrientationType::ReverseComplement.to_string(), "RC");
        assert_eq!(
            serde_json::to_string(&OrientationType::Any).unwrap(),
            "\"ANY\""
        );
    }

    #[test]
    fn test_location_serde() {
        let five: BarcodeLocation = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(five, BarcodeLocation::FivePrime);
        let three: BarcodeLocation = serde_json::from_str("\"three_prime\"").unwrap();
        assert_eq!(three, BarcodeLocation::ThreePrime);
        assert_eq!(BarcodeLocation::default(), BarcodeLocation::Unknown);
        assert_eq!(BarcodeLocation::Unknown.category_label(), None);
    }
}
