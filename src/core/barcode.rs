use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::sequence::{complement_base, VALID_BASES};
use crate::core::types::{BarcodeLocation, OrientationType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BarcodeError {
    #[error("Barcode sequence is empty")]
    Empty,

    #[error("Invalid barcode sequence: {sequence} (unexpected '{base}')")]
    InvalidBase { sequence: String, base: char },
}

/// A barcode to search for, as configured for a run.
///
/// The sequence is trimmed and upper-cased on construction and only ever
/// contains A, C, G, T or N.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BarcodeSpecData")]
pub struct BarcodeSpec {
    sequence: String,
    location: BarcodeLocation,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Unvalidated barcode as it appears in a configuration file
#[derive(Debug, Deserialize)]
struct BarcodeSpecData {
    sequence: String,
    #[serde(default)]
    location: BarcodeLocation,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl TryFrom<BarcodeSpecData> for BarcodeSpec {
    type Error = BarcodeError;

    fn try_from(data: BarcodeSpecData) -> Result<Self, Self::Error> {
        let mut barcode = Self::new(&data.sequence, data.location)?;
        if let Some(name) = data.name {
            barcode.name = name;
        }
        barcode.description = data.description;
        Ok(barcode)
    }
}

impl BarcodeSpec {
    /// Create a barcode, validating its sequence.
    ///
    /// # Errors
    ///
    /// Returns `BarcodeError::Empty` for a blank sequence or
    /// `BarcodeError::InvalidBase` if it contains anything but A, C, G, T, N.
    pub fn new(sequence: &str, location: BarcodeLocation) -> Result<Self, BarcodeError> {
        let sequence = sequence.trim().to_ascii_uppercase();
        if sequence.is_empty() {
            return Err(BarcodeError::Empty);
        }
        let invalid = sequence.bytes().find(|b| !VALID_BASES.contains(b));
        if let Some(base) = invalid {
            return Err(BarcodeError::InvalidBase {
                base: char::from(base),
                sequence,
            });
        }

        Ok(Self {
            name: sequence.clone(),
            sequence,
            location,
            description: None,
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn location(&self) -> BarcodeLocation {
        self.location
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Reverse complement of the barcode sequence
    #[must_use]
    pub fn reverse_complement(&self) -> String {
        // The alphabet is validated at construction, so every base has a complement
        self.sequence
            .bytes()
            .rev()
            .filter_map(complement_base)
            .map(char::from)
            .collect()
    }

    /// The pattern searched for in the given orientation
    #[must_use]
    pub fn pattern(&self, orientation: OrientationType) -> Vec<u8> {
        match orientation {
            OrientationType::ReverseComplement => self.reverse_complement().into_bytes(),
            OrientationType::Forward | OrientationType::Any => self.sequence.as_bytes().to_vec(),
        }
    }
}

impl std::fmt::Display for BarcodeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.location {
            BarcodeLocation::Unknown => write!(f, "{} ({})", self.name, self.sequence),
            location => write!(f, "{} ({}, {location}')", self.name, self.sequence),
        }
    }
}

/// A barcode found in a read sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeMatch<'a> {
    /// The barcode that matched
    pub barcode: &'a BarcodeSpec,

    /// Orientation in which it matched
    pub orientation: OrientationType,

    /// 0-based offset of the match in the searched sequence
    pub position: usize,

    /// The matched substring; differs from the barcode under fuzzy matching
    pub sequence: String,

    /// Total edits (substitutions, insertions, deletions) of the match
    pub edits: usize,
}

impl std::fmt::Display for BarcodeMatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) at position {}",
            self.barcode.name, self.orientation, self.position
        )
    }
}
