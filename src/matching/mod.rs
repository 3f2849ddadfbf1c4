//! Barcode search and read classification.
//!
//! This module provides the matching functionality:
//!
//! - [`search`]: exact and bounded-edit-distance pattern search
//! - [`matcher`]: barcode search in both orientations (all, first, best)
//! - [`classifier`]: first-match-wins read classification and output categories
//!
//! ## Matching
//!
//! With `max_mismatches == 0` barcodes are found by exact substring search.
//! Otherwise a match may differ from the barcode by up to `max_mismatches`
//! substitutions, insertions and deletions in total.
//!
//! ## Classification
//!
//! Barcodes are tried in configuration order, forward before reverse
//! complement, and the first hit decides the read's category. The best-match
//! search is kept for diagnostics only.
//!
//! ## Example
//!
//! ```rust
//! use barcode_seqkit::core::barcode::BarcodeSpec;
//! use barcode_seqkit::core::types::BarcodeLocation;
//! use barcode_seqkit::matching::classifier::{classify, ClassificationMode};
//!
//! let barcodes = vec![
//!     BarcodeSpec::new("ACGT", BarcodeLocation::FivePrime).unwrap(),
//!     BarcodeSpec::new("TTTT", BarcodeLocation::ThreePrime).unwrap(),
//! ];
//! let mode = ClassificationMode::for_barcodes(&barcodes);
//!
//! let (found, category) = classify(b"ACGTAAAA", &barcodes, 0, mode);
//! assert_eq!(category.to_string(), "barcode5_orientFR");
//! assert_eq!(found.unwrap().position, 0);
//! ```

pub mod classifier;
pub mod matcher;
pub mod search;

pub use classifier::{classify, prepare_categories, Category, ClassificationMode};
