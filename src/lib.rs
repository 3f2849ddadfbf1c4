//! # barcode-seqkit
//!
//! A library for classifying sequencing reads by the barcodes they carry.
//!
//! Library preparations often tag molecules with short known sequences at one
//! or both ends. After sequencing, a read may contain such a barcode as-is or as
//! its reverse complement, possibly with a few sequencing errors, and possibly
//! only in the soft-clipped part of an alignment.
//!
//! `barcode-seqkit` finds those barcodes and splits BAM or FASTQ input into one
//! output per barcode location and orientation, with run statistics.
//!
//! ## Features
//!
//! - **Exact and fuzzy matching**: Substring search, or bounded edit distance
//! - **Both orientations**: Every barcode is searched forward and reverse complemented
//! - **Located barcodes**: 5' and 3' barcodes get separate categories
//! - **Soft-clip search**: Restrict the search to the clipped 5' flank of aligned reads
//! - **Read deduplication**: Records sharing a read name are classified once
//! - **Parallel classification**: Deterministic results for any thread count
//!
//! ## Example
//!
//! ```rust
//! use barcode_seqkit::{classify, BarcodeLocation, BarcodeSpec, ClassificationMode};
//!
//! let barcodes = vec![
//!     BarcodeSpec::new("ACGTACGT", BarcodeLocation::FivePrime).unwrap(),
//!     BarcodeSpec::new("GATTACAA", BarcodeLocation::ThreePrime).unwrap(),
//! ];
//! let mode = ClassificationMode::for_barcodes(&barcodes);
//!
//! // One substitution away from the 5' barcode
//! let (found, category) = classify(b"TTACGTCCGTTT", &barcodes, 1, mode);
//! assert_eq!(category.to_string(), "barcode5_orientFR");
//! assert_eq!(found.unwrap().position, 2);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Barcode, sequence and alignment types
//! - [`matching`]: Barcode search and read classification
//! - [`extraction`]: Two-pass extraction pipeline with BAM and FASTQ backends
//! - [`config`]: Run configuration
//! - [`logging`]: Run log sinks
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod config;
pub mod core;
pub mod extraction;
pub mod logging;
pub mod matching;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::ExtractorConfig;
pub use core::barcode::{BarcodeMatch, BarcodeSpec};
pub use core::types::*;
pub use extraction::statistics::ExtractionStatistics;
pub use extraction::{create_extractor, Extractor};
pub use matching::{classify, prepare_categories, Category, ClassificationMode};
