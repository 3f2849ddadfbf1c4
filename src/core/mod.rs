//! Core data types for barcode classification.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`BarcodeSpec`]: A configured barcode with its expected location
//! - [`BarcodeMatch`]: A barcode occurrence found in a read
//! - [`OrientationType`], [`BarcodeLocation`]: Match orientation and barcode placement
//! - [`Alignment`], [`CigarOp`]: The alignment metadata used for soft-clip extraction
//!
//! ## Orientations
//!
//! Reads may come from either strand of the original fragment, so every barcode
//! is searched twice against the same read sequence:
//!
//! | Orientation | Pattern | Label |
//! |-------------|---------|-------|
//! | Forward | barcode sequence | FR |
//! | Reverse complement | reverse complement of the barcode | RC |
//!
//! [`BarcodeSpec`]: barcode::BarcodeSpec
//! [`BarcodeMatch`]: barcode::BarcodeMatch
//! [`OrientationType`]: types::OrientationType
//! [`BarcodeLocation`]: types::BarcodeLocation
//! [`Alignment`]: alignment::Alignment
//! [`CigarOp`]: alignment::CigarOp

pub mod alignment;
pub mod barcode;
pub mod sequence;
pub mod types;
