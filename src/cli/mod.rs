//! Command-line interface for barcode-seqkit.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **extract**: Classify the reads of a BAM or FASTQ input by barcode and
//!   write one output file per category
//! - **scan**: Show every barcode match in a single sequence
//!
//! ## Usage
//!
//! ```text
//! # Split a BAM file by a 5' and a 3' barcode
//! barcode-seqkit extract sample.bam --barcode5 ACGTACGT --barcode3 TTGGCCAA
//!
//! # Paired FASTQ, allowing one edit, statistics only
//! barcode-seqkit extract reads_R1.fq.gz reads_R2.fq.gz -b ACGTACGT -m 1 --stats-only
//!
//! # Barcodes from a configuration file, JSON statistics on stdout
//! barcode-seqkit extract sample.bam --config barcodes.json --format json
//!
//! # Inspect one read
//! barcode-seqkit scan TTACGTCCGTTT -b ACGTACGT -m 1
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ConfigError, ExtractorConfig};
use crate::core::barcode::BarcodeSpec;
use crate::core::types::BarcodeLocation;

pub mod extract;
pub mod scan;

#[derive(Parser)]
#[command(name = "barcode-seqkit")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Classify sequencing reads by barcode presence and orientation")]
#[command(
    long_about = "barcode-seqkit finds short barcode sequences in BAM or FASTQ reads, in forward or reverse-complement orientation, and splits the reads into one output per category.\n\nEach read is assigned by the first configured barcode found in it. Statistics are written as JSON and TSV next to the outputs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split reads into per-category outputs by barcode
    Extract(extract::ExtractArgs),

    /// Show barcode matches in a single sequence
    Scan(scan::ScanArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Barcode options shared by all commands
#[derive(Args, Debug, Clone, Default)]
pub struct BarcodeArgs {
    /// JSON configuration file; flags below extend or override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Barcode with no expected location (repeatable)
    #[arg(short = 'b', long = "barcode")]
    pub barcodes: Vec<String>,

    /// Barcode expected at the 5' end (repeatable)
    #[arg(long = "barcode5")]
    pub barcodes5: Vec<String>,

    /// Barcode expected at the 3' end (repeatable)
    #[arg(long = "barcode3")]
    pub barcodes3: Vec<String>,

    /// Maximum edits (substitutions, insertions, deletions) per match
    #[arg(short, long)]
    pub max_mismatches: Option<usize>,
}

impl BarcodeArgs {
    /// Load the configuration file, if any, and apply the barcode flags.
    ///
    /// Flag barcodes are appended after file barcodes: 5' first, then 3',
    /// then location-free ones, each in the order given.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded or a barcode
    /// sequence is invalid.
    pub fn build_config(&self) -> Result<ExtractorConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ExtractorConfig::from_json_file(path)?,
            None => ExtractorConfig::default(),
        };

        let flagged = [
            (&self.barcodes5, BarcodeLocation::FivePrime),
            (&self.barcodes3, BarcodeLocation::ThreePrime),
            (&self.barcodes, BarcodeLocation::Unknown),
        ];
        for (sequences, location) in flagged {
            for sequence in sequences {
                config.barcodes.push(BarcodeSpec::new(sequence, location)?);
            }
        }

        if let Some(max_mismatches) = self.max_mismatches {
            config.max_mismatches = max_mismatches;
        }

        Ok(config)
    }
}
