//! Extract command - split reads into per-category outputs.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::cli::{BarcodeArgs, OutputFormat};
use crate::extraction::format::resolve_inputs;
use crate::extraction::statistics::ExtractionStatistics;
use crate::extraction::{create_extractor, ExtractError, RunContext};
use crate::logging::{RunLog, TracingLog};

/// Arguments for the extract command
#[derive(Args)]
pub struct ExtractArgs {
    /// Input: one BAM file, one or two FASTQ files, or a directory holding an
    /// R1/R2 FASTQ pair
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub barcodes: BarcodeArgs,

    /// Search only the soft-clipped 5' flank of aligned reads
    #[arg(long)]
    pub search_softclipped: bool,

    /// Do not write reads without a barcode
    #[arg(long)]
    pub no_unmatched: bool,

    /// Only compute statistics, write no read outputs
    #[arg(long)]
    pub stats_only: bool,

    /// Prefix of every output file name
    #[arg(short = 'p', long)]
    pub output_prefix: Option<String>,

    /// Directory for outputs and statistics
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Worker threads for classification
    #[arg(short, long)]
    pub threads: Option<usize>,
}

/// Execute the extract command
///
/// # Errors
///
/// Returns an error if the configuration or inputs are invalid, or the
/// extraction fails.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ExtractArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let mut config = args.barcodes.build_config()?;
    if args.search_softclipped {
        config.search_softclipped = true;
    }
    if args.no_unmatched {
        config.keep_unmatched = false;
    }
    if args.stats_only {
        config.write_output_files = false;
    }
    if let Some(prefix) = &args.output_prefix {
        config.output_prefix.clone_from(prefix);
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir.clone_from(dir);
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }

    let inputs = resolve_inputs(&args.inputs)?;
    if verbose {
        for barcode in &config.barcodes {
            eprintln!("Barcode: {barcode}");
        }
    }

    let log: Arc<dyn RunLog> = Arc::new(TracingLog);
    let extractor = create_extractor(config, inputs, RunContext::new(log))?;

    let stats = match extractor.extract() {
        Ok(stats) => stats,
        Err(ExtractError::Pipeline(err)) => {
            if let Some(partial) = err.partial_statistics() {
                tracing::warn!(
                    "Run stopped after {} reads ({} with barcode); statistics were not saved",
                    partial.total_reads(),
                    partial.total_barcode_matches()
                );
            }
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    match format {
        OutputFormat::Text => print_text_result(&stats),
        OutputFormat::Json => println!("{}", stats.to_json()?),
        OutputFormat::Tsv => print!("{}", stats.to_tsv()),
    }

    Ok(())
}

fn print_text_result(stats: &ExtractionStatistics) {
    println!("\nBarcode extraction: {} reads", stats.total_reads());
    println!(
        "   With barcode: {} ({:.1}%)",
        stats.total_barcode_matches(),
        stats.match_rate() * 100.0
    );
    println!("   Without barcode: {}", stats.no_barcode_count());

    if !stats.matches_by_category().is_empty() {
        println!("\n   By category:");
        for (category, count) in stats.matches_by_category().iter() {
            println!("      {category:<24} {count}");
        }
    }

    if !stats.matches_by_barcode().is_empty() {
        println!("\n   By barcode:");
        for (barcode, count) in stats.matches_by_barcode().iter() {
            println!("      {barcode:<24} {count}");
        }
    }
}
