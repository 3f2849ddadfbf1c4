//! Scan command - inspect barcode matches in one sequence.
//!
//! Lists every match (all barcodes, both orientations), the fewest-edit match
//! and the category first-match classification assigns. Classification never
//! uses the fewest-edit match; the two are shown side by side to explain
//! surprising assignments.

use clap::Args;

use crate::cli::{BarcodeArgs, OutputFormat};
use crate::core::barcode::BarcodeMatch;
use crate::core::sequence::hamming_distance;
use crate::matching::classifier::{classify, ClassificationMode};
use crate::matching::matcher::{find_barcode_matches, find_best_barcode_match};

/// Arguments for the scan command
#[derive(Args)]
pub struct ScanArgs {
    /// Read sequence to scan
    #[arg(required = true)]
    pub sequence: String,

    #[command(flatten)]
    pub barcodes: BarcodeArgs,
}

/// Hamming distance to the searched pattern, when the match has no indels
fn hamming(found: &BarcodeMatch<'_>) -> Option<usize> {
    let pattern = found.barcode.pattern(found.orientation);
    hamming_distance(found.sequence.as_bytes(), &pattern).ok()
}

/// Execute the scan command
///
/// # Errors
///
/// Returns an error if no barcodes are configured or a barcode is invalid.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ScanArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.barcodes.build_config()?;
    config.validate()?;

    let sequence = args.sequence.trim().as_bytes();
    let mode = ClassificationMode::for_barcodes(&config.barcodes);
    if verbose {
        eprintln!(
            "Scanning {} bp against {} barcode(s), {mode:?} mode",
            sequence.len(),
            config.barcodes.len()
        );
    }

    let matches = find_barcode_matches(sequence, &config.barcodes, config.max_mismatches);
    let best = find_best_barcode_match(sequence, &config.barcodes, config.max_mismatches);
    let (first, category) = classify(sequence, &config.barcodes, config.max_mismatches, mode);

    match format {
        OutputFormat::Text => {
            println!("\nSequence: {} bp", sequence.len());
            println!("Category: {category}");
            if let Some(first) = &first {
                println!("   Decided by: {first}");
            }
            if let Some(best) = &best {
                println!("   Fewest edits: {best} ({} edits)", best.edits);
            }

            if matches.is_empty() {
                println!("\nNo matches");
            } else {
                println!("\nMatches ({}):", matches.len());
                for found in &matches {
                    let hamming = hamming(found).map_or("-".to_string(), |d| d.to_string());
                    println!(
                        "   {} {} pos {} {} edits {} hamming {}",
                        found.barcode.name(),
                        found.orientation,
                        found.position,
                        found.sequence,
                        found.edits,
                        hamming
                    );
                }
            }
        }
        OutputFormat::Json => {
            let to_json = |found: &BarcodeMatch<'_>| {
                serde_json::json!({
                    "barcode": found.barcode.name(),
                    "barcode_sequence": found.barcode.sequence(),
                    "location": found.barcode.location(),
                    "orientation": found.orientation,
                    "position": found.position,
                    "matched": found.sequence,
                    "edits": found.edits,
                    "hamming": hamming(found),
                })
            };
            let output = serde_json::json!({
                "sequence_length": sequence.len(),
                "category": category.to_string(),
                "first_match": first.as_ref().map(to_json),
                "best_match": best.as_ref().map(to_json),
                "matches": matches.iter().map(to_json).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("barcode\torientation\tposition\tmatched\tedits\thamming\tfirst\tbest");
            for found in &matches {
                let is_first = first.as_ref() == Some(found);
                let is_best = best.as_ref() == Some(found);
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    found.barcode.name(),
                    found.orientation,
                    found.position,
                    found.sequence,
                    found.edits,
                    hamming(found).map_or(String::new(), |d| d.to_string()),
                    is_first,
                    is_best
                );
            }
        }
    }

    Ok(())
}
