//! Read extraction: classify every read of an input and route it to a
//! per-category output.
//!
//! - [`pipeline`]: the two-pass engine over record sources and sinks
//! - [`statistics`]: run counters and their JSON/TSV export
//! - [`format`]: input format detection and resolution
//! - [`bam`], [`fastq`]: format-specific sources, sinks and extractors
//! - [`output`]: output file naming
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use barcode_seqkit::config::ExtractorConfig;
//! use barcode_seqkit::core::barcode::BarcodeSpec;
//! use barcode_seqkit::core::types::BarcodeLocation;
//! use barcode_seqkit::extraction::{create_extractor, format::resolve_inputs, RunContext};
//! use barcode_seqkit::logging::TracingLog;
//!
//! let config = ExtractorConfig::new(vec![
//!     BarcodeSpec::new("ACGTACGT", BarcodeLocation::FivePrime).unwrap(),
//! ]);
//! let inputs = resolve_inputs(&[PathBuf::from("reads.bam")]).unwrap();
//! let extractor = create_extractor(config, inputs, RunContext::new(Arc::new(TracingLog))).unwrap();
//! let stats = extractor.extract().unwrap();
//! println!("{:.1}% of reads carry a barcode", stats.match_rate() * 100.0);
//! ```

pub mod bam;
pub mod fastq;
pub mod format;
pub mod output;
pub mod pipeline;
pub mod statistics;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, ExtractorConfig};
use crate::logging::RunLog;
use format::{InputError, Inputs};
use output::OutputLayout;
use pipeline::{CancellationToken, ExtractionPipeline, PipelineError, RecordSink, RecordSource};
use statistics::ExtractionStatistics;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write statistics to {path}: {source}")]
    Statistics {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Collaborators of a run that outlive the extractor's configuration
#[derive(Clone)]
pub struct RunContext {
    pub log: Arc<dyn RunLog>,
    pub cancel: CancellationToken,
}

impl RunContext {
    #[must_use]
    pub fn new(log: Arc<dyn RunLog>) -> Self {
        Self {
            log,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// A configured extraction over one input
pub trait Extractor {
    /// Run the extraction, write the statistics files and return the statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, an output cannot be
    /// written, or the run is cancelled.
    fn extract(&self) -> Result<ExtractionStatistics, ExtractError>;
}

/// Build the extractor matching the input format.
///
/// # Errors
///
/// Returns `ExtractError::Config` if the configuration is invalid.
pub fn create_extractor(
    config: ExtractorConfig,
    inputs: Inputs,
    context: RunContext,
) -> Result<Box<dyn Extractor>, ExtractError> {
    config.validate()?;
    context.log.debug(&format!(
        "Creating {} extractor",
        inputs.format().display_name()
    ));

    Ok(match inputs {
        Inputs::Bam(path) => Box::new(bam::BamExtractor::new(
            config,
            bam::BamSource::new(path),
            context,
        )),
        Inputs::Fastq(path) => Box::new(fastq::FastqExtractor::new(
            config,
            fastq::FastqSource::single(path),
            context,
        )),
        Inputs::PairedFastq { r1, r2 } => Box::new(fastq::FastqExtractor::new(
            config,
            fastq::FastqSource::paired(r1, r2),
            context,
        )),
    })
}

/// Run the pipeline and persist its statistics next to the outputs
pub(crate) fn run_extraction<S, K>(
    config: &ExtractorConfig,
    context: &RunContext,
    source: &S,
    sink: &mut K,
) -> Result<ExtractionStatistics, ExtractError>
where
    S: RecordSource,
    K: RecordSink<S::Record>,
{
    let layout = OutputLayout::new(&config.output_dir, &config.output_prefix);
    layout.ensure_dir().map_err(|source| ExtractError::OutputDir {
        path: layout.dir().to_path_buf(),
        source,
    })?;

    let statistics = ExtractionPipeline::new(config, context.log.as_ref())
        .with_cancellation(context.cancel.clone())
        .run(source, sink)?;

    save_statistics(&layout, &statistics, context.log.as_ref())?;
    Ok(statistics)
}

fn save_statistics(
    layout: &OutputLayout,
    statistics: &ExtractionStatistics,
    log: &dyn RunLog,
) -> Result<(), ExtractError> {
    let json_path = layout.stats_json_path();
    statistics
        .save_json(&json_path)
        .map_err(|source| ExtractError::Statistics {
            path: json_path.clone(),
            source,
        })?;

    let tsv_path = layout.stats_tsv_path();
    statistics
        .save_tsv(&tsv_path)
        .map_err(|source| ExtractError::Statistics {
            path: tsv_path.clone(),
            source,
        })?;

    log.info(&format!(
        "Statistics saved to {} and {}",
        json_path.display(),
        tsv_path.display()
    ));
    Ok(())
}
