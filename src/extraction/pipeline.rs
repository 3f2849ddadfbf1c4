//! Two-pass extraction over a restartable record source.
//!
//! | Stage | Work |
//! |-------|------|
//! | `INIT` | validate configuration, build the worker pool, prepare categories |
//! | `DEDUP_SCAN` | classify each distinct read identifier once, update statistics |
//! | `ROUTE` | re-read the source and write every record to its category's output |
//! | `FINALIZE` | finish all outputs |
//!
//! A run that fails after the outputs were opened asks the sink to remove them.
//!
//! Pass 1 reads and deduplicates records sequentially and classifies them in
//! batches on a rayon pool. Each worker folds into its own
//! [`ExtractionStatistics`] shard; shards are merged back in input order, so
//! the result does not depend on the thread count. The identifier map is
//! complete before pass 2 starts.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use crate::config::{ConfigError, ExtractorConfig};
use crate::core::alignment::{extract_softclip_region, Alignment};
use crate::core::barcode::BarcodeSpec;
use crate::extraction::statistics::ExtractionStatistics;
use crate::logging::RunLog;
use crate::matching::classifier::{classify, prepare_categories, Category, ClassificationMode};

/// Reads classified per parallel batch
pub const BATCH_SIZE: usize = 4096;

/// A sequencing read as seen by the pipeline
pub trait ReadRecord {
    /// Read identifier; records sharing one are classified once
    fn identifier(&self) -> &str;

    fn sequence(&self) -> &[u8];

    /// Alignment metadata, when the source carries any
    fn alignment(&self) -> Option<&Alignment> {
        None
    }
}

pub type RecordStream<'a, R> = Box<dyn Iterator<Item = io::Result<R>> + 'a>;

/// A finite collection of reads that can be streamed more than once
pub trait RecordSource {
    type Record: ReadRecord;

    /// Open a fresh stream positioned at the first record.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input cannot be opened.
    fn records(&self) -> io::Result<RecordStream<'_, Self::Record>>;
}

/// Per-category output buckets
pub trait RecordSink<R> {
    /// Create one bucket per category, in the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if a bucket cannot be created.
    fn open(&mut self, categories: &[Category]) -> io::Result<()>;

    /// Append a record to an opened category's bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn write(&mut self, category: Category, record: &R) -> io::Result<()>;

    /// Flush and close every bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if a bucket cannot be finished.
    fn finish(&mut self) -> io::Result<()>;

    /// Drop every bucket of a failed run and remove the files created so far.
    ///
    /// # Errors
    ///
    /// Returns an error if a created file cannot be removed.
    fn abort(&mut self) -> io::Result<()>;
}

/// Shared flag to stop a running extraction between records
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    DedupScan,
    Route,
    Finalize,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::DedupScan => "DEDUP_SCAN",
            Self::Route => "ROUTE",
            Self::Finalize => "FINALIZE",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Stream error during {stage}: {source}")]
    Stream {
        stage: Stage,
        #[source]
        source: io::Error,
        statistics: Box<ExtractionStatistics>,
    },

    #[error("Extraction cancelled during {stage}")]
    Cancelled {
        stage: Stage,
        statistics: Box<ExtractionStatistics>,
    },
}

impl PipelineError {
    fn stream(stage: Stage, source: io::Error, statistics: &ExtractionStatistics) -> Self {
        Self::Stream {
            stage,
            source,
            statistics: Box::new(statistics.clone()),
        }
    }

    fn cancelled(stage: Stage, statistics: &ExtractionStatistics) -> Self {
        Self::Cancelled {
            stage,
            statistics: Box::new(statistics.clone()),
        }
    }

    /// Stage in which the run failed
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config(_) | Self::ThreadPool(_) => Stage::Init,
            Self::Stream { stage, .. } | Self::Cancelled { stage, .. } => *stage,
        }
    }

    /// Statistics accumulated before the failure, if any pass had started
    #[must_use]
    pub fn partial_statistics(&self) -> Option<&ExtractionStatistics> {
        match self {
            Self::Config(_) | Self::ThreadPool(_) => None,
            Self::Stream { statistics, .. } | Self::Cancelled { statistics, .. } => {
                Some(statistics)
            }
        }
    }
}

/// Why the scan loop stopped early
enum Abort {
    Stream(io::Error),
    Cancelled,
}

/// Shared, read-only inputs of batch classification
struct Classifier<'c> {
    barcodes: &'c [BarcodeSpec],
    max_mismatches: usize,
    mode: ClassificationMode,
}

impl Classifier<'_> {
    fn classify_read(&self, sequence: &[u8], statistics: &mut ExtractionStatistics) -> Category {
        statistics.record_read();
        if sequence.is_empty() {
            statistics.record_no_barcode();
            return Category::NoBarcode;
        }

        match classify(sequence, self.barcodes, self.max_mismatches, self.mode) {
            (Some(found), category) => {
                statistics.update_barcode_match(&found, category);
                category
            }
            (None, _) => {
                statistics.record_no_barcode();
                Category::NoBarcode
            }
        }
    }
}

pub struct ExtractionPipeline<'a> {
    config: &'a ExtractorConfig,
    log: &'a dyn RunLog,
    cancel: CancellationToken,
}

impl<'a> ExtractionPipeline<'a> {
    #[must_use]
    pub fn new(config: &'a ExtractorConfig, log: &'a dyn RunLog) -> Self {
        Self {
            config,
            log,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run both passes and return the statistics of the run.
    ///
    /// The sink is only opened when the configuration asks for output files.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` or `PipelineError::ThreadPool` before any
    /// record is read, and `PipelineError::Stream` or `PipelineError::Cancelled`
    /// (carrying the statistics so far) when a pass stops early.
    pub fn run<S, K>(&self, source: &S, sink: &mut K) -> Result<ExtractionStatistics, PipelineError>
    where
        S: RecordSource,
        K: RecordSink<S::Record>,
    {
        self.log.debug(&format!("Stage {}", Stage::Init));
        self.config.validate()?;
        for duplicate in self.config.duplicate_barcodes() {
            self.log.warn(&format!(
                "Barcode {duplicate} is configured more than once; only the first entry can match"
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()?;
        let categories = prepare_categories(&self.config.barcodes, self.config.keep_unmatched);
        let classifier = Classifier {
            barcodes: &self.config.barcodes,
            max_mismatches: self.config.max_mismatches,
            mode: ClassificationMode::for_barcodes(&self.config.barcodes),
        };
        self.log.info(&format!(
            "Searching {} barcode(s) with up to {} mismatch(es) on {} thread(s)",
            self.config.barcodes.len(),
            self.config.max_mismatches,
            self.config.threads
        ));

        let mut statistics = ExtractionStatistics::new();
        self.log.debug(&format!("Stage {}", Stage::DedupScan));
        let assignments = self.scan(source, &pool, &classifier, &mut statistics)?;
        self.log.info(&format!(
            "Classified {} reads: {} with barcode, {} without",
            statistics.total_reads(),
            statistics.total_barcode_matches(),
            statistics.no_barcode_count()
        ));

        if self.config.write_output_files {
            self.route(source, sink, &categories, &assignments, &statistics)?;
        } else {
            self.log.debug("Output files disabled, skipping routing");
        }

        self.log.debug(&format!("Stage {}", Stage::Done));
        Ok(statistics)
    }

    fn subsequence<'r, R: ReadRecord>(&self, record: &'r R) -> &'r [u8] {
        if !self.config.search_softclipped {
            return record.sequence();
        }
        match record.alignment() {
            Some(alignment) => extract_softclip_region(record.sequence(), alignment),
            // Sources without alignments have no soft clips to restrict to
            None => record.sequence(),
        }
    }

    fn scan<S: RecordSource>(
        &self,
        source: &S,
        pool: &rayon::ThreadPool,
        classifier: &Classifier<'_>,
        statistics: &mut ExtractionStatistics,
    ) -> Result<HashMap<String, Category>, PipelineError> {
        let stage = Stage::DedupScan;
        let records = source
            .records()
            .map_err(|e| PipelineError::stream(stage, e, statistics))?;

        let mut assignments = HashMap::new();
        let mut batch = Vec::with_capacity(BATCH_SIZE);
        let mut duplicates = 0_u64;

        let outcome = (|| -> Result<(), Abort> {
            for record in records {
                if self.cancel.is_cancelled() {
                    return Err(Abort::Cancelled);
                }
                let record = record.map_err(Abort::Stream)?;

                let identifier = record.identifier();
                if assignments.contains_key(identifier) {
                    duplicates += 1;
                    continue;
                }
                // Placeholder until the batch is classified
                assignments.insert(identifier.to_string(), Category::NoBarcode);
                batch.push((identifier.to_string(), self.subsequence(&record).to_vec()));

                if batch.len() >= BATCH_SIZE {
                    self.commit(pool, classifier, &mut batch, &mut assignments, statistics);
                }
            }
            Ok(())
        })();

        // Reads already accepted still count toward the partial statistics
        self.commit(pool, classifier, &mut batch, &mut assignments, statistics);

        if duplicates > 0 {
            self.log.debug(&format!(
                "Skipped {duplicates} record(s) with an already classified identifier"
            ));
        }

        match outcome {
            Ok(()) => Ok(assignments),
            Err(Abort::Stream(e)) => Err(PipelineError::stream(stage, e, statistics)),
            Err(Abort::Cancelled) => Err(PipelineError::cancelled(stage, statistics)),
        }
    }

    /// Classify a batch in parallel and record the results.
    fn commit(
        &self,
        pool: &rayon::ThreadPool,
        classifier: &Classifier<'_>,
        batch: &mut Vec<(String, Vec<u8>)>,
        assignments: &mut HashMap<String, Category>,
        statistics: &mut ExtractionStatistics,
    ) {
        if batch.is_empty() {
            return;
        }

        let (shard, categories) = pool.install(|| {
            batch
                .par_iter()
                .fold(
                    || (ExtractionStatistics::new(), Vec::new()),
                    |(mut stats, mut categories): (ExtractionStatistics, Vec<Category>),
                     (_, sequence)| {
                        categories.push(classifier.classify_read(sequence, &mut stats));
                        (stats, categories)
                    },
                )
                .reduce(
                    || (ExtractionStatistics::new(), Vec::new()),
                    |(mut left, mut left_categories), (right, right_categories)| {
                        left.merge(&right);
                        left_categories.extend(right_categories);
                        (left, left_categories)
                    },
                )
        });

        self.log
            .debug(&format!("Classified batch of {} reads", batch.len()));
        statistics.merge(&shard);
        for ((identifier, _), category) in batch.drain(..).zip(categories) {
            assignments.insert(identifier, category);
        }
    }

    fn route<S, K>(
        &self,
        source: &S,
        sink: &mut K,
        categories: &[Category],
        assignments: &HashMap<String, Category>,
        statistics: &ExtractionStatistics,
    ) -> Result<(), PipelineError>
    where
        S: RecordSource,
        K: RecordSink<S::Record>,
    {
        let stage = Stage::Route;
        self.log.debug(&format!("Stage {stage}"));
        let result = sink
            .open(categories)
            .map_err(|e| PipelineError::stream(stage, e, statistics))
            .and_then(|()| self.write_outputs(source, sink, categories, assignments, statistics));

        if result.is_err() {
            match sink.abort() {
                Ok(()) => self.log.warn("Removed outputs of the failed run"),
                Err(e) => self
                    .log
                    .warn(&format!("Failed to remove outputs of the failed run: {e}")),
            }
        }
        result
    }

    fn write_outputs<S, K>(
        &self,
        source: &S,
        sink: &mut K,
        categories: &[Category],
        assignments: &HashMap<String, Category>,
        statistics: &ExtractionStatistics,
    ) -> Result<(), PipelineError>
    where
        S: RecordSource,
        K: RecordSink<S::Record>,
    {
        let stage = Stage::Route;
        let records = source
            .records()
            .map_err(|e| PipelineError::stream(stage, e, statistics))?;

        let mut written = 0_u64;
        let mut dropped = 0_u64;
        for record in records {
            if self.cancel.is_cancelled() {
                return Err(PipelineError::cancelled(stage, statistics));
            }
            let record = record.map_err(|e| PipelineError::stream(stage, e, statistics))?;

            let category = assignments
                .get(record.identifier())
                .copied()
                .unwrap_or(Category::NoBarcode);
            if categories.contains(&category) {
                sink.write(category, &record)
                    .map_err(|e| PipelineError::stream(stage, e, statistics))?;
                written += 1;
            } else {
                dropped += 1;
            }
        }

        let stage = Stage::Finalize;
        self.log.debug(&format!("Stage {stage}"));
        sink.finish()
            .map_err(|e| PipelineError::stream(stage, e, statistics))?;
        self.log.info(&format!(
            "Wrote {written} record(s) to {} output(s), dropped {dropped}",
            categories.len()
        ));

        Ok(())
    }
}
