//! BAM input and per-category BAM outputs.
//!
//! Outputs are coordinate-sorted and indexed. Records are held in memory per
//! category until the sink is finished.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use noodles::bam::{self, bai};
use noodles::csi::binning_index::index::reference_sequence::bin::Chunk;
use noodles::csi::binning_index::index::reference_sequence::index::LinearIndex;
use noodles::csi::binning_index::Indexer;
use noodles::sam;
use noodles::sam::alignment::io::Write as _;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record_buf::QualityScores;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::header::record::value::map::header::{sort_order, tag};

use crate::config::ExtractorConfig;
use crate::core::alignment::{Alignment, CigarKind, CigarOp};
use crate::extraction::output::OutputLayout;
use crate::extraction::pipeline::{ReadRecord, RecordSink, RecordSource, RecordStream};
use crate::extraction::statistics::ExtractionStatistics;
use crate::extraction::{run_extraction, ExtractError, Extractor, RunContext};
use crate::matching::classifier::Category;

fn cigar_kind(kind: Kind) -> CigarKind {
    match kind {
        Kind::Match => CigarKind::Match,
        Kind::Insertion => CigarKind::Insertion,
        Kind::Deletion => CigarKind::Deletion,
        Kind::Skip => CigarKind::Skip,
        Kind::SoftClip => CigarKind::SoftClip,
        Kind::HardClip => CigarKind::HardClip,
        Kind::Pad => CigarKind::Pad,
        Kind::SequenceMatch => CigarKind::SequenceMatch,
        Kind::SequenceMismatch => CigarKind::SequenceMismatch,
    }
}

/// A BAM record with its decoded identifier, bases and alignment
pub struct BamRead {
    record: bam::Record,
    identifier: String,
    sequence: Vec<u8>,
    alignment: Alignment,
}

impl BamRead {
    /// Decode the fields the classifier needs.
    ///
    /// Records without a name get a positional identifier, so they are never
    /// merged with each other.
    fn decode(record: bam::Record, index: usize) -> io::Result<Self> {
        let identifier = match record.name() {
            Some(name) => {
                let name: &[u8] = name.as_ref();
                String::from_utf8_lossy(name).into_owned()
            }
            None => format!("*{index}"),
        };

        let sequence: Vec<u8> = record.sequence().iter().collect();

        let flags = record.flags();
        let cigar = record
            .cigar()
            .iter()
            .map(|op| op.map(|op| CigarOp::new(cigar_kind(op.kind()), op.len())))
            .collect::<io::Result<Vec<_>>>()?;
        let alignment = Alignment {
            is_unmapped: flags.is_unmapped(),
            is_reverse: flags.is_reverse_complemented(),
            cigar,
        };

        Ok(Self {
            record,
            identifier,
            sequence,
            alignment,
        })
    }

    pub fn record(&self) -> &bam::Record {
        &self.record
    }
}

impl ReadRecord for BamRead {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    fn alignment(&self) -> Option<&Alignment> {
        Some(&self.alignment)
    }
}

/// Records of a BAM file, read front to back on every pass
#[derive(Debug, Clone)]
pub struct BamSource {
    path: PathBuf,
}

impl BamSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file's SAM header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a BAM file.
    pub fn header(&self) -> io::Result<sam::Header> {
        let mut reader = File::open(&self.path).map(bam::io::Reader::new)?;
        reader.read_header()
    }
}

impl RecordSource for BamSource {
    type Record = BamRead;

    fn records(&self) -> io::Result<RecordStream<'_, BamRead>> {
        let mut reader = File::open(&self.path).map(bam::io::Reader::new)?;
        reader.read_header()?;

        let mut index = 0;
        Ok(Box::new(std::iter::from_fn(move || {
            let mut record = bam::Record::default();
            match reader.read_record(&mut record) {
                Ok(0) => None,
                Ok(_) => {
                    index += 1;
                    Some(BamRead::decode(record, index - 1))
                }
                Err(e) => Some(Err(e)),
            }
        })))
    }
}

/// BAM stores absent base qualities as this value repeated per base
const MISSING_QUALITY: u8 = 0xff;

/// Copy a decoded record into an owned buffer the BAM encoder accepts.
fn to_record_buf(header: &sam::Header, record: &bam::Record) -> io::Result<RecordBuf> {
    let mut record_buf = RecordBuf::try_from_alignment_record(header, record)?;
    if record_buf
        .quality_scores()
        .as_ref()
        .iter()
        .all(|&score| score == MISSING_QUALITY)
    {
        *record_buf.quality_scores_mut() = QualityScores::default();
    }
    Ok(record_buf)
}

/// Sort key placing records without a reference or position last
fn coordinate_key(record: &RecordBuf) -> (usize, usize) {
    (
        record.reference_sequence_id().unwrap_or(usize::MAX),
        record.alignment_start().map_or(usize::MAX, usize::from),
    )
}

fn with_coordinate_sort_order(mut header: sam::Header) -> sam::Header {
    header
        .header_mut()
        .get_or_insert_with(Default::default)
        .other_fields_mut()
        .insert(tag::SORT_ORDER, sort_order::COORDINATE.into());
    header
}

/// Write records in coordinate order, then their BAI index.
fn write_sorted(
    header: &sam::Header,
    file: File,
    mut records: Vec<RecordBuf>,
    index_path: &Path,
) -> io::Result<()> {
    records.sort_by_key(coordinate_key);

    let mut writer = bam::io::Writer::new(file);
    writer.write_header(header)?;

    let mut indexer = Indexer::<LinearIndex>::default();
    let mut chunk_start = writer.get_ref().virtual_position();
    for record in &records {
        writer.write_alignment_record(header, record)?;
        let chunk_end = writer.get_ref().virtual_position();

        let context = match (
            record.reference_sequence_id(),
            record.alignment_start(),
            record.alignment_end(),
        ) {
            (Some(id), Some(start), Some(end)) => {
                Some((id, start, end, !record.flags().is_unmapped()))
            }
            _ => None,
        };
        indexer.add_record(context, Chunk::new(chunk_start, chunk_end))?;
        chunk_start = chunk_end;
    }
    writer.try_finish()?;

    let index = indexer.build(header.reference_sequences().len());
    bai::write(index_path, &index)
}

struct Bucket {
    category: Category,
    file: File,
    records: Vec<RecordBuf>,
}

/// One sorted, indexed BAM file per category, all carrying the input header
pub struct BamSink {
    layout: OutputLayout,
    header: sam::Header,
    buckets: Vec<Bucket>,
    created: Vec<PathBuf>,
}

impl BamSink {
    #[must_use]
    pub fn new(layout: OutputLayout, header: sam::Header) -> Self {
        Self {
            layout,
            header: with_coordinate_sort_order(header),
            buckets: Vec::new(),
            created: Vec::new(),
        }
    }
}

impl RecordSink<BamRead> for BamSink {
    fn open(&mut self, categories: &[Category]) -> io::Result<()> {
        for &category in categories {
            let path = self.layout.bam_path(category);
            let file = File::create(&path)?;
            self.created.push(path);
            self.buckets.push(Bucket {
                category,
                file,
                records: Vec::new(),
            });
        }
        Ok(())
    }

    fn write(&mut self, category: Category, read: &BamRead) -> io::Result<()> {
        let bucket = self
            .buckets
            .iter_mut()
            .find(|b| b.category == category)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("no output opened for category {category}"),
                )
            })?;
        bucket.records.push(to_record_buf(&self.header, &read.record)?);
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        for bucket in std::mem::take(&mut self.buckets) {
            let index_path = self.layout.bai_path(bucket.category);
            self.created.push(index_path.clone());
            write_sorted(&self.header, bucket.file, bucket.records, &index_path)?;
        }
        self.created.clear();
        Ok(())
    }

    fn abort(&mut self) -> io::Result<()> {
        self.buckets.clear();
        for path in self.created.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Extraction over a BAM file
pub struct BamExtractor {
    config: ExtractorConfig,
    source: BamSource,
    context: RunContext,
}

impl BamExtractor {
    #[must_use]
    pub fn new(config: ExtractorConfig, source: BamSource, context: RunContext) -> Self {
        Self {
            config,
            source,
            context,
        }
    }
}

impl Extractor for BamExtractor {
    fn extract(&self) -> Result<ExtractionStatistics, ExtractError> {
        let header = self.source.header().map_err(|source| ExtractError::Open {
            path: self.source.path().to_path_buf(),
            source,
        })?;
        self.context.log.debug(&format!(
            "Read BAM header with {} reference sequence(s)",
            header.reference_sequences().len()
        ));

        let layout = OutputLayout::new(&self.config.output_dir, &self.config.output_prefix);
        let mut sink = BamSink::new(layout, header);
        run_extraction(&self.config, &self.context, &self.source, &mut sink)
    }
}
