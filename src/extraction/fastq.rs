//! FASTQ input and output, single-end or paired, plain or gzip-compressed.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use noodles::fastq;

use crate::config::ExtractorConfig;
use crate::extraction::format::is_gzipped;
use crate::extraction::output::{Mate, OutputLayout};
use crate::extraction::pipeline::{ReadRecord, RecordSink, RecordSource, RecordStream};
use crate::extraction::statistics::ExtractionStatistics;
use crate::extraction::{run_extraction, ExtractError, Extractor, RunContext};
use crate::matching::classifier::Category;

/// Read identifier for a FASTQ name: the name without a trailing `/1` or `/2`
fn read_identifier(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    name.strip_suffix("/1")
        .or_else(|| name.strip_suffix("/2"))
        .unwrap_or(&name)
        .to_string()
}

pub struct FastqRead {
    record: fastq::Record,
    identifier: String,
    mate: Option<Mate>,
}

impl FastqRead {
    fn new(record: fastq::Record, mate: Option<Mate>) -> Self {
        let name: &[u8] = record.name().as_ref();
        let identifier = read_identifier(name);
        Self {
            record,
            identifier,
            mate,
        }
    }

    pub fn record(&self) -> &fastq::Record {
        &self.record
    }

    pub fn mate(&self) -> Option<Mate> {
        self.mate
    }
}

impl ReadRecord for FastqRead {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn sequence(&self) -> &[u8] {
        self.record.sequence()
    }
}

type FastqReader = fastq::io::Reader<Box<dyn BufRead>>;

fn open_reader(path: &Path) -> io::Result<FastqReader> {
    let file = File::open(path)?;
    let inner: Box<dyn BufRead> = if is_gzipped(path) {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(fastq::io::Reader::new(inner))
}

fn next_read(reader: &mut FastqReader, mate: Option<Mate>) -> io::Result<Option<FastqRead>> {
    let mut record = fastq::Record::default();
    match reader.read_record(&mut record)? {
        0 => Ok(None),
        _ => Ok(Some(FastqRead::new(record, mate))),
    }
}

/// FASTQ records from one file, or from an R1/R2 pair interleaved mate by mate
#[derive(Debug, Clone)]
pub struct FastqSource {
    r1: PathBuf,
    r2: Option<PathBuf>,
}

impl FastqSource {
    #[must_use]
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            r1: path.into(),
            r2: None,
        }
    }

    #[must_use]
    pub fn paired(r1: impl Into<PathBuf>, r2: impl Into<PathBuf>) -> Self {
        Self {
            r1: r1.into(),
            r2: Some(r2.into()),
        }
    }

    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.r2.is_some()
    }

    #[must_use]
    pub fn is_gzipped(&self) -> bool {
        is_gzipped(&self.r1)
    }
}

impl RecordSource for FastqSource {
    type Record = FastqRead;

    fn records(&self) -> io::Result<RecordStream<'_, FastqRead>> {
        let mut r1 = open_reader(&self.r1)?;

        let Some(r2_path) = &self.r2 else {
            return Ok(Box::new(std::iter::from_fn(move || {
                next_read(&mut r1, None).transpose()
            })));
        };

        let mut r2 = open_reader(r2_path)?;
        let mut pending: Option<FastqRead> = None;
        let mut done = false;
        Ok(Box::new(std::iter::from_fn(move || {
            if let Some(read) = pending.take() {
                return Some(Ok(read));
            }
            if done {
                return None;
            }

            let first = next_read(&mut r1, Some(Mate::R1));
            let second = next_read(&mut r2, Some(Mate::R2));
            match (first, second) {
                (Ok(Some(first)), Ok(Some(second))) => {
                    pending = Some(second);
                    Some(Ok(first))
                }
                (Ok(None), Ok(None)) => {
                    done = true;
                    None
                }
                (Err(e), _) | (_, Err(e)) => {
                    done = true;
                    Some(Err(e))
                }
                (Ok(_), Ok(_)) => {
                    done = true;
                    Some(Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "R1 and R2 files contain different numbers of records",
                    )))
                }
            }
        })))
    }
}

/// A plain or gzip-compressed output file
enum OutputStream {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl OutputStream {
    fn create(path: &Path, gzip: bool) -> io::Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(if gzip {
            Self::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            Self::Plain(file)
        })
    }

    fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut out) => out.flush(),
            Self::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(out) => out.write(buf),
            Self::Gzip(out) => out.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(out) => out.flush(),
            Self::Gzip(out) => out.flush(),
        }
    }
}

struct Bucket {
    r1: OutputStream,
    r2: Option<OutputStream>,
}

/// Per-category FASTQ files; paired runs get an `_R1`/`_R2` file per category
pub struct FastqSink {
    layout: OutputLayout,
    paired: bool,
    gzip: bool,
    buckets: HashMap<Category, Bucket>,
    created: Vec<PathBuf>,
}

impl FastqSink {
    #[must_use]
    pub fn new(layout: OutputLayout, paired: bool, gzip: bool) -> Self {
        Self {
            layout,
            paired,
            gzip,
            buckets: HashMap::new(),
            created: Vec::new(),
        }
    }

    fn create(&mut self, category: Category, mate: Option<Mate>) -> io::Result<OutputStream> {
        let path = self.layout.fastq_path(category, mate, self.gzip);
        let stream = OutputStream::create(&path, self.gzip)?;
        self.created.push(path);
        Ok(stream)
    }
}

impl RecordSink<FastqRead> for FastqSink {
    fn open(&mut self, categories: &[Category]) -> io::Result<()> {
        for &category in categories {
            let bucket = if self.paired {
                Bucket {
                    r1: self.create(category, Some(Mate::R1))?,
                    r2: Some(self.create(category, Some(Mate::R2))?),
                }
            } else {
                Bucket {
                    r1: self.create(category, None)?,
                    r2: None,
                }
            };
            self.buckets.insert(category, bucket);
        }
        Ok(())
    }

    fn write(&mut self, category: Category, read: &FastqRead) -> io::Result<()> {
        let bucket = self.buckets.get_mut(&category).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no output opened for category {category}"),
            )
        })?;

        let out = match (read.mate, bucket.r2.as_mut()) {
            (Some(Mate::R2), Some(r2)) => r2,
            _ => &mut bucket.r1,
        };
        fastq::io::Writer::new(out).write_record(&read.record)
    }

    fn finish(&mut self) -> io::Result<()> {
        for (_, bucket) in self.buckets.drain() {
            bucket.r1.finish()?;
            if let Some(r2) = bucket.r2 {
                r2.finish()?;
            }
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

/// Extraction over single-end or paired FASTQ input
pub struct FastqExtractor {
    config: ExtractorConfig,
    source: FastqSource,
    context: RunContext,
}

impl FastqExtractor {
    #[must_use]
    pub fn new(config: ExtractorConfig, source: FastqSource, context: RunContext) -> Self {
        Self {
            config,
            source,
            context,
        }
    }
}

impl Extractor for FastqExtractor {
    fn extract(&self) -> Result<ExtractionStatistics, ExtractError> {
        if self.config.search_softclipped {
            self.context
                .log
                .warn("FASTQ records carry no alignments; searching full read sequences");
        }

        let layout = OutputLayout::new(&self.config.output_dir, &self.config.output_prefix);
        let mut sink = FastqSink::new(
            layout,
            self.source.is_paired(),
            self.source.is_gzipped(),
        );
        run_extraction(&self.config, &self.context, &self.source, &mut sink)
    }
}
