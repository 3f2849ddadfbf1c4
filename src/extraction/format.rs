use std::path::{Path, PathBuf};

use thiserror::Error;

/// Read file formats the extractors understand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Bam,
    Fastq,
}

impl InputFormat {
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Bam => "BAM",
            Self::Fastq => "FASTQ",
        }
    }
}

/// Resolved set of input files for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inputs {
    Bam(PathBuf),
    Fastq(PathBuf),
    PairedFastq { r1: PathBuf, r2: PathBuf },
}

impl Inputs {
    #[must_use]
    pub fn format(&self) -> InputFormat {
        match self {
            Self::Bam(_) => InputFormat::Bam,
            Self::Fastq(_) | Self::PairedFastq { .. } => InputFormat::Fastq,
        }
    }
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("No input files given")]
    NoInputs,

    #[error("Input not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported input format: {0} (expected .bam, .fastq, .fq, .fastq.gz or .fq.gz)")]
    UnknownFormat(PathBuf),

    #[error("Cannot mix BAM and FASTQ inputs")]
    MixedFormats,

    #[error("Only one BAM file can be processed at a time")]
    MultipleBam,

    #[error("Expected one or two FASTQ files, got {0}")]
    TooManyFastq(usize),

    #[error("No R1/R2 FASTQ pair found in directory {0}")]
    NoPairInDirectory(PathBuf),

    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Detect the format of a read file from its name alone
#[must_use]
pub fn detect_format(path: &Path) -> Option<InputFormat> {
    let name = path.file_name()?.to_str()?.to_lowercase();

    if name.ends_with(".bam") {
        return Some(InputFormat::Bam);
    }

    let stem = name.strip_suffix(".gz").unwrap_or(&name);
    if stem.ends_with(".fastq") || stem.ends_with(".fq") {
        return Some(InputFormat::Fastq);
    }

    None
}

/// Whether a path names a gzip-compressed file
#[must_use]
pub fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Turn command-line input paths into a single run input.
///
/// | Paths | Result |
/// |-------|--------|
/// | one `.bam` | `Inputs::Bam` |
/// | one FASTQ | `Inputs::Fastq` |
/// | two FASTQ | `Inputs::PairedFastq` in the given order |
/// | one directory | the R1/R2 FASTQ pair inside it |
///
/// # Errors
///
/// Returns an `InputError` for missing paths, unknown or mixed formats, or an
/// unsupported number of files.
pub fn resolve_inputs(paths: &[PathBuf]) -> Result<Inputs, InputError> {
    if let [dir] = paths {
        if dir.is_dir() {
            return find_pair_in_directory(dir);
        }
    }

    let mut formats = Vec::with_capacity(paths.len());
    for path in paths {
        if !path.exists() {
            return Err(InputError::NotFound(path.clone()));
        }
        let format = detect_format(path).ok_or_else(|| InputError::UnknownFormat(path.clone()))?;
        formats.push(format);
    }

    if formats.contains(&InputFormat::Bam) && formats.contains(&InputFormat::Fastq) {
        return Err(InputError::MixedFormats);
    }

    match (paths, formats.first()) {
        ([], _) => Err(InputError::NoInputs),
        ([bam], Some(InputFormat::Bam)) => Ok(Inputs::Bam(bam.clone())),
        (_, Some(InputFormat::Bam)) => Err(InputError::MultipleBam),
        ([fastq], _) => Ok(Inputs::Fastq(fastq.clone())),
        ([r1, r2], _) => Ok(Inputs::PairedFastq {
            r1: r1.clone(),
            r2: r2.clone(),
        }),
        _ => Err(InputError::TooManyFastq(paths.len())),
    }
}

/// Mate-2 file name for a mate-1 name, if it follows a known convention
fn mate_name(r1_name: &str) -> Option<String> {
    for (r1_tag, r2_tag) in [("_R1", "_R2"), ("_1.", "_2.")] {
        if let Some(pos) = r1_name.rfind(r1_tag) {
            let mut r2_name = r1_name.to_string();
            r2_name.replace_range(pos..pos + r1_tag.len(), r2_tag);
            return Some(r2_name);
        }
    }
    None
}

fn find_pair_in_directory(dir: &Path) -> Result<Inputs, InputError> {
    let entries = std::fs::read_dir(dir).map_err(|source| InputError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| InputError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && detect_format(&path) == Some(InputFormat::Fastq) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    for name in &names {
        if let Some(mate) = mate_name(name) {
            if &mate != name && names.contains(&mate) {
                return Ok(Inputs::PairedFastq {
                    r1: dir.join(name),
                    r2: dir.join(mate),
                });
            }
        }
    }

    Err(InputError::NoPairInDirectory(dir.to_path_buf()))
}
