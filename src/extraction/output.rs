use std::path::{Path, PathBuf};

use crate::matching::classifier::Category;

/// Which mate of a read pair a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mate {
    R1,
    R2,
}

impl Mate {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::R1 => "R1",
            Self::R2 => "R2",
        }
    }
}

/// Naming of every file a run writes into its output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    dir: PathBuf,
    prefix: String,
}

impl OutputLayout {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    /// `{dir}/{prefix}_{category}.bam`
    #[must_use]
    pub fn bam_path(&self, category: Category) -> PathBuf {
        self.dir.join(format!("{}_{category}.bam", self.prefix))
    }

    /// Index of the category's BAM file, `{dir}/{prefix}_{category}.bam.bai`
    #[must_use]
    pub fn bai_path(&self, category: Category) -> PathBuf {
        self.dir.join(format!("{}_{category}.bam.bai", self.prefix))
    }

    /// `{dir}/{prefix}_{category}[_{mate}].fastq[.gz]`
    #[must_use]
    pub fn fastq_path(&self, category: Category, mate: Option<Mate>, gzip: bool) -> PathBuf {
        let mate = mate.map_or(String::new(), |m| format!("_{}", m.label()));
        let extension = if gzip { "fastq.gz" } else { "fastq" };
        self.dir
            .join(format!("{}_{category}{mate}.{extension}", self.prefix))
    }

    #[must_use]
    pub fn stats_json_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}_extraction_stats.json", self.prefix))
    }

    #[must_use]
    pub fn stats_tsv_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}_extraction_stats.tsv", self.prefix))
    }
}
