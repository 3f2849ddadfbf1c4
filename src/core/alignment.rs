//! Alignment metadata needed to locate soft-clipped read flanks.

/// CIGAR operation kinds, mirroring the SAM specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarKind {
    Match,
    Insertion,
    Deletion,
    Skip,
    SoftClip,
    HardClip,
    Pad,
    SequenceMatch,
    SequenceMismatch,
}

/// A single (operation, length) pair of a CIGAR string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarOp {
    pub kind: CigarKind,
    pub len: usize,
}

impl CigarOp {
    #[must_use]
    pub fn new(kind: CigarKind, len: usize) -> Self {
        Self { kind, len }
    }
}

/// Strand and CIGAR of an aligned record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    pub is_unmapped: bool,
    pub is_reverse: bool,
    pub cigar: Vec<CigarOp>,
}

impl Alignment {
    #[must_use]
    pub fn forward(cigar: Vec<CigarOp>) -> Self {
        Self {
            is_unmapped: false,
            is_reverse: false,
            cigar,
        }
    }

    #[must_use]
    pub fn reverse(cigar: Vec<CigarOp>) -> Self {
        Self {
            is_unmapped: false,
            is_reverse: true,
            cigar,
        }
    }

    #[must_use]
    pub fn unmapped() -> Self {
        Self {
            is_unmapped: true,
            ..Self::default()
        }
    }
}

/// Soft-clipped flank at the read's 5' end.
///
/// Forward-strand reads return the leading clip (first CIGAR op), reverse-strand
/// reads the trailing clip (last CIGAR op). Returns an empty slice for unmapped reads, an empty CIGAR, or when the
/// relevant end is not a soft clip.
#[must_use]
pub fn extract_softclip_region<'s>(sequence: &'s [u8], alignment: &Alignment) -> &'s [u8] {
    if alignment.is_unmapped {
        return &[];
    }

    let op = if alignment.is_reverse {
        alignment.cigar.last()
    } else {
        alignment.cigar.first()
    };

    match op {
        Some(op) if op.kind == CigarKind::SoftClip => {
            let len = op.len.min(sequence.len());
            if alignment.is_reverse {
                &sequence[sequence.len() - len..]
            } else {
                &sequence[..len]
            }
        }
        _ => &[],
    }
}
