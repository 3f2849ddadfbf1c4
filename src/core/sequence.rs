//! Nucleotide sequence primitives.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Invalid nucleotide '{base}' at position {position}")]
    InvalidBase { base: char, position: usize },

    #[error("Sequences must have the same length ({left} != {right})")]
    LengthMismatch { left: usize, right: usize },
}

/// Bases accepted in barcode sequences
pub const VALID_BASES: &[u8] = b"ACGTN";

/// Complement of a single base, preserving case. `None` outside {A,C,G,T,N}.
#[must_use]
pub fn complement_base(base: u8) -> Option<u8> {
    match base {
        b'A' => Some(b'T'),
        b'T' => Some(b'A'),
        b'C' => Some(b'G'),
        b'G' => Some(b'C'),
        b'N' => Some(b'N'),
        b'a' => Some(b't'),
        b't' => Some(b'a'),
        b'c' => Some(b'g'),
        b'g' => Some(b'c'),
        b'n' => Some(b'n'),
        _ => None,
    }
}

/// Reverse complement of a DNA sequence.
///
/// # Errors
///
/// Returns `SequenceError::InvalidBase` for any character outside {A,C,G,T,N}
/// (either case).
pub fn reverse_complement(sequence: &[u8]) -> Result<Vec<u8>, SequenceError> {
    let mut out = Vec::with_capacity(sequence.len());
    for (position, &base) in sequence.iter().enumerate().rev() {
        let complement = complement_base(base).ok_or(SequenceError::InvalidBase {
            base: char::from(base),
            position,
        })?;
        out.push(complement);
    }
    Ok(out)
}

/// String form of [`reverse_complement`].
///
/// # Errors
///
/// Returns `SequenceError::InvalidBase` when the input is not a DNA sequence.
pub fn reverse_complement_str(sequence: &str) -> Result<String, SequenceError> {
    let rc = reverse_complement(sequence.as_bytes())?;
    // Only ASCII bases survive reverse_complement
    Ok(rc.into_iter().map(char::from).collect())
}

/// Number of positions at which two equal-length sequences differ.
///
/// # Errors
///
/// Returns `SequenceError::LengthMismatch` if the sequences differ in length.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> Result<usize, SequenceError> {
    if a.len() != b.len() {
        return Err(SequenceError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).filter(|(x, y)| x != y).count())
}
