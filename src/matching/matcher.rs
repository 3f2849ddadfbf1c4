use crate::core::barcode::{BarcodeMatch, BarcodeSpec};
use crate::core::types::OrientationType;
use crate::matching::search::{self, Hit};

fn to_match<'a>(
    sequence: &[u8],
    barcode: &'a BarcodeSpec,
    orientation: OrientationType,
    hit: Hit,
) -> BarcodeMatch<'a> {
    BarcodeMatch {
        barcode,
        orientation,
        position: hit.start,
        sequence: String::from_utf8_lossy(&sequence[hit.start..hit.end]).into_owned(),
        edits: hit.edits,
    }
}

/// First occurrence of one barcode in one orientation.
///
/// `sequence` must already be upper-cased.
#[must_use]
pub fn find_first_match<'a>(
    sequence: &[u8],
    barcode: &'a BarcodeSpec,
    orientation: OrientationType,
    max_mismatches: usize,
) -> Option<BarcodeMatch<'a>> {
    let pattern = barcode.pattern(orientation);
    search::find_first(sequence, &pattern, max_mismatches)
        .map(|hit| to_match(sequence, barcode, orientation, hit))
}

/// Find all barcode matches in a sequence.
///
/// Matches are reported per barcode in configuration order, forward hits
/// before reverse-complement hits, each left to right.
#[must_use]
pub fn find_barcode_matches<'a>(
    sequence: &[u8],
    barcodes: &'a [BarcodeSpec],
    max_mismatches: usize,
) -> Vec<BarcodeMatch<'a>> {
    let sequence = sequence.to_ascii_uppercase();
    let mut matches = Vec::new();

    for barcode in barcodes {
        for orientation in OrientationType::SEARCHED {
            let pattern = barcode.pattern(orientation);
            matches.extend(
                search::find_all(&sequence, &pattern, max_mismatches)
                    .into_iter()
                    .map(|hit| to_match(&sequence, barcode, orientation, hit)),
            );
        }
    }

    matches
}

/// Find the match with the fewest edits across all barcodes and orientations.
///
/// Ties keep the first match encountered in barcode order, forward before
/// reverse complement.
#[must_use]
pub fn find_best_barcode_match<'a>(
    sequence: &[u8],
    barcodes: &'a [BarcodeSpec],
    max_mismatches: usize,
) -> Option<BarcodeMatch<'a>> {
    let mut best: Option<BarcodeMatch<'a>> = None;

    for candidate in find_barcode_matches(sequence, barcodes, max_mismatches) {
        let better = best
            .as_ref()
            .map_or(true, |current| candidate.edits < current.edits);
        if better {
            // Nothing beats an exact match
            let exact = candidate.edits == 0;
            best = Some(candidate);
            if exact {
                break;
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequence::reverse_complement_str;
    use crate::core::types::BarcodeLocation;

    fn barcode(seq: &str) -> BarcodeSpec {
        BarcodeSpec::new(seq, BarcodeLocation::Unknown).unwrap()
    }

    #[test]
    fn test_barcode_matches_itself() {
        for seq in ["ACGT", "GGATCCTA", "TTTTNAAA"] {
            let bc = barcode(seq);
            let forward = find_first_match(seq.as_bytes(), &bc, OrientationType::Forward, 0)
                .expect("forward self match");
            assert_eq!(forward.position, 0);
            assert_eq!(forward.sequence, seq);

            let rc = reverse_complement_str(seq).unwrap();
            let reverse = find_first_match(
                rc.as_bytes(),
                &bc,
                OrientationType::ReverseComplement,
                0,
            )
            .expect("reverse complement self match");
            assert_eq!(reverse.position, 0);
        }
    }

    #[test]
    fn test_find_barcode_matches_lowercase_input() {
        let barcodes = vec![barcode("ACGT"), barcode("GGCC")];
        // ACGT and GGCC are both their own reverse complement
        let matches = find_barcode_matches(b"acgtttggcc", &barcodes, 0);

        let summary: Vec<(&str, OrientationType, usize)> = matches
            .iter()
            .map(|m| (m.barcode.name(), m.orientation, m.position))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("ACGT", OrientationType::Forward, 0),
                ("ACGT", OrientationType::ReverseComplement, 0),
                ("GGCC", OrientationType::Forward, 6),
                ("GGCC", OrientationType::ReverseComplement, 6),
            ]
        );
    }

    #[test]
    fn test_find_barcode_matches_fuzzy_sequence() {
        let barcodes = vec![barcode("ACGTACGT")];
        let matches = find_barcode_matches(b"TTACGTCCGTTT", &barcodes, 1);
        // ACGTACGT is its own reverse complement, so both orientations hit
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].orientation, OrientationType::Forward);
        assert_eq!(matches[1].orientation, OrientationType::ReverseComplement);
        for m in &matches {
            assert_eq!(m.sequence, "ACGTCCGT");
            assert_eq!(m.edits, 1);
            assert_eq!(m.position, 2);
        }
    }

    #[test]
    fn test_best_match_prefers_fewest_edits() {
        let barcodes = vec![barcode("AAAACCCC"), barcode("TCTCAGAG")];
        // First barcode matches with one substitution, second exactly
        let sequence = b"AAAACCGCNNTCTCAGAG";
        let best = find_best_barcode_match(sequence, &barcodes, 1).unwrap();
        assert_eq!(best.barcode.name(), "TCTCAGAG");
        assert_eq!(best.edits, 0);
        assert_eq!(best.position, 10);
    }

    #[test]
    fn test_best_match_tie_keeps_first() {
        let barcodes = vec![barcode("ACGTAC"), barcode("TTGGCA")];
        let best = find_best_barcode_match(b"ACGTACTTGGCA", &barcodes, 0).unwrap();
        assert_eq!(best.barcode.name(), "ACGTAC");
        assert_eq!(find_best_barcode_match(b"CCCCCC", &barcodes, 0), None);
    }
}
