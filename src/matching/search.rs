//! Pattern search over nucleotide sequences.
//!
//! Exact search is a plain leftmost substring scan. Fuzzy search computes, for
//! every end position in the text, the minimal number of edits (substitutions,
//! insertions, deletions) needed to align the whole pattern to some substring
//! ending there (semi-global alignment, Sellers' algorithm), tracking where that
//! substring starts.

/// A pattern occurrence in a text, as the half-open range `start..end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub start: usize,
    pub end: usize,
    pub edits: usize,
}

/// Cost and start of the best alignment ending at one text position
#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    cost: usize,
    start: usize,
}

/// Find the first occurrence of `pattern` within `max_edits` edits.
#[must_use]
pub fn find_first(text: &[u8], pattern: &[u8], max_edits: usize) -> Option<Hit> {
    if max_edits == 0 {
        exact_from(text, pattern, 0).map(|start| Hit {
            start,
            end: start + pattern.len(),
            edits: 0,
        })
    } else {
        fuzzy_hits(text, pattern, max_edits, true).into_iter().next()
    }
}

/// Find all non-overlapping occurrences of `pattern`, left to right.
#[must_use]
pub fn find_all(text: &[u8], pattern: &[u8], max_edits: usize) -> Vec<Hit> {
    if max_edits > 0 {
        return fuzzy_hits(text, pattern, max_edits, false);
    }

    let mut hits = Vec::new();
    let mut from = 0;
    while let Some(start) = exact_from(text, pattern, from) {
        let end = start + pattern.len();
        hits.push(Hit {
            start,
            end,
            edits: 0,
        });
        from = end;
    }
    hits
}

fn exact_from(text: &[u8], pattern: &[u8], from: usize) -> Option<usize> {
    if pattern.is_empty() || from >= text.len() || pattern.len() > text.len() - from {
        return None;
    }
    text[from..]
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|offset| offset + from)
}

/// Last DP row: best alignment of the full pattern ending after `j` text bytes.
fn last_row(text: &[u8], pattern: &[u8]) -> Vec<Cell> {
    let m = pattern.len();
    let mut prev: Vec<Cell> = (0..=m).map(|i| Cell { cost: i, start: 0 }).collect();
    let mut curr = vec![Cell::default(); m + 1];

    let mut row = Vec::with_capacity(text.len() + 1);
    row.push(prev[m]);

    for (j, &base) in text.iter().enumerate() {
        // A match may start at any text position for free
        curr[0] = Cell {
            cost: 0,
            start: j + 1,
        };
        for i in 1..=m {
            let diag = Cell {
                cost: prev[i - 1].cost + usize::from(pattern[i - 1] != base),
                start: prev[i - 1].start,
            };
            let deletion = Cell {
                cost: curr[i - 1].cost + 1,
                start: curr[i - 1].start,
            };
            let insertion = Cell {
                cost: prev[i].cost + 1,
                start: prev[i].start,
            };

            // Ties prefer the diagonal, then deletion, then insertion
            let mut best = diag;
            if deletion.cost < best.cost {
                best = deletion;
            }
            if insertion.cost < best.cost {
                best = insertion;
            }
            curr[i] = best;
        }
        row.push(curr[m]);
        std::mem::swap(&mut prev, &mut curr);
    }

    row
}

fn fuzzy_hits(text: &[u8], pattern: &[u8], max_edits: usize, first_only: bool) -> Vec<Hit> {
    if pattern.is_empty() {
        return Vec::new();
    }

    let row = last_row(text, pattern);
    let mut hits = Vec::new();
    let mut min_start = 0;
    let mut j = 1;

    while j < row.len() {
        let cell = row[j];
        if cell.cost > max_edits || cell.start < min_start || cell.start >= j {
            j += 1;
            continue;
        }

        // Extend while the next end position strictly lowers the edit count
        let mut end = j;
        while end + 1 < row.len() && row[end + 1].cost < row[end].cost {
            end += 1;
        }

        let best = row[end];
        if best.start < end {
            hits.push(Hit {
                start: best.start,
                end,
                edits: best.cost,
            });
            if first_only {
                break;
            }
        }
        min_start = end;
        j = end + 1;
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(start: usize, end: usize, edits: usize) -> Hit {
        Hit { start, end, edits }
    }

    #[test]
    fn test_exact_first_and_all() {
        assert_eq!(find_first(b"GGACGTTACGT", b"ACGT", 0), Some(hit(2, 6, 0)));
        assert_eq!(
            find_all(b"ACGTTACGT", b"ACGT", 0),
            vec![hit(0, 4, 0), hit(5, 9, 0)]
        );
        assert_eq!(find_first(b"GGGG", b"ACGT", 0), None);
        assert_eq!(find_first(b"AC", b"ACGT", 0), None);
    }

    #[test]
    fn test_exact_all_is_non_overlapping() {
        assert_eq!(
            find_all(b"AAAAA", b"AA", 0),
            vec![hit(0, 2, 0), hit(2, 4, 0)]
        );
    }

    #[test]
    fn test_fuzzy_substitution() {
        assert_eq!(
            find_first(b"TTACGTCCGTTT", b"ACGTACGT", 1),
            Some(hit(2, 10, 1))
        );
    }

    #[test]
    fn test_fuzzy_two_substitutions_exceed_budget() {
        assert_eq!(find_first(b"TTACGTCCCTTT", b"ACGTACGT", 1), None);
    }

    #[test]
    fn test_fuzzy_deletion() {
        // Text carries ACG-ACGT: one pattern base missing
        assert_eq!(
            find_first(b"GGACGACGTGG", b"ACGTACGT", 1),
            Some(hit(2, 9, 1))
        );
    }

    #[test]
    fn test_fuzzy_insertion() {
        // Text carries ACGT-T-ACGT: one extra base
        assert_eq!(
            find_first(b"TTACGTTACGTTT", b"ACGTACGT", 1),
            Some(hit(2, 11, 1))
        );
    }

    #[test]
    fn test_fuzzy_prefers_exact_placement() {
        // A 1-edit candidate ending one base early is extended to the exact match
        assert_eq!(
            find_first(b"TTACGTACGT", b"ACGTACGT", 1),
            Some(hit(2, 10, 0))
        );
    }

    #[test]
    fn test_fuzzy_all_non_overlapping() {
        assert_eq!(
            find_all(b"ACGTGGGGACCT", b"ACGT", 1),
            vec![hit(0, 4, 0), hit(8, 12, 1)]
        );
    }

    #[test]
    fn test_self_match_both_orientations() {
        let pattern = b"GATTACA";
        assert_eq!(find_first(pattern, pattern, 0), Some(hit(0, 7, 0)));
        assert_eq!(find_first(pattern, pattern, 2), Some(hit(0, 7, 0)));
    }
}
