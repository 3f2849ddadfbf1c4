use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::core::barcode::BarcodeMatch;
use crate::matching::classifier::Category;

/// Safely convert a count to f64 for rate calculations
#[inline]
fn count_to_f64(count: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Counters keyed by label, iterated in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedCounts {
    entries: Vec<(String, u64)>,
}

impl OrderedCounts {
    /// Add `count` to `key`, appending the key if it is new.
    ///
    /// Key sets here are tiny (barcodes, orientations, categories), so a linear
    /// scan is used.
    pub fn add(&mut self, key: &str, count: u64) {
        if let Some((_, value)) = self.entries.iter_mut().find(|(k, _)| k == key) {
            *value += count;
        } else {
            self.entries.push((key.to_string(), count));
        }
    }

    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    pub fn get(&self, key: &str) -> u64 {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map_or(0, |(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for OrderedCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Statistics collected during one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStatistics {
    total_reads: u64,
    total_barcode_matches: u64,
    no_barcode_count: u64,
    matches_by_barcode: OrderedCounts,
    matches_by_orientation: OrderedCounts,
    matches_by_category: OrderedCounts,
}

/// Flat, serializable view of [`ExtractionStatistics`]
#[derive(Debug, Serialize)]
pub struct StatisticsReport<'a> {
    pub total_reads: u64,
    pub total_barcode_matches: u64,
    pub matches_by_barcode: &'a OrderedCounts,
    pub matches_by_orientation: &'a OrderedCounts,
    pub matches_by_category: &'a OrderedCounts,
    pub no_barcode_count: u64,
    pub match_rate: f64,
}

impl ExtractionStatistics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one classified read (identifier)
    pub fn record_read(&mut self) {
        self.total_reads += 1;
    }

    /// Update all match counters for one barcode match
    pub fn update_barcode_match(&mut self, barcode_match: &BarcodeMatch<'_>, category: Category) {
        self.total_barcode_matches += 1;
        self.matches_by_barcode
            .increment(barcode_match.barcode.name());
        self.matches_by_orientation
            .increment(barcode_match.orientation.label());
        self.matches_by_category.increment(&category.to_string());
    }

    pub fn record_no_barcode(&mut self) {
        self.no_barcode_count += 1;
    }

    /// Fold another shard into this one.
    ///
    /// Keys first seen in `other` are appended after this shard's keys, so
    /// merging shards in input order reproduces the sequential key order.
    pub fn merge(&mut self, other: &Self) {
        self.total_reads += other.total_reads;
        self.total_barcode_matches += other.total_barcode_matches;
        self.no_barcode_count += other.no_barcode_count;
        for (key, count) in other.matches_by_barcode.iter() {
            self.matches_by_barcode.add(key, count);
        }
        for (key, count) in other.matches_by_orientation.iter() {
            self.matches_by_orientation.add(key, count);
        }
        for (key, count) in other.matches_by_category.iter() {
            self.matches_by_category.add(key, count);
        }
    }

    pub fn total_reads(&self) -> u64 {
        self.total_reads
    }

    pub fn total_barcode_matches(&self) -> u64 {
        self.total_barcode_matches
    }

    pub fn no_barcode_count(&self) -> u64 {
        self.no_barcode_count
    }

    pub fn matches_by_barcode(&self) -> &OrderedCounts {
        &self.matches_by_barcode
    }

    pub fn matches_by_orientation(&self) -> &OrderedCounts {
        &self.matches_by_orientation
    }

    pub fn matches_by_category(&self) -> &OrderedCounts {
        &self.matches_by_category
    }

    /// Fraction of reads with a barcode; 0 when no reads were seen
    pub fn match_rate(&self) -> f64 {
        if self.total_reads == 0 {
            0.0
        } else {
            count_to_f64(self.total_barcode_matches) / count_to_f64(self.total_reads)
        }
    }

    pub fn report(&self) -> StatisticsReport<'_> {
        StatisticsReport {
            total_reads: self.total_reads,
            total_barcode_matches: self.total_barcode_matches,
            matches_by_barcode: &self.matches_by_barcode,
            matches_by_orientation: &self.matches_by_orientation,
            matches_by_category: &self.matches_by_category,
            no_barcode_count: self.no_barcode_count,
            match_rate: self.match_rate(),
        }
    }

    /// Export statistics as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.report())
    }

    /// Write the tabular form: a `Metric/Value` block followed by
    /// `Barcode/Count`, `Orientation/Count` and `Category/Count` sections.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_tsv<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Metric\tValue")?;
        writeln!(out, "TotalReads\t{}", self.total_reads)?;
        writeln!(out, "TotalBarcodeMatches\t{}", self.total_barcode_matches)?;
        writeln!(out, "NoBarcodeCount\t{}", self.no_barcode_count)?;
        writeln!(out, "MatchRate\t{:.4}", self.match_rate())?;

        let sections = [
            ("Barcode", &self.matches_by_barcode),
            ("Orientation", &self.matches_by_orientation),
            ("Category", &self.matches_by_category),
        ];
        for (title, counts) in sections {
            writeln!(out)?;
            writeln!(out, "{title}\tCount")?;
            for (key, count) in counts.iter() {
                writeln!(out, "{key}\t{count}")?;
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn to_tsv(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_tsv(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Save statistics as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_json(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(io::Error::other)?;
        std::fs::write(path, json + "\n")
    }

    /// Save statistics as TSV.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_tsv(&self, path: &Path) -> io::Result<()> {
        let mut out = BufWriter::new(std::fs::File::create(path)?);
        self.write_tsv(&mut out)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::barcode::BarcodeSpec;
    use crate::core::types::{BarcodeLocation, OrientationType};

    fn sample() -> ExtractionStatistics {
        let bc5 = BarcodeSpec::new("ACGT", BarcodeLocation::FivePrime)
            .unwrap()
            .with_name("bc5");
        let bc3 = BarcodeSpec::new("TTTT", BarcodeLocation::ThreePrime)
            .unwrap()
            .with_name("bc3");

        let mut stats = ExtractionStatistics::new();
        for (barcode, orientation) in [
            (&bc5, OrientationType::Forward),
            (&bc3, OrientationType::Forward),
            (&bc5, OrientationType::ReverseComplement),
        ] {
            let m = BarcodeMatch {
                barcode,
                orientation,
                position: 0,
                sequence: barcode.sequence().to_string(),
                edits: 0,
            };
            stats.record_read();
            stats.update_barcode_match(
                &m,
                Category::Barcode {
                    location: barcode.location(),
                    orientation,
                },
            );
        }
        stats.record_read();
        stats.record_no_barcode();
        stats
    }

    #[test]
    fn test_counters_and_invariant() {
        let stats = sample();
        assert_eq!(stats.total_reads(), 4);
        assert_eq!(stats.total_barcode_matches(), 3);
        assert_eq!(stats.no_barcode_count(), 1);
        assert_eq!(stats.matches_by_barcode().get("bc5"), 2);
        assert_eq!(stats.matches_by_orientation().get("RC"), 1);
        assert_eq!(stats.matches_by_category().get("barcode3_orientFR"), 1);
        assert_eq!(
            stats.total_barcode_matches(),
            stats.matches_by_category().total()
        );
        assert_eq!(
            stats.total_barcode_matches(),
            stats.matches_by_barcode().total()
        );
    }

    #[test]
    fn test_match_rate() {
        assert!((sample().match_rate() - 0.75).abs() < f64::EPSILON);
        assert!(ExtractionStatistics::new().match_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_keeps_insertion_order() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_reads"], 4);
        assert_eq!(value["total_barcode_matches"], 3);
        assert_eq!(value["no_barcode_count"], 1);
        assert_eq!(value["match_rate"], 0.75);
        assert_eq!(value["matches_by_category"]["barcode5_orientRC"], 1);

        let bc5 = json.find("\"barcode5_orientFR\"").unwrap();
        let bc3 = json.find("\"barcode3_orientFR\"").unwrap();
        let rc = json.find("\"barcode5_orientRC\"").unwrap();
        assert!(bc5 < bc3 && bc3 < rc);
    }

    #[test]
    fn test_tsv_layout() {
        let tsv = sample().to_tsv();
        let expected = "Metric\tValue\n\
                        TotalReads\t4\n\
                        TotalBarcodeMatches\t3\n\
                        NoBarcodeCount\t1\n\
                        MatchRate\t0.7500\n\
                        \n\
                        Barcode\tCount\n\
                        bc5\t2\n\
                        bc3\t1\n\
                        \n\
                        Orientation\tCount\n\
                        FR\t2\n\
                        RC\t1\n\
                        \n\
                        Category\tCount\n\
                        barcode5_orientFR\t1\n\
                        barcode3_orientFR\t1\n\
                        barcode5_orientRC\t1\n";
        assert_eq!(tsv, expected);
    }

    #[test]
    fn test_empty_statistics_tsv() {
        let tsv = ExtractionStatistics::new().to_tsv();
        assert!(tsv.contains("TotalReads\t0\n"));
        assert!(tsv.contains("MatchRate\t0.0000\n"));
    }

    #[test]
    fn test_merge_sums_and_preserves_order() {
        let mut left = sample();
        let right = sample();
        left.merge(&right);
        assert_eq!(left.total_reads(), 8);
        assert_eq!(left.total_barcode_matches(), 6);
        assert_eq!(left.no_barcode_count(), 2);
        let keys: Vec<&str> = left.matches_by_barcode().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["bc5", "bc3"]);

        let mut empty = ExtractionStatistics::new();
        empty.merge(&sample());
        assert_eq!(empty, sample());
    }
}
