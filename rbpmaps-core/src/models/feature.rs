use std::fmt::{self, Display};

use crate::errors::{RbpMapsError, Result};
use crate::models::{GenomicInterval, Strand};

///
/// A biological event made of one or more intervals on the same chromosome
/// and strand, stored in transcript (5' to 3') order.
///
/// A single site is one interval; a skipped exon is the upstream, cassette
/// and downstream exons.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    label: String,
    intervals: Vec<GenomicInterval>,
}

impl Feature {
    pub fn new(label: impl Into<String>, intervals: Vec<GenomicInterval>) -> Result<Self> {
        let label = label.into();
        let first = intervals.first().ok_or_else(|| {
            RbpMapsError::MalformedFeature(format!("feature '{}' has no intervals", label))
        })?;

        for interval in &intervals[1..] {
            if interval.chrom() != first.chrom() {
                return Err(RbpMapsError::MalformedFeature(format!(
                    "feature '{}' spans chromosomes {} and {}",
                    label,
                    first.chrom(),
                    interval.chrom()
                )));
            }
            if interval.strand() != first.strand() {
                return Err(RbpMapsError::MalformedFeature(format!(
                    "feature '{}' mixes strands",
                    label
                )));
            }
        }

        Ok(Feature { label, intervals })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn intervals(&self) -> &[GenomicInterval] {
        &self.intervals
    }

    /// Get the i-th interval in transcript order.
    pub fn interval(&self, i: usize) -> Option<&GenomicInterval> {
        self.intervals.get(i)
    }

    pub fn chrom(&self) -> &str {
        self.intervals[0].chrom()
    }

    pub fn strand(&self) -> Strand {
        self.intervals[0].strand()
    }

    /// Genomic span from the leftmost start to the rightmost end.
    pub fn span(&self) -> (u64, u64) {
        let start = self.intervals.iter().map(|i| i.start()).min().unwrap_or(0);
        let end = self.intervals.iter().map(|i| i.end()).max().unwrap_or(0);
        (start, end)
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = self.span();
        write!(f, "{}:{}-{}:{}", self.chrom(), start, end, self.strand())
    }
}

/// A feature, or the reason its annotation record could not become one.
///
/// Matrix builders count `Err` records as excluded instead of aborting.
pub type FeatureRecord = Result<Feature>;

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_feature_requires_intervals() {
        let result = Feature::new("empty", vec![]);
        assert!(matches!(result, Err(RbpMapsError::MalformedFeature(_))));
    }

    #[rstest]
    fn test_feature_rejects_mixed_strands() {
        let a = GenomicInterval::new("chr1", 100, 200, Strand::Plus).unwrap();
        let b = GenomicInterval::new("chr1", 300, 400, Strand::Minus).unwrap();
        assert!(Feature::new("mixed", vec![a, b]).is_err());
    }

    #[rstest]
    fn test_feature_rejects_mixed_chromosomes() {
        let a = GenomicInterval::new("chr1", 100, 200, Strand::Plus).unwrap();
        let b = GenomicInterval::new("chr2", 300, 400, Strand::Plus).unwrap();
        assert!(Feature::new("mixed", vec![a, b]).is_err());
    }

    #[rstest]
    fn test_feature_span_and_display() {
        let intervals = vec![
            GenomicInterval::new("chr3", 900, 1000, Strand::Minus).unwrap(),
            GenomicInterval::new("chr3", 500, 550, Strand::Minus).unwrap(),
            GenomicInterval::new("chr3", 100, 200, Strand::Minus).unwrap(),
        ];
        let feature = Feature::new("se_1", intervals).unwrap();

        assert_eq!(feature.span(), (100, 1000));
        assert_eq!(feature.to_string(), "chr3:100-1000:-");
        assert_eq!(feature.label(), "se_1");
        assert_eq!(feature.interval(1).unwrap().start(), 500);
    }
}
