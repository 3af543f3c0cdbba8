use std::cmp::Ordering;
use std::fmt::{self, Display};

use crate::errors::{RbpMapsError, Result};
use crate::models::Strand;

/// A stranded genomic interval, `[start, end)` with a 0-based inclusive start
/// and an exclusive end.
///
/// Construction goes through [`GenomicInterval::new`], which rejects empty or
/// inverted intervals; fields are only exposed through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomicInterval {
    chrom: String,
    start: u64,
    end: u64,
    strand: Strand,
}

impl GenomicInterval {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64, strand: Strand) -> Result<Self> {
        let chrom = chrom.into();
        if start >= end {
            return Err(RbpMapsError::MalformedFeature(format!(
                "interval {}:{}-{} has start >= end",
                chrom, start, end
            )));
        }
        Ok(GenomicInterval {
            chrom,
            start,
            end,
            strand,
        })
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Number of bases covered.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Always false, kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of bases strictly between `self` and `other`.
    ///
    /// Touching or overlapping intervals have a gap of zero.
    pub fn gap_to(&self, other: &GenomicInterval) -> u64 {
        if other.start >= self.end {
            other.start - self.end
        } else if self.start >= other.end {
            self.start - other.end
        } else {
            0
        }
    }

    /// Check if two intervals overlap
    #[inline]
    pub fn overlaps(&self, other: &GenomicInterval) -> bool {
        self.chrom == other.chrom && self.start < other.end && self.end > other.start
    }
}

impl Ord for GenomicInterval {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.chrom
            .cmp(&other.chrom)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
            .then(self.strand.is_minus().cmp(&other.strand.is_minus()))
    }
}

impl PartialOrd for GenomicInterval {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}:{}", self.chrom, self.start, self.end, self.strand)
    }
}
