//! Peak-based signal sources.
//!
//! A [`PeakSource`] turns peak calls into per-base values: each base gets an
//! aggregate of the scores of the peaks (on the queried strand) covering it,
//! or `0.0` when nothing covers it.

use std::io::BufRead;
use std::path::Path;

use fxhash::FxHashMap;
use log::info;

use rbpmaps_core::errors::{RbpMapsError, Result};
use rbpmaps_core::models::Strand;
use rbpmaps_core::utils::{get_dynamic_reader, is_comment_line};

use crate::SignalSource;

/// A scored, stranded peak `[start, end)` on one chromosome.
#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    pub start: u64,
    pub end: u64,
    pub score: f64,
    pub strand: Strand,
}

///
/// Per-chromosome peak index for overlap queries.
///
/// Peaks are sorted by start with a running maximum of ends, so a query scans
/// back from the last peak starting before the query end and stops as soon as
/// no earlier peak can reach the query start.
///
#[derive(Debug, Clone, Default)]
pub struct PeakIndex {
    chroms: FxHashMap<String, ChromPeaks>,
}

#[derive(Debug, Clone, Default)]
struct ChromPeaks {
    peaks: Vec<Peak>,
    max_ends: Vec<u64>,
}

impl ChromPeaks {
    fn build(mut peaks: Vec<Peak>) -> Self {
        peaks.sort_by_key(|p| (p.start, p.end));

        let mut max_ends = Vec::with_capacity(peaks.len());
        let mut running = 0;
        for peak in &peaks {
            running = running.max(peak.end);
            max_ends.push(running);
        }

        ChromPeaks { peaks, max_ends }
    }

    fn find_iter(&self, start: u64, end: u64) -> impl Iterator<Item = &Peak> {
        let last = self.peaks.partition_point(|p| p.start < end);
        (0..last)
            .rev()
            .take_while(move |&i| self.max_ends[i] > start)
            .map(move |i| &self.peaks[i])
            .filter(move |p| p.end > start)
    }
}

impl PeakIndex {
    pub fn build<S: Into<String>>(peaks: impl IntoIterator<Item = (S, Peak)>) -> Self {
        let mut by_chrom: FxHashMap<String, Vec<Peak>> = FxHashMap::default();
        for (chrom, peak) in peaks {
            by_chrom.entry(chrom.into()).or_default().push(peak);
        }

        PeakIndex {
            chroms: by_chrom
                .into_iter()
                .map(|(chrom, peaks)| (chrom, ChromPeaks::build(peaks)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.chroms.values().map(|c| c.peaks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Peaks on `strand` overlapping `[start, end)`, sorted by start.
    pub fn overlaps(&self, chrom: &str, start: u64, end: u64, strand: Strand) -> Vec<Peak> {
        let Some(chrom_peaks) = self.chroms.get(chrom) else {
            return Vec::new();
        };

        let mut hits: Vec<Peak> = chrom_peaks
            .find_iter(start, end)
            .filter(|p| p.strand == strand)
            .cloned()
            .collect();
        hits.reverse();
        hits
    }
}

/// How the scores of peaks covering the same base are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeakAggregation {
    /// add up every overlapping score
    #[default]
    Sum,
    /// keep the smallest overlapping score
    Min,
}

/// Significance thresholds for input-normalized peaks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakFilter {
    pub min_log10_pvalue: f64,
    pub min_log2_fold_change: f64,
}

impl Default for PeakFilter {
    fn default() -> Self {
        PeakFilter {
            min_log10_pvalue: 3.0,
            min_log2_fold_change: 3.0,
        }
    }
}

impl PeakFilter {
    pub fn passes(&self, log10_pvalue: f64, log2_fold_change: f64) -> bool {
        log10_pvalue >= self.min_log10_pvalue && log2_fold_change >= self.min_log2_fold_change
    }
}

/// Peaks exposed as a [`SignalSource`].
#[derive(Debug, Clone)]
pub struct PeakSource {
    index: PeakIndex,
    aggregation: PeakAggregation,
}

impl PeakSource {
    pub fn new(index: PeakIndex, aggregation: PeakAggregation) -> Self {
        PeakSource { index, aggregation }
    }

    ///
    /// Load input-normalized peaks and keep the significant ones.
    ///
    /// Expected columns: `chrom start end -log10(p) log2(fold) strand`. Kept
    /// peaks get a score of `1.0`, so summing counts the peaks covering a base.
    ///
    pub fn from_bed<P: AsRef<Path>>(path: P, filter: PeakFilter) -> Result<Self> {
        let reader = get_dynamic_reader(path.as_ref())?;

        let mut peaks = Vec::new();
        let mut n_total = 0usize;
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if is_comment_line(&line) {
                continue;
            }
            n_total += 1;

            let (chrom, peak, log10_pvalue, log2_fold_change) = parse_peak_line(&line, i + 1)?;
            if filter.passes(log10_pvalue, log2_fold_change) {
                peaks.push((chrom, Peak { score: 1.0, ..peak }));
            }
        }

        info!(
            "Kept {} of {} peaks from {}",
            peaks.len(),
            n_total,
            path.as_ref().display()
        );

        Ok(PeakSource::new(PeakIndex::build(peaks), PeakAggregation::Sum))
    }

    pub fn with_aggregation(mut self, aggregation: PeakAggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn index(&self) -> &PeakIndex {
        &self.index
    }

    /// Peaks on `strand` overlapping `[start, end)`.
    pub fn overlaps(&self, chrom: &str, start: u64, end: u64, strand: Strand) -> Vec<Peak> {
        self.index.overlaps(chrom, start, end, strand)
    }
}

impl SignalSource for PeakSource {
    fn values(&self, chrom: &str, start: u64, end: u64, strand: Strand) -> Vec<f64> {
        let len = end.saturating_sub(start) as usize;
        let mut values = vec![0.0; len];
        if len == 0 {
            return values;
        }

        let mut covered = vec![false; len];
        for peak in self.index.overlaps(chrom, start, end, strand) {
            let s = (peak.start.max(start) - start) as usize;
            let e = (peak.end.min(end) - start) as usize;
            for i in s..e {
                values[i] = match (self.aggregation, covered[i]) {
                    (_, false) => peak.score,
                    (PeakAggregation::Sum, true) => values[i] + peak.score,
                    (PeakAggregation::Min, true) => values[i].min(peak.score),
                };
                covered[i] = true;
            }
        }

        if strand.is_minus() {
            values.reverse();
        }
        values
    }
}

fn parse_peak_line(line: &str, line_no: usize) -> Result<(String, Peak, f64, f64)> {
    let fields: Vec<&str> = line.split('\t').map(|f| f.trim()).collect();
    if fields.len() < 6 {
        return Err(RbpMapsError::MalformedFeature(format!(
            "peak line {}: expected 6 columns, found {}",
            line_no,
            fields.len()
        )));
    }

    let number = |i: usize| -> Result<f64> {
        fields[i].parse::<f64>().map_err(|_| {
            RbpMapsError::MalformedFeature(format!(
                "peak line {}: can't parse '{}' as a number",
                line_no, fields[i]
            ))
        })
    };

    let coordinate = |i: usize| -> Result<u64> {
        fields[i].parse::<u64>().map_err(|_| {
            RbpMapsError::MalformedFeature(format!(
                "peak line {}: can't parse '{}' as a coordinate",
                line_no, fields[i]
            ))
        })
    };

    let start = coordinate(1)?;
    let end = coordinate(2)?;
    if start >= end {
        return Err(RbpMapsError::MalformedFeature(format!(
            "peak line {}: start >= end",
            line_no
        )));
    }

    let peak = Peak {
        start,
        end,
        score: 0.0,
        strand: fields[5].parse()?,
    };

    Ok((fields[0].to_string(), peak, number(3)?, number(4)?))
}
