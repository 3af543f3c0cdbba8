//! Feature-relative windows over a [`SignalSource`].
//!
//! All boundary arithmetic happens in genomic coordinates. The signal is then
//! read once per window, already in feature orientation, and padded on both
//! sides so every window of a kind has the same width.

use rbpmaps_core::models::{GenomicInterval, Strand, WindowSpec};
use rbpmaps_signal::{SignalSource, is_sentinel, sentinel_fill};

/// Which end of an exon a splice-site window is centred on, in transcript
/// orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    /// Intron into exon: the 3' splice site at the exon start.
    FivePrime,
    /// Exon into intron: the 5' splice site at the exon end.
    ThreePrime,
}

/// One splice site to project.
#[derive(Debug, Clone, Copy)]
pub struct SiteQuery<'a> {
    /// The exon whose boundary is windowed.
    pub interval: &'a GenomicInterval,
    /// The interval on the far side of the flanking intron, if known.
    pub neighbor: Option<&'a GenomicInterval>,
    pub kind: SiteKind,
    /// The other end of `interval` is windowed too, so the exon is shared.
    pub paired: bool,
}

impl<'a> SiteQuery<'a> {
    pub fn new(interval: &'a GenomicInterval, kind: SiteKind) -> Self {
        SiteQuery {
            interval,
            neighbor: None,
            kind,
            paired: false,
        }
    }

    pub fn with_neighbor(mut self, neighbor: &'a GenomicInterval) -> Self {
        self.neighbor = Some(neighbor);
        self
    }

    pub fn paired(mut self, paired: bool) -> Self {
        self.paired = paired;
        self
    }
}

/// A projected window in feature orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub values: Vec<f64>,
    /// Sentinel positions added before the data.
    pub left_pad: usize,
    /// Sentinel positions added after the data.
    pub right_pad: usize,
}

impl Projection {
    pub fn width(&self) -> usize {
        self.values.len()
    }

    /// Positions that were read from the source rather than padded.
    pub fn n_read(&self) -> usize {
        self.width() - self.left_pad - self.right_pad
    }

    pub fn is_all_sentinel(&self) -> bool {
        self.values.iter().all(|v| is_sentinel(*v))
    }
}

/// Side of the exon boundary the intron lies on, in genomic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// What to read and how much to pad, in genomic orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReadPlan {
    left_pad: u64,
    start: u64,
    end: u64,
    right_pad: u64,
}

impl ReadPlan {
    /// Read `reach_left`/`reach_right` bases around `boundary` inside a window
    /// of `width_left + width_right`. Bases below zero become pads.
    fn around(boundary: u64, reach_left: u64, reach_right: u64, width_left: u64, width_right: u64) -> Self {
        let floored = reach_left.min(boundary);
        ReadPlan {
            left_pad: width_left - floored,
            start: boundary - floored,
            end: boundary + reach_right,
            right_pad: width_right - reach_right,
        }
    }
}

/// Part of a span of `len` bases belonging to the half on `side`.
///
/// The span splits at `len / 2`; an odd middle base goes to the right half.
fn half(len: u64, side: Side) -> u64 {
    match side {
        Side::Left => len / 2,
        Side::Right => len - len / 2,
    }
}

///
/// Turns features plus a [`WindowSpec`] into fixed-width, sentinel-padded
/// value vectors.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateProjector {
    spec: WindowSpec,
}

impl CoordinateProjector {
    pub fn new(spec: WindowSpec) -> Self {
        CoordinateProjector { spec }
    }

    pub fn spec(&self) -> &WindowSpec {
        &self.spec
    }

    /// Width of every splice-site projection.
    pub fn site_width(&self) -> usize {
        self.spec.site_width()
    }

    /// Width of the interval projection for `interval`, before any flooring.
    pub fn interval_width(&self, interval: &GenomicInterval) -> usize {
        (self.spec.left_margin + interval.len() + self.spec.right_margin) as usize
    }

    pub fn project_site<S: SignalSource + ?Sized>(&self, source: &S, query: &SiteQuery) -> Projection {
        let plan = self.site_plan(query);
        Self::read(source, query.interval, plan)
    }

    pub fn project_interval<S: SignalSource + ?Sized>(
        &self,
        source: &S,
        interval: &GenomicInterval,
    ) -> Projection {
        let plan = self.interval_plan(interval);
        Self::read(source, interval, plan)
    }

    fn site_plan(&self, query: &SiteQuery) -> ReadPlan {
        let interval = query.interval;
        let intron_side = match (query.kind, interval.strand()) {
            (SiteKind::FivePrime, Strand::Plus) | (SiteKind::ThreePrime, Strand::Minus) => Side::Left,
            (SiteKind::ThreePrime, Strand::Plus) | (SiteKind::FivePrime, Strand::Minus) => Side::Right,
        };

        let intron_reach = self.intron_reach(interval, query.neighbor, intron_side);
        let exon_reach = self.exon_reach(interval, query.paired, intron_side);
        let (exon, intron) = (self.spec.exon_offset, self.spec.intron_offset);

        match intron_side {
            Side::Left => ReadPlan::around(interval.start(), intron_reach, exon_reach, intron, exon),
            Side::Right => ReadPlan::around(interval.end(), exon_reach, intron_reach, exon, intron),
        }
    }

    fn intron_reach(&self, interval: &GenomicInterval, neighbor: Option<&GenomicInterval>, side: Side) -> u64 {
        let offset = self.spec.intron_offset;
        let Some(neighbor) = neighbor else {
            return offset;
        };

        // a neighbour on the wrong side (or overlapping) leaves no intron
        let gap = match side {
            Side::Left => interval.start().saturating_sub(neighbor.end()),
            Side::Right => neighbor.start().saturating_sub(interval.end()),
        };

        // the intron's right half belongs to the site on its right
        let own_half = match side {
            Side::Left => half(gap, Side::Right),
            Side::Right => half(gap, Side::Left),
        };

        if self.spec.middle_stop {
            offset.min(own_half)
        } else if self.spec.truncate {
            offset.min(gap)
        } else {
            offset
        }
    }

    fn exon_reach(&self, interval: &GenomicInterval, paired: bool, intron_side: Side) -> u64 {
        let offset = self.spec.exon_offset;

        // both ends of a windowed exon split it at the midpoint, whatever the
        // clipping flags; a site at the exon start owns the exon's left half
        if paired {
            return offset.min(half(interval.len(), intron_side));
        }

        if self.spec.clips() {
            offset.min(interval.len())
        } else {
            offset
        }
    }

    fn interval_plan(&self, interval: &GenomicInterval) -> ReadPlan {
        // the left margin is upstream in transcript orientation
        let (upstream, downstream) = (self.spec.left_margin, self.spec.right_margin);
        let (left, right) = match interval.strand() {
            Strand::Plus => (upstream, downstream),
            Strand::Minus => (downstream, upstream),
        };

        let floored = left.min(interval.start());
        ReadPlan {
            left_pad: left - floored,
            start: interval.start() - floored,
            end: interval.end() + right,
            right_pad: 0,
        }
    }

    fn read<S: SignalSource + ?Sized>(source: &S, interval: &GenomicInterval, plan: ReadPlan) -> Projection {
        let strand = interval.strand();
        let len = (plan.end - plan.start) as usize;

        let mut data = if len > 0 {
            source.values(interval.chrom(), plan.start, plan.end, strand)
        } else {
            Vec::new()
        };
        if data.len() != len {
            data = sentinel_fill(len);
        }

        // the source already reversed the data; the pads swap sides with it
        let (left_pad, right_pad) = match strand {
            Strand::Plus => (plan.left_pad as usize, plan.right_pad as usize),
            Strand::Minus => (plan.right_pad as usize, plan.left_pad as usize),
        };

        let mut values = Vec::with_capacity(left_pad + len + right_pad);
        values.extend(sentinel_fill(left_pad));
        values.extend(data);
        values.extend(sentinel_fill(right_pad));

        Projection {
            values,
            left_pad,
            right_pad,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rbpmaps_signal::{MemoryTrack, StrandedSignal};
    use rstest::*;

    /// Value at each base is its own coordinate: forward positive, reverse negative.
    #[fixture]
    fn source() -> StrandedSignal<MemoryTrack> {
        let forward = MemoryTrack::from_chroms(vec![("chr1", (0..2000).map(|v| v as f64).collect())]);
        let reverse = MemoryTrack::from_chroms(vec![("chr1", (0..2000).map(|v| -(v as f64)).collect())]);
        StrandedSignal::new(forward, reverse)
    }

    fn iv(start: u64, end: u64, strand: Strand) -> GenomicInterval {
        GenomicInterval::new("chr1", start, end, strand).unwrap()
    }

    fn spec(exon: u64, intron: u64, truncate: bool, middle_stop: bool) -> WindowSpec {
        WindowSpec {
            exon_offset: exon,
            intron_offset: intron,
            truncate,
            middle_stop,
            ..Default::default()
        }
    }

    fn coords(values: &[f64]) -> Vec<f64> {
        values.iter().copied().filter(|v| !v.is_nan()).collect()
    }

    #[rstest]
    fn test_five_prime_plus_reads_intron_then_exon(source: StrandedSignal<MemoryTrack>) {
        let projector = CoordinateProjector::new(spec(3, 4, true, false));
        let exon = iv(100, 200, Strand::Plus);

        let projection = projector.project_site(&source, &SiteQuery::new(&exon, SiteKind::FivePrime));
        assert_eq!(projection.values, vec![96.0, 97.0, 98.0, 99.0, 100.0, 101.0, 102.0]);
        assert_eq!((projection.left_pad, projection.right_pad), (0, 0));
    }

    #[rstest]
    fn test_three_prime_plus_reads_exon_then_intron(source: StrandedSignal<MemoryTrack>) {
        let projector = CoordinateProjector::new(spec(3, 4, true, false));
        let exon = iv(100, 200, Strand::Plus);

        let projection = projector.project_site(&source, &SiteQuery::new(&exon, SiteKind::ThreePrime));
        assert_eq!(projection.values, vec![197.0, 198.0, 199.0, 200.0, 201.0, 202.0, 203.0]);
    }

    #[rstest]
    fn test_minus_strand_is_the_reversed_reverse_track(source: StrandedSignal<MemoryTrack>) {
        let projector = CoordinateProjector::new(spec(3, 4, true, false));
        let exon = iv(100, 200, Strand::Minus);

        // on `-` the exon start in transcript terms is the genomic end
        let projection = projector.project_site(&source, &SiteQuery::new(&exon, SiteKind::FivePrime));
        assert_eq!(
            projection.values,
            vec![-203.0, -202.0, -201.0, -200.0, -199.0, -198.0, -197.0]
        );
    }

    #[rstest]
    fn test_short_intron_truncates_and_pads(source: StrandedSignal<MemoryTrack>) {
        let projector = CoordinateProjector::new(spec(0, 300, true, false));
        let upstream = iv(490, 500, Strand::Plus);
        let exon = iv(510, 600, Strand::Plus);

        let query = SiteQuery::new(&exon, SiteKind::FivePrime).with_neighbor(&upstream);
        let projection = projector.project_site(&source, &query);

        assert_eq!(projection.width(), 300);
        assert_eq!(projection.left_pad, 290);
        assert!(projection.values[..290].iter().all(|v| v.is_nan()));
        assert_eq!(projection.values[290..].to_vec(), (500..510).map(|v| v as f64).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_short_intron_on_minus_pads_the_far_end(source: StrandedSignal<MemoryTrack>) {
        let projector = CoordinateProjector::new(spec(0, 300, true, false));
        let exon = iv(400, 500, Strand::Minus);
        let downstream = iv(300, 390, Strand::Minus);

        let query = SiteQuery::new(&exon, SiteKind::ThreePrime).with_neighbor(&downstream);
        let projection = projector.project_site(&source, &query);

        assert_eq!(projection.width(), 300);
        assert_eq!((projection.left_pad, projection.right_pad), (0, 290));
        assert_eq!(projection.values[..10].to_vec(), (390..400).rev().map(|v| -(v as f64)).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_without_truncate_reads_through(source: StrandedSignal<MemoryTrack>) {
        let projector = CoordinateProjector::new(spec(0, 20, false, false));
        let upstream = iv(490, 500, Strand::Plus);
        let exon = iv(510, 600, Strand::Plus);

        let query = SiteQuery::new(&exon, SiteKind::FivePrime).with_neighbor(&upstream);
        let projection = projector.project_site(&source, &query);
        assert_eq!(projection.n_read(), 20);
        assert_eq!(projection.values[0], 490.0);
    }

    #[rstest]
    #[case(10, 5, 5)]
    #[case(11, 5, 6)]
    fn test_middle_stop_splits_intron(
        source: StrandedSignal<MemoryTrack>,
        #[case] gap: u64,
        #[case] left_half: usize,
        #[case] right_half: usize,
    ) {
        let projector = CoordinateProjector::new(spec(0, 300, true, true));
        let upstream = iv(100, 200, Strand::Plus);
        let downstream = iv(200 + gap, 400, Strand::Plus);

        let from_upstream = SiteQuery::new(&upstream, SiteKind::ThreePrime).with_neighbor(&downstream);
        let from_downstream = SiteQuery::new(&downstream, SiteKind::FivePrime).with_neighbor(&upstream);
        let a = projector.project_site(&source, &from_upstream);
        let b = projector.project_site(&source, &from_downstream);

        assert_eq!(a.n_read(), left_half);
        assert_eq!(b.n_read(), right_half);

        // every intron base is read exactly once
        let mut read: Vec<f64> = coords(&a.values);
        read.extend(coords(&b.values));
        read.sort_by(f64::total_cmp);
        let expected: Vec<f64> = (200..200 + gap).map(|v| v as f64).collect();
        assert_eq!(read, expected);
    }

    #[rstest]
    #[case(true, false)]
    #[case(false, true)]
    #[case(false, false)]
    fn test_paired_short_exon_splits_at_midpoint(
        source: StrandedSignal<MemoryTrack>,
        #[case] truncate: bool,
        #[case] middle_stop: bool,
    ) {
        let projector = CoordinateProjector::new(spec(50, 0, truncate, middle_stop));
        let exon = iv(1000, 1031, Strand::Plus);

        let start = projector.project_site(&source, &SiteQuery::new(&exon, SiteKind::FivePrime).paired(true));
        let end = projector.project_site(&source, &SiteQuery::new(&exon, SiteKind::ThreePrime).paired(true));

        assert_eq!(coords(&start.values), (1000..1015).map(|v| v as f64).collect::<Vec<_>>());
        assert_eq!(coords(&end.values), (1015..1031).map(|v| v as f64).collect::<Vec<_>>());
        assert_eq!((start.width(), end.width()), (50, 50));
    }

    #[rstest]
    fn test_paired_exon_bases_are_read_once_without_clipping(source: StrandedSignal<MemoryTrack>) {
        let projector = CoordinateProjector::new(spec(50, 0, false, false));
        let exon = iv(1000, 1020, Strand::Plus);

        let start = projector.project_site(&source, &SiteQuery::new(&exon, SiteKind::FivePrime).paired(true));
        let end = projector.project_site(&source, &SiteQuery::new(&exon, SiteKind::ThreePrime).paired(true));

        let mut read = coords(&start.values);
        read.extend(coords(&end.values));
        read.sort_by(f64::total_cmp);
        assert_eq!(read, (1000..1020).map(|v| v as f64).collect::<Vec<_>>());
        assert_eq!((start.right_pad, end.left_pad), (40, 40));
    }

    #[rstest]
    fn test_unpaired_exon_is_clipped_to_its_length(source: StrandedSignal<MemoryTrack>) {
        let projector = CoordinateProjector::new(spec(50, 0, true, false));
        let exon = iv(1000, 1020, Strand::Plus);

        let projection = projector.project_site(&source, &SiteQuery::new(&exon, SiteKind::FivePrime));
        assert_eq!(projection.n_read(), 20);
        assert_eq!(projection.right_pad, 30);
    }

    #[rstest]
    fn test_floor_at_zero_becomes_padding(source: StrandedSignal<MemoryTrack>) {
        let projector = CoordinateProjector::new(spec(2, 5, true, false));
        let exon = iv(3, 50, Strand::Plus);

        let projection = projector.project_site(&source, &SiteQuery::new(&exon, SiteKind::FivePrime));
        assert_eq!(projection.width(), 7);
        assert_eq!(projection.left_pad, 2);
        assert_eq!(coords(&projection.values), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[rstest]
    fn test_interval_projection(source: StrandedSignal<MemoryTrack>) {
        let projector = CoordinateProjector::new(WindowSpec {
            left_margin: 2,
            right_margin: 1,
            ..Default::default()
        });

        let plus = projector.project_interval(&source, &iv(10, 13, Strand::Plus));
        assert_eq!(plus.values, vec![8.0, 9.0, 10.0, 11.0, 12.0, 13.0]);

        // upstream of a `-` feature is genomically to its right
        let minus = projector.project_interval(&source, &iv(10, 13, Strand::Minus));
        assert_eq!(minus.values, vec![-14.0, -13.0, -12.0, -11.0, -10.0, -9.0]);
        assert_eq!(minus.width(), projector.interval_width(&iv(10, 13, Strand::Minus)));
    }

    #[rstest]
    fn test_interval_projection_floors_at_zero(source: StrandedSignal<MemoryTrack>) {
        let projector = CoordinateProjector::new(WindowSpec {
            left_margin: 5,
            ..Default::default()
        });

        let projection = projector.project_interval(&source, &iv(2, 4, Strand::Plus));
        assert_eq!(projection.width(), 7);
        assert_eq!(projection.left_pad, 3);
        assert_eq!(coords(&projection.values), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[rstest]
    fn test_missing_chromosome_keeps_width(source: StrandedSignal<MemoryTrack>) {
        let projector = CoordinateProjector::new(spec(3, 4, true, false));
        let exon = GenomicInterval::new("chrUn", 100, 200, Strand::Plus).unwrap();

        let projection = projector.project_site(&source, &SiteQuery::new(&exon, SiteKind::FivePrime));
        assert_eq!(projection.width(), 7);
        assert!(projection.is_all_sentinel());
    }
}
