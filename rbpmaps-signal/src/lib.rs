//! Per-nucleotide signal sources for rbpmaps.
//!
//! Everything downstream asks a [`SignalSource`] for the values over a range
//! on a strand. Two families are provided:
//!
//! - continuous tracks ([`StrandedSignal`] over a pair of [`Track`]s, e.g.
//!   forward/reverse bigWig files)
//! - peak calls ([`PeakSource`]), where a base's value is aggregated from the
//!   scores of peaks covering it
//!
//! ## Missing data
//!
//! Continuous sources never fail a query. When a chromosome is absent or the
//! read fails, the result is filled with [`SENTINEL`] (`NaN`) so that "no
//! data" stays distinguishable from "zero reads". Peak sources report `0.0`
//! where no peak overlaps, since absence of a peak is itself a valid signal.
//!
//! ```rust
//! use rbpmaps_core::models::Strand;
//! use rbpmaps_signal::{MemoryTrack, SignalSource, StrandedSignal};
//!
//! let forward = MemoryTrack::from_chroms(vec![("chr1", vec![1.0, 2.0, 3.0, 4.0])]);
//! let reverse = MemoryTrack::from_chroms(vec![("chr1", vec![5.0, 6.0, 7.0, 8.0])]);
//! let signal = StrandedSignal::new(forward, reverse);
//!
//! assert_eq!(signal.values("chr1", 1, 3, Strand::Plus), vec![2.0, 3.0]);
//! assert_eq!(signal.values("chr1", 1, 3, Strand::Minus), vec![7.0, 6.0]);
//! assert!(signal.values("chrX", 0, 2, Strand::Plus).iter().all(|v| v.is_nan()));
//! ```

pub mod bigwig;
pub mod peaks;
pub mod track;

use rbpmaps_core::models::Strand;

// re-exports
pub use self::bigwig::BigWigTrack;
pub use self::peaks::{Peak, PeakAggregation, PeakFilter, PeakIndex, PeakSource};
pub use self::track::{MemoryTrack, StrandedSignal, Track};

/// Marker for "no data" at a position. Distinct from a zero signal.
pub const SENTINEL: f64 = f64::NAN;

#[inline]
pub fn is_sentinel(value: f64) -> bool {
    value.is_nan()
}

/// A vector of `len` sentinels.
pub fn sentinel_fill(len: usize) -> Vec<f64> {
    vec![SENTINEL; len]
}

///
/// A strand-aware, per-nucleotide value source.
///
/// `values` always returns exactly `end - start` values in feature-relative
/// 5' to 3' order: genomic order on `+`, reversed on `-`.
///
pub trait SignalSource: Send + Sync {
    fn values(&self, chrom: &str, start: u64, end: u64, strand: Strand) -> Vec<f64>;
}

impl<S: SignalSource + ?Sized> SignalSource for &S {
    fn values(&self, chrom: &str, start: u64, end: u64, strand: Strand) -> Vec<f64> {
        (**self).values(chrom, start, end, strand)
    }
}

impl<S: SignalSource + ?Sized> SignalSource for Box<S> {
    fn values(&self, chrom: &str, start: u64, end: u64, strand: Strand) -> Vec<f64> {
        (**self).values(chrom, start, end, strand)
    }
}
