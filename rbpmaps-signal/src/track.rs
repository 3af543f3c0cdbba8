use fxhash::FxHashMap;
use log::{debug, warn};

use rbpmaps_core::errors::{RbpMapsError, Result};
use rbpmaps_core::models::Strand;

use crate::{SENTINEL, SignalSource, sentinel_fill};

///
/// A single, unstranded per-base track queried in genomic order.
///
/// Implementations return `Err(MissingChromosome)` for unknown chromosomes and
/// sentinel values for bases past the end of a known chromosome.
///
pub trait Track: Send + Sync {
    fn query(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<f64>>;
}

/// Dense per-base values held in memory, keyed by chromosome.
#[derive(Debug, Clone, Default)]
pub struct MemoryTrack {
    chroms: FxHashMap<String, Vec<f64>>,
}

impl MemoryTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_chroms<S: Into<String>>(chroms: Vec<(S, Vec<f64>)>) -> Self {
        MemoryTrack {
            chroms: chroms.into_iter().map(|(c, v)| (c.into(), v)).collect(),
        }
    }

    pub fn insert(&mut self, chrom: impl Into<String>, values: Vec<f64>) {
        self.chroms.insert(chrom.into(), values);
    }
}

impl Track for MemoryTrack {
    fn query(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<f64>> {
        let values = self
            .chroms
            .get(chrom)
            .ok_or_else(|| RbpMapsError::MissingChromosome(chrom.to_string()))?;

        Ok((start..end)
            .map(|pos| values.get(pos as usize).copied().unwrap_or(SENTINEL))
            .collect())
    }
}

///
/// A pair of complementary stranded tracks exposed as a [`SignalSource`].
///
/// `+` queries read the forward track in genomic order; `-` queries read the
/// reverse track and reverse the result. Read failures are recovered as
/// sentinel fills.
///
#[derive(Debug, Clone)]
pub struct StrandedSignal<T: Track> {
    forward: T,
    reverse: T,
    flipped: bool,
    absolute: bool,
}

impl<T: Track> StrandedSignal<T> {
    pub fn new(forward: T, reverse: T) -> Self {
        StrandedSignal {
            forward,
            reverse,
            flipped: false,
            absolute: false,
        }
    }

    /// Swap the tracks, for libraries that read the opposite strand.
    pub fn flipped(mut self, flipped: bool) -> Self {
        self.flipped = flipped;
        self
    }

    /// Report magnitudes; reverse-strand tracks are often written as negative values.
    pub fn absolute(mut self, absolute: bool) -> Self {
        self.absolute = absolute;
        self
    }

    fn track_for(&self, strand: Strand) -> &T {
        match (strand, self.flipped) {
            (Strand::Plus, false) | (Strand::Minus, true) => &self.forward,
            (Strand::Minus, false) | (Strand::Plus, true) => &self.reverse,
        }
    }
}

impl<T: Track> SignalSource for StrandedSignal<T> {
    fn values(&self, chrom: &str, start: u64, end: u64, strand: Strand) -> Vec<f64> {
        let len = end.saturating_sub(start) as usize;
        if len == 0 {
            return Vec::new();
        }

        let mut values = match self.track_for(strand).query(chrom, start, end) {
            Ok(values) if values.len() == len => values,
            Ok(values) => {
                warn!(
                    "Track returned {} values for {}:{}-{} ({} expected)",
                    values.len(),
                    chrom,
                    start,
                    end,
                    len
                );
                sentinel_fill(len)
            }
            Err(RbpMapsError::MissingChromosome(c)) => {
                debug!("No signal for chromosome {}", c);
                sentinel_fill(len)
            }
            Err(e) => {
                warn!("Can't read {}:{}-{}: {}", chrom, start, end, e);
                sentinel_fill(len)
            }
        };

        if self.absolute {
            values.iter_mut().for_each(|v| *v = v.abs());
        }
        if strand.is_minus() {
            values.reverse();
        }
        values
    }
}
