#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How far a window reaches around a feature, and what happens when the
/// feature (or the intron next to it) is shorter than that reach.
///
/// `exon_offset`/`intron_offset` drive splice-site windows; the margins
/// drive plain interval windows. With `truncate`, reads stop at the
/// neighbouring feature and the remainder is padded with the sentinel. With
/// `middle_stop`, reads into a short intron stop at its midpoint so two
/// competing sites never share a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WindowSpec {
    pub left_margin: u64,
    pub right_margin: u64,
    pub exon_offset: u64,
    pub intron_offset: u64,
    pub truncate: bool,
    pub middle_stop: bool,
}

impl Default for WindowSpec {
    fn default() -> Self {
        WindowSpec {
            left_margin: 0,
            right_margin: 0,
            exon_offset: 50,
            intron_offset: 300,
            truncate: true,
            middle_stop: false,
        }
    }
}

impl WindowSpec {
    /// Width of one splice-site window.
    pub fn site_width(&self) -> usize {
        (self.exon_offset + self.intron_offset) as usize
    }

    /// Whether reads are clipped at neighbouring features.
    pub fn clips(&self) -> bool {
        self.truncate || self.middle_stop
    }
}
