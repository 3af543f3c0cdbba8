//! Statistics over density matrices.
//!
//! - [`summarize`] / [`fraction_summary`]: per-position mean and error bars
//!   for one matrix
//! - [`ks_compare`]: signed two-sample KS test of two continuous maps
//! - [`fisher_compare`]: per-position Fisher test of two presence maps
//!
//! Comparisons run column by column and need both matrices to be equally
//! wide; row counts may differ.

pub mod fisher;
pub mod ks;
pub mod result;
pub mod summary;

// re-exports
pub use self::fisher::{Alternative, PositionCounts, fisher_compare, fisher_compare_counts, fisher_exact};
pub use self::ks::{ks_2samp, ks_compare};
pub use self::result::{Sign, StatResult, neg_log10_p};
pub use self::summary::{PeakSummary, PositionSummary, fraction_summary, summarize};
