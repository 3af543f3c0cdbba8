use statrs::distribution::{Discrete, DiscreteCDF, Hypergeometric};

use rbpmaps_core::errors::{RbpMapsError, Result};
use rbpmaps_density::DensityMatrix;
use rbpmaps_signal::is_sentinel;

use crate::result::{Sign, StatResult};

/// Relative tolerance when collecting tables "as extreme" as the observed one.
const RELATIVE_TOLERANCE: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alternative {
    /// Foreground enriched over background.
    #[default]
    Greater,
    Less,
    TwoSided,
}

impl std::str::FromStr for Alternative {
    type Err = RbpMapsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "greater" => Ok(Alternative::Greater),
            "less" => Ok(Alternative::Less),
            "two-sided" | "two_sided" => Ok(Alternative::TwoSided),
            other => Err(RbpMapsError::InvalidParameter(format!(
                "unknown alternative '{}'",
                other
            ))),
        }
    }
}

/// Per-position hit counts: how many features have signal, out of how many
/// have data at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionCounts {
    pub hits: Vec<u64>,
    pub totals: Vec<u64>,
}

impl PositionCounts {
    /// Count, per column, non-sentinel values above zero out of all
    /// non-sentinel values.
    pub fn from_matrix(matrix: &DensityMatrix) -> Self {
        let (hits, totals) = matrix
            .values()
            .columns()
            .into_iter()
            .map(|column| {
                column.iter().filter(|v| !is_sentinel(**v)).fold((0, 0), |(h, t), v| {
                    (h + u64::from(*v > 0.0), t + 1)
                })
            })
            .unzip();

        PositionCounts { hits, totals }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

///
/// Fisher's exact test on `[[a, b], [c, d]]`. Returns `(odds ratio, p)`.
///
/// `a` is drawn from a hypergeometric distribution over the fixed margins;
/// `Greater` tests `P(X >= a)`, `Less` tests `P(X <= a)` and `TwoSided` sums
/// every table no more likely than the observed one.
///
pub fn fisher_exact(table: [[u64; 2]; 2], alternative: Alternative) -> Result<(f64, f64)> {
    let [[a, b], [c, d]] = table;
    let odds_ratio = if b * c == 0 {
        if a * d == 0 { f64::NAN } else { f64::INFINITY }
    } else {
        (a * d) as f64 / (b * c) as f64
    };

    let population = a + b + c + d;
    if population == 0 {
        return Ok((odds_ratio, 1.0));
    }

    let successes = a + c;
    let draws = a + b;
    let dist = Hypergeometric::new(population, successes, draws)
        .map_err(|e| RbpMapsError::InvalidParameter(e.to_string()))?;

    let p = match alternative {
        Alternative::Greater if a == 0 => 1.0,
        Alternative::Greater => dist.sf(a - 1),
        Alternative::Less => dist.cdf(a),
        Alternative::TwoSided => {
            let observed = dist.pmf(a) * (1.0 + RELATIVE_TOLERANCE);
            let low = (successes + draws).saturating_sub(population);
            let high = successes.min(draws);
            (low..=high).map(|k| dist.pmf(k)).filter(|p| *p <= observed).sum::<f64>()
        }
    };

    Ok((odds_ratio, p.clamp(0.0, 1.0)))
}

/// Fisher test per position of `foreground` hit counts against `background`.
pub fn fisher_compare_counts(
    foreground: &PositionCounts,
    background: &PositionCounts,
    alternative: Alternative,
) -> Result<Vec<StatResult>> {
    if foreground.len() != background.len() {
        return Err(RbpMapsError::DimensionMismatch {
            expected: foreground.len(),
            found: background.len(),
        });
    }

    (0..foreground.len())
        .map(|j| {
            let (fg_hits, fg_total) = (foreground.hits[j], foreground.totals[j]);
            let (bg_hits, bg_total) = (background.hits[j], background.totals[j]);
            let table = [[fg_hits, fg_total - fg_hits], [bg_hits, bg_total - bg_hits]];
            let (odds_ratio, p) = fisher_exact(table, alternative)?;

            let fraction = |hits: u64, total: u64| if total == 0 { 0.0 } else { hits as f64 / total as f64 };
            let sign = Sign::of_difference(fraction(fg_hits, fg_total), fraction(bg_hits, bg_total));
            Ok(StatResult::new(odds_ratio, p, sign))
        })
        .collect()
}

///
/// Fisher test per position of a foreground presence matrix against a
/// background one of the same width. Row counts may differ.
///
pub fn fisher_compare(
    foreground: &DensityMatrix,
    background: &DensityMatrix,
    alternative: Alternative,
) -> Result<Vec<StatResult>> {
    if foreground.n_cols() != background.n_cols() {
        return Err(RbpMapsError::DimensionMismatch {
            expected: foreground.n_cols(),
            found: background.n_cols(),
        });
    }
    fisher_compare_counts(
        &PositionCounts::from_matrix(foreground),
        &PositionCounts::from_matrix(background),
        alternative,
    )
}
