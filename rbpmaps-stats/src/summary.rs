use rbpmaps_core::errors::{RbpMapsError, Result};
use rbpmaps_density::DensityMatrix;
use rbpmaps_density::normalization::{normalize, standard_error};
use rbpmaps_signal::{SENTINEL, is_sentinel};

/// Mean and standard error of the mean of one matrix column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSummary {
    pub mean: f64,
    pub sem: f64,
    /// Values the summary was taken over.
    pub n: usize,
}

impl PositionSummary {
    pub fn of(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return PositionSummary {
                mean: SENTINEL,
                sem: SENTINEL,
                n,
            };
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        let sem = if n < 2 {
            SENTINEL
        } else {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt() / (n as f64).sqrt()
        };

        PositionSummary { mean, sem, n }
    }
}

/// Linear-interpolated quantile of sorted, non-empty `values`.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

///
/// Per-column mean and SEM of a matrix, ignoring sentinels.
///
/// # Arguments
///
/// - matrix: features by positions
/// - outlier_quantile: when set, values above this quantile of their column
///   are dropped before summarizing
///
pub fn summarize(matrix: &DensityMatrix, outlier_quantile: Option<f64>) -> Result<Vec<PositionSummary>> {
    if let Some(q) = outlier_quantile
        && !(q > 0.0 && q <= 1.0)
    {
        return Err(RbpMapsError::InvalidParameter(format!(
            "outlier quantile must be in (0, 1], got {}",
            q
        )));
    }

    Ok((0..matrix.n_cols())
        .map(|j| {
            let mut values = matrix.column_values(j);
            if let Some(q) = outlier_quantile
                && !values.is_empty()
            {
                values.sort_by(f64::total_cmp);
                let cutoff = quantile(&values, q);
                values.retain(|v| *v <= cutoff);
            }
            PositionSummary::of(&values)
        })
        .collect())
}

/// Fraction of features with signal at each position, and its binomial SEM.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakSummary {
    pub fraction: Vec<f64>,
    pub sem: Vec<f64>,
    /// Number of features the fractions are taken over.
    pub n: usize,
}

///
/// Summarize a presence matrix: per column, the share of features with a
/// value above zero. Columns where every feature is sentinel stay sentinel.
///
pub fn fraction_summary(matrix: &DensityMatrix) -> Result<PeakSummary> {
    let hits: Vec<f64> = matrix
        .values()
        .columns()
        .into_iter()
        .map(|column| {
            if column.iter().all(|v| is_sentinel(*v)) {
                SENTINEL
            } else {
                column.iter().filter(|v| **v > 0.0).count() as f64
            }
        })
        .collect();

    let n = matrix.n_rows();
    let fraction = normalize(&hits, n)?;
    let sem = standard_error(&fraction, n)?;

    Ok(PeakSummary { fraction, sem, n })
}
