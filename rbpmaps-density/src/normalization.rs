//! Pure numeric transforms over value vectors.
//!
//! None of these turn a sentinel (`NaN`) into a number: sentinel positions
//! stay sentinel and are left out of any sum.

use rbpmaps_core::errors::{RbpMapsError, Result};
use rbpmaps_signal::{SENTINEL, is_sentinel};

use crate::matrix::DensityMatrix;

/// Divide every value by `n`, the number of features.
pub fn normalize(values: &[f64], n: usize) -> Result<Vec<f64>> {
    if n == 0 {
        return Err(RbpMapsError::DivisionByZero);
    }
    let n = n as f64;
    Ok(values.iter().map(|v| v / n).collect())
}

///
/// Binomial standard error `sqrt(p * (1 - p) / n)` of each proportion.
///
/// # Arguments
///
/// - proportions: values from [`normalize`], each in `[0, 1]` or sentinel
/// - n: number of features the proportions were taken over
///
pub fn standard_error(proportions: &[f64], n: usize) -> Result<Vec<f64>> {
    if n == 0 {
        return Err(RbpMapsError::DivisionByZero);
    }
    let n = n as f64;

    proportions
        .iter()
        .map(|&p| {
            if is_sentinel(p) {
                Ok(SENTINEL)
            } else if !(0.0..=1.0).contains(&p) {
                Err(RbpMapsError::InvalidParameter(format!(
                    "proportion {} is outside [0, 1]",
                    p
                )))
            } else {
                Ok((p * (1.0 - p) / n).sqrt())
            }
        })
        .collect()
}

/// Scale a vector to sum to one over its non-sentinel values.
///
/// A vector with nothing to scale (all zero or all sentinel) is returned as is.
pub fn pdf(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().filter(|v| !is_sentinel(**v)).sum();
    if total == 0.0 {
        return values.to_vec();
    }
    values.iter().map(|v| v / total).collect()
}

/// Presence call per position: `1` where the value is positive, else `0`.
pub fn presence(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .map(|&v| {
            if is_sentinel(v) {
                SENTINEL
            } else if v > 0.0 {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

pub fn subtract(foreground: &[f64], background: &[f64]) -> Result<Vec<f64>> {
    check_len(foreground, background)?;
    Ok(foreground.iter().zip(background).map(|(f, b)| f - b).collect())
}

///
/// Per-position contribution to the KL divergence of `foreground` from
/// `background`.
///
/// Both vectors are shifted by `pseudocount` and scaled to sum to one over
/// the positions where neither is sentinel, giving `p` and `q`; each such
/// position then scores `p * log2(p / q)`. Positions where either input is
/// sentinel score sentinel.
///
pub fn kl_divergence(foreground: &[f64], background: &[f64], pseudocount: f64) -> Result<Vec<f64>> {
    check_len(foreground, background)?;
    if !(pseudocount > 0.0 && pseudocount.is_finite()) {
        return Err(RbpMapsError::InvalidParameter(format!(
            "pseudocount must be a positive number, got {}",
            pseudocount
        )));
    }

    let valid = |i: usize| !is_sentinel(foreground[i]) && !is_sentinel(background[i]);
    let (mut fg_total, mut bg_total) = (0.0, 0.0);
    for i in (0..foreground.len()).filter(|&i| valid(i)) {
        fg_total += foreground[i] + pseudocount;
        bg_total += background[i] + pseudocount;
    }

    Ok((0..foreground.len())
        .map(|i| {
            if !valid(i) {
                return SENTINEL;
            }
            let p = (foreground[i] + pseudocount) / fg_total;
            let q = (background[i] + pseudocount) / bg_total;
            p * (p / q).log2()
        })
        .collect())
}

/// Column means of a matrix, ignoring sentinels. Empty columns are sentinel.
pub fn column_means(matrix: &DensityMatrix) -> Vec<f64> {
    (0..matrix.n_cols())
        .map(|j| {
            let values = matrix.column_values(j);
            if values.is_empty() {
                SENTINEL
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        })
        .collect()
}

/// [`kl_divergence`] between the column means of two equally wide matrices.
pub fn column_divergence(
    foreground: &DensityMatrix,
    background: &DensityMatrix,
    pseudocount: f64,
) -> Result<Vec<f64>> {
    if foreground.n_cols() != background.n_cols() {
        return Err(RbpMapsError::DimensionMismatch {
            expected: foreground.n_cols(),
            found: background.n_cols(),
        });
    }
    kl_divergence(&column_means(foreground), &column_means(background), pseudocount)
}

fn check_len(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(RbpMapsError::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_normalize_round_trip() {
        let values = vec![0.0, 3.0, f64::NAN, 12.0];
        let normalized = normalize(&values, 4).unwrap();
        let back: Vec<f64> = normalized.iter().map(|v| v * 4.0).collect();

        assert_eq!(back[0], 0.0);
        assert_eq!(back[1], 3.0);
        assert!(back[2].is_nan());
        assert_eq!(back[3], 12.0);
    }

    #[rstest]
    fn test_normalize_by_zero() {
        assert!(matches!(normalize(&[1.0], 0), Err(RbpMapsError::DivisionByZero)));
    }

    #[rstest]
    #[case(16)]
    #[case(100)]
    fn test_standard_error_is_bounded(#[case] n: usize) {
        let proportions: Vec<f64> = (0..=10).map(|i| i as f64 / 10.0).collect();
        let se = standard_error(&proportions, n).unwrap();

        let bound = 0.5 / (n as f64).sqrt();
        assert!(se.iter().all(|&s| (0.0..=bound + 1e-12).contains(&s)));
        assert_eq!(se[0], 0.0);
        assert!((se[5] - bound).abs() < 1e-12);
    }

    #[rstest]
    fn test_standard_error_keeps_sentinel() {
        let se = standard_error(&[0.5, f64::NAN], 4).unwrap();
        assert_eq!(se[0], 0.25);
        assert!(se[1].is_nan());
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    fn test_standard_error_rejects_out_of_range(#[case] p: f64) {
        assert!(matches!(
            standard_error(&[p], 10),
            Err(RbpMapsError::InvalidParameter(_))
        ));
    }

    #[rstest]
    fn test_pdf() {
        let scaled = pdf(&[1.0, f64::NAN, 3.0]);
        assert_eq!(scaled[0], 0.25);
        assert!(scaled[1].is_nan());
        assert_eq!(scaled[2], 0.75);

        assert_eq!(pdf(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[rstest]
    fn test_presence() {
        let called = presence(&[0.0, 2.5, -1.0, f64::NAN]);
        assert_eq!(called[..3].to_vec(), vec![0.0, 1.0, 0.0]);
        assert!(called[3].is_nan());
    }

    #[rstest]
    fn test_subtract_mismatch() {
        assert!(matches!(
            subtract(&[1.0, 2.0], &[1.0]),
            Err(RbpMapsError::DimensionMismatch { expected: 2, found: 1 })
        ));
    }

    #[rstest]
    fn test_kl_of_identical_vectors_is_zero() {
        let v = vec![0.0, 1.0, 5.0, 0.0];
        let kl = kl_divergence(&v, &v, 1.0).unwrap();
        assert!(kl.iter().all(|x| x.abs() < 1e-12));
    }

    #[rstest]
    fn test_kl_zero_background_is_finite() {
        let kl = kl_divergence(&[4.0, 0.0], &[0.0, 0.0], 1.0).unwrap();

        // p = [5/6, 1/6], q = [1/2, 1/2]
        let p: f64 = 5.0 / 6.0;
        assert!((kl[0] - p * (p / 0.5).log2()).abs() < 1e-12);
        assert!(kl.iter().all(|x| x.is_finite()));
        assert!(kl.iter().sum::<f64>() >= 0.0);
    }

    #[rstest]
    fn test_kl_skips_sentinel_positions() {
        let kl = kl_divergence(&[1.0, f64::NAN, 1.0], &[1.0, 1.0, 1.0], 0.5).unwrap();
        assert!(kl[1].is_nan());
        assert!(kl[0].abs() < 1e-12 && kl[2].abs() < 1e-12);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    fn test_kl_rejects_bad_pseudocount(#[case] pseudocount: f64) {
        assert!(matches!(
            kl_divergence(&[1.0], &[1.0], pseudocount),
            Err(RbpMapsError::InvalidParameter(_))
        ));
    }

    #[rstest]
    fn test_column_divergence() {
        let fg = DensityMatrix::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, f64::NAN], vec![3.0, 0.0]],
        )
        .unwrap();
        assert_eq!(column_means(&fg), vec![2.0, 0.0]);

        let kl = column_divergence(&fg, &fg, 1.0).unwrap();
        assert!(kl.iter().all(|x| x.abs() < 1e-12));

        let narrow = DensityMatrix::new(1);
        assert!(column_divergence(&fg, &narrow, 1.0).is_err());
    }
}
