//! Two-sample Kolmogorov-Smirnov test, column by column.

use log::debug;

use rbpmaps_core::errors::{RbpMapsError, Result};
use rbpmaps_density::DensityMatrix;

use crate::result::{Sign, StatResult};

/// Above this many `m * n` sample pairs the asymptotic distribution is used.
const EXACT_LIMIT: usize = 10_000;

/// Largest gap between the empirical CDFs of two samples.
pub fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let (m, n) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;

    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        // step past every copy of x in both samples
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / m - j as f64 / n).abs());
    }
    d
}

/// `P(D < d)` for sample sizes `m` and `n`, computed exactly.
fn exact_cdf(d: f64, m: usize, n: usize) -> f64 {
    let (m, n) = if m > n { (n, m) } else { (m, n) };
    let (md, nd) = (m as f64, n as f64);

    // largest attainable value of D below d, nudged off the lattice
    let q = (0.5 + (d * md * nd - 1e-7).floor()) / (md * nd);

    let mut u: Vec<f64> = (0..=n).map(|j| if j as f64 / nd > q { 0.0 } else { 1.0 }).collect();
    for i in 1..=m {
        let w = i as f64 / (i + n) as f64;
        u[0] = if i as f64 / md > q { 0.0 } else { w * u[0] };
        for j in 1..=n {
            u[j] = if (i as f64 / md - j as f64 / nd).abs() > q {
                0.0
            } else {
                w * u[j] + u[j - 1]
            };
        }
    }
    u[n]
}

/// Survival function of the Kolmogorov distribution with Stephens' small
/// sample correction.
fn asymptotic_p(d: f64, m: usize, n: usize) -> f64 {
    let en = ((m * n) as f64 / (m + n) as f64).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * d;

    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut previous: f64 = 0.0;
    for k in 1..=100 {
        let term = fac * (a2 * (k * k) as f64).exp();
        sum += term;
        if term.abs() <= 0.001 * previous || term.abs() <= 1e-8 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        previous = term.abs();
    }
    // no convergence: lambda is tiny and so is the evidence
    1.0
}

///
/// Two-sided two-sample KS test. Returns `(D, p)`.
///
/// Exact for `m * n < 10000`, asymptotic otherwise. An empty sample gives
/// `(0, 1)`.
///
pub fn ks_2samp(a: &[f64], b: &[f64]) -> (f64, f64) {
    if a.is_empty() || b.is_empty() {
        return (0.0, 1.0);
    }

    let d = ks_statistic(a, b);
    let p = if a.len() * b.len() < EXACT_LIMIT {
        1.0 - exact_cdf(d, a.len(), b.len())
    } else {
        asymptotic_p(d, a.len(), b.len())
    };
    (d, p.clamp(0.0, 1.0))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

///
/// KS test of `input` against `control`, one result per column.
///
/// Each column's samples are the non-sentinel values of that column only,
/// so a sentinel in one position never drops a feature elsewhere. The sign
/// is negative when the input column mean is below the control's.
///
pub fn ks_compare(input: &DensityMatrix, control: &DensityMatrix) -> Result<Vec<StatResult>> {
    if input.n_cols() != control.n_cols() {
        return Err(RbpMapsError::DimensionMismatch {
            expected: input.n_cols(),
            found: control.n_cols(),
        });
    }

    Ok((0..input.n_cols())
        .map(|j| {
            let a = input.column_values(j);
            let b = control.column_values(j);
            if a.is_empty() || b.is_empty() {
                debug!("position {} has no signal in one condition", j);
            }
            let (d, p) = ks_2samp(&a, &b);
            StatResult::new(d, p, Sign::of_difference(mean(&a), mean(&b)))
        })
        .collect())
}
