use std::fmt::{self, Display};

/// `-log10(p)`, with `p` floored at the smallest positive `f64` so that a
/// zero p-value stays finite.
pub fn neg_log10_p(p: f64) -> f64 {
    -p.max(f64::MIN_POSITIVE).log10()
}

/// Direction of a per-position difference between two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sign {
    #[default]
    Positive,
    Negative,
}

impl Sign {
    pub fn as_f64(&self) -> f64 {
        match self {
            Sign::Positive => 1.0,
            Sign::Negative => -1.0,
        }
    }

    /// Negative iff `input < control`. Sentinel means compare as positive.
    pub fn of_difference(input: f64, control: f64) -> Self {
        if input < control {
            Sign::Negative
        } else {
            Sign::Positive
        }
    }
}

/// Outcome of one per-position test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatResult {
    pub statistic: f64,
    pub p_value: f64,
    pub sign: Sign,
}

impl StatResult {
    pub fn new(statistic: f64, p_value: f64, sign: Sign) -> Self {
        StatResult {
            statistic,
            p_value,
            sign,
        }
    }

    /// `sign * -log10(p)`.
    pub fn signed_log_p(&self) -> f64 {
        self.sign.as_f64() * neg_log10_p(self.p_value)
    }

    /// `sign * -log10(statistic)`.
    ///
    /// A statistic of exactly zero (no difference between the samples) maps
    /// to `0.0`. The p-value floor is not applied here, so an infinite odds
    /// ratio stays infinite and `NaN` stays `NaN`.
    pub fn signed_log_statistic(&self) -> f64 {
        if self.statistic == 0.0 {
            return 0.0;
        }
        self.sign.as_f64() * -self.statistic.log10()
    }
}

impl Display for StatResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.sign {
            Sign::Positive => '+',
            Sign::Negative => '-',
        };
        write!(f, "{}\t{}\t{}", self.statistic, self.p_value, sign)
    }
}
