use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::RbpMapsError;

/// Strand of a genomic interval.
///
/// Only `+` and `-` are valid; unstranded features can't be oriented and are
/// rejected when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    pub fn is_minus(&self) -> bool {
        matches!(self, Strand::Minus)
    }

    /// The opposite strand.
    pub fn flip(&self) -> Strand {
        match self {
            Strand::Plus => Strand::Minus,
            Strand::Minus => Strand::Plus,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Plus => "+",
            Strand::Minus => "-",
        }
    }
}

impl FromStr for Strand {
    type Err = RbpMapsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Plus),
            "-" => Ok(Strand::Minus),
            other => Err(RbpMapsError::InvalidStrand(other.to_string())),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
