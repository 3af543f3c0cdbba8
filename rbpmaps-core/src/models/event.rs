use std::fmt::{self, Display};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::RbpMapsError;

/// The kind of annotation event a map is built around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EventType {
    /// upstream exon, cassette exon, downstream exon
    #[cfg_attr(feature = "serde", serde(rename = "se"))]
    SkippedExon,
    /// flanking exon, long exon, short exon
    #[cfg_attr(feature = "serde", serde(rename = "a3ss"))]
    Alt3SS,
    /// long exon, short exon, flanking exon
    #[cfg_attr(feature = "serde", serde(rename = "a5ss"))]
    Alt5SS,
    /// upstream exon, downstream exon around the retained intron
    #[cfg_attr(feature = "serde", serde(rename = "ri"))]
    RetainedIntron,
    /// a single interval from a BED file
    #[cfg_attr(feature = "serde", serde(rename = "bed"))]
    Interval,
}

impl EventType {
    /// Number of intervals each feature of this type carries.
    pub fn n_intervals(&self) -> usize {
        match self {
            EventType::SkippedExon | EventType::Alt3SS | EventType::Alt5SS => 3,
            EventType::RetainedIntron => 2,
            EventType::Interval => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SkippedExon => "se",
            EventType::Alt3SS => "a3ss",
            EventType::Alt5SS => "a5ss",
            EventType::RetainedIntron => "ri",
            EventType::Interval => "bed",
        }
    }
}

impl FromStr for EventType {
    type Err = RbpMapsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "se" => Ok(EventType::SkippedExon),
            "a3ss" => Ok(EventType::Alt3SS),
            "a5ss" => Ok(EventType::Alt5SS),
            "ri" => Ok(EventType::RetainedIntron),
            "bed" => Ok(EventType::Interval),
            other => Err(RbpMapsError::InvalidParameter(format!(
                "unknown event type '{}'; expected one of se, a3ss, a5ss, ri, bed",
                other
            ))),
        }
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("se", EventType::SkippedExon, 3)]
    #[case("A3SS", EventType::Alt3SS, 3)]
    #[case("a5ss", EventType::Alt5SS, 3)]
    #[case("RI", EventType::RetainedIntron, 2)]
    #[case("bed", EventType::Interval, 1)]
    fn test_event_type_from_str(
        #[case] token: &str,
        #[case] expected: EventType,
        #[case] n: usize,
    ) {
        let event_type: EventType = token.parse().unwrap();
        assert_eq!(event_type, expected);
        assert_eq!(event_type.n_intervals(), n);
    }

    #[rstest]
    fn test_event_type_unknown() {
        assert!("mxe".parse::<EventType>().is_err());
    }
}
