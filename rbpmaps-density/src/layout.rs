use rbpmaps_core::errors::{RbpMapsError, Result};
use rbpmaps_core::models::{EventType, Feature};
use rbpmaps_signal::SignalSource;

use crate::projector::{CoordinateProjector, Projection, SiteKind, SiteQuery};

/// How one region of an event is projected. Indices point into
/// [`Feature::intervals`], which are in transcript order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionRule {
    Site {
        interval: usize,
        kind: SiteKind,
        neighbor: Option<usize>,
        paired: bool,
    },
    Interval {
        interval: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub rule: RegionRule,
}

const fn site(name: &'static str, interval: usize, kind: SiteKind, neighbor: usize, paired: bool) -> Region {
    Region {
        name,
        rule: RegionRule::Site {
            interval,
            kind,
            neighbor: Some(neighbor),
            paired,
        },
    }
}

///
/// The ordered, named regions an event type is split into.
///
/// Every feature of the event type yields one projection per region, in the
/// same order, so the regions line up as columns of one map.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLayout {
    event_type: EventType,
    regions: Vec<Region>,
}

impl EventLayout {
    pub fn for_event(event_type: EventType) -> Self {
        use SiteKind::{FivePrime, ThreePrime};

        let regions = match event_type {
            // [upstream, cassette, downstream]
            EventType::SkippedExon => vec![
                site("upstream_intron", 0, ThreePrime, 1, false),
                site("exon_start", 1, FivePrime, 0, true),
                site("exon_end", 1, ThreePrime, 2, true),
                site("downstream_intron", 2, FivePrime, 1, false),
            ],
            // [flanking, long, short]
            EventType::Alt3SS => vec![
                site("upstream_exon_end", 0, ThreePrime, 1, false),
                site("long_exon_start", 1, FivePrime, 0, false),
                site("short_exon_start", 2, FivePrime, 0, false),
            ],
            // [long, short, flanking]
            EventType::Alt5SS => vec![
                site("long_exon_end", 0, ThreePrime, 2, false),
                site("short_exon_end", 1, ThreePrime, 2, false),
                site("downstream_exon_start", 2, FivePrime, 0, false),
            ],
            // [upstream, downstream]
            EventType::RetainedIntron => vec![
                site("upstream_exon_end", 0, ThreePrime, 1, false),
                site("downstream_exon_start", 1, FivePrime, 0, false),
            ],
            EventType::Interval => vec![Region {
                name: "interval",
                rule: RegionRule::Interval { interval: 0 },
            }],
        };

        EventLayout { event_type, regions }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.regions.iter().map(|r| r.name).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Project every region of `feature`, in layout order.
    pub fn project<S: SignalSource + ?Sized>(
        &self,
        projector: &CoordinateProjector,
        source: &S,
        feature: &Feature,
    ) -> Result<Vec<Projection>> {
        let expected = self.event_type.n_intervals();
        if feature.intervals().len() < expected {
            return Err(RbpMapsError::MalformedFeature(format!(
                "{} has {} intervals, a {} event needs {}",
                feature.label(),
                feature.intervals().len(),
                self.event_type,
                expected
            )));
        }

        let intervals = feature.intervals();
        let projections = self
            .regions
            .iter()
            .map(|region| match region.rule {
                RegionRule::Site {
                    interval,
                    kind,
                    neighbor,
                    paired,
                } => {
                    let mut query = SiteQuery::new(&intervals[interval], kind).paired(paired);
                    if let Some(n) = neighbor {
                        query = query.with_neighbor(&intervals[n]);
                    }
                    projector.project_site(source, &query)
                }
                RegionRule::Interval { interval } => projector.project_interval(source, &intervals[interval]),
            })
            .collect();

        Ok(projections)
    }
}
