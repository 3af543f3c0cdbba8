use std::fmt::{self, Display};

use log::{debug, info};
use rayon::prelude::*;

use rbpmaps_core::errors::{RbpMapsError, Result};
use rbpmaps_core::models::{Feature, FeatureRecord, WindowSpec};
use rbpmaps_signal::{SignalSource, is_sentinel};

use crate::layout::{EventLayout, RegionRule};
use crate::matrix::{DensityMatrix, RegionMatrices};
use crate::normalization::{kl_divergence, pdf, presence, subtract};
use crate::projector::CoordinateProjector;

/// Per-feature scaling applied over the whole concatenated event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum RowNormalization {
    #[default]
    Raw,
    /// Scale each feature to sum to one.
    Pdf,
    /// `1` where there is signal, else `0`.
    Presence,
}

/// How a foreground row is combined with its background row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairedNormalization {
    /// Row-normalized foreground minus row-normalized background.
    Subtract,
    /// Per-position KL contribution of foreground against background.
    Entropy { pseudocount: f64 },
}

impl Default for PairedNormalization {
    fn default() -> Self {
        PairedNormalization::Entropy { pseudocount: 1.0 }
    }
}

/// The signal a builder reads: one source, or a foreground/background pair.
#[derive(Clone, Copy)]
pub enum Conditions<'a> {
    Single(&'a dyn SignalSource),
    Paired {
        foreground: &'a dyn SignalSource,
        background: &'a dyn SignalSource,
        normalization: PairedNormalization,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExclusionReason {
    InvalidStrand(String),
    MalformedFeature(String),
    /// Every position of the event (or of either condition) is sentinel.
    EmptySignal,
    /// A variable-width region disagrees with the width of earlier features.
    WidthMismatch { region: String, expected: usize, found: usize },
}

impl Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::InvalidStrand(s) => write!(f, "invalid strand '{}'", s),
            ExclusionReason::MalformedFeature(msg) => write!(f, "malformed feature: {}", msg),
            ExclusionReason::EmptySignal => write!(f, "no signal"),
            ExclusionReason::WidthMismatch {
                region,
                expected,
                found,
            } => write!(f, "{} is {} wide, expected {}", region, found, expected),
        }
    }
}

impl From<&RbpMapsError> for ExclusionReason {
    fn from(e: &RbpMapsError) -> Self {
        match e {
            RbpMapsError::InvalidStrand(s) => ExclusionReason::InvalidStrand(s.clone()),
            other => ExclusionReason::MalformedFeature(other.to_string()),
        }
    }
}

/// A feature left out of every region matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    /// Position of the record in the input.
    pub index: usize,
    /// `None` when the record never parsed into a feature.
    pub label: Option<String>,
    pub reason: ExclusionReason,
}

/// Region matrices plus the features that did not make it into them.
#[derive(Debug, Clone, Default)]
pub struct BuiltMaps {
    pub matrices: RegionMatrices,
    pub excluded: Vec<Exclusion>,
}

impl BuiltMaps {
    pub fn n_features(&self) -> usize {
        self.matrices.n_rows()
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }
}

/// One feature's windows, one vector per region.
type Rows = Vec<Vec<f64>>;

///
/// Builds one [`DensityMatrix`] per event region from a list of features.
///
/// Features are projected in parallel and collected back in input order.
/// Records that fail to parse, and features without any signal, are
/// excluded from every region so that row `i` means the same feature in
/// each matrix.
///
/// ```rust
/// use rbpmaps_core::models::{EventType, Feature, GenomicInterval, Strand, WindowSpec};
/// use rbpmaps_density::{EventLayout, MatrixBuilder};
/// use rbpmaps_signal::{MemoryTrack, StrandedSignal};
///
/// let track = MemoryTrack::from_chroms(vec![("chr1", vec![1.0; 100])]);
/// let signal = StrandedSignal::new(track.clone(), track);
///
/// let spec = WindowSpec { left_margin: 2, right_margin: 2, ..Default::default() };
/// let interval = GenomicInterval::new("chr1", 10, 20, Strand::Plus).unwrap();
/// let records = vec![Feature::new("site", vec![interval])];
///
/// let maps = MatrixBuilder::new(spec, &signal)
///     .build(&EventLayout::for_event(EventType::Interval), &records)
///     .unwrap();
/// assert_eq!(maps.matrices.get("interval").unwrap().n_cols(), 14);
/// ```
///
pub struct MatrixBuilder<'a> {
    projector: CoordinateProjector,
    conditions: Conditions<'a>,
    row_normalization: RowNormalization,
}

impl<'a> MatrixBuilder<'a> {
    pub fn new(spec: WindowSpec, source: &'a dyn SignalSource) -> Self {
        MatrixBuilder {
            projector: CoordinateProjector::new(spec),
            conditions: Conditions::Single(source),
            row_normalization: RowNormalization::default(),
        }
    }

    pub fn paired(
        spec: WindowSpec,
        foreground: &'a dyn SignalSource,
        background: &'a dyn SignalSource,
        normalization: PairedNormalization,
    ) -> Self {
        MatrixBuilder {
            projector: CoordinateProjector::new(spec),
            conditions: Conditions::Paired {
                foreground,
                background,
                normalization,
            },
            row_normalization: RowNormalization::default(),
        }
    }

    pub fn with_row_normalization(mut self, row_normalization: RowNormalization) -> Self {
        self.row_normalization = row_normalization;
        self
    }

    pub fn projector(&self) -> &CoordinateProjector {
        &self.projector
    }

    ///
    /// Project every record and assemble the region matrices.
    ///
    /// # Arguments
    ///
    /// - layout: regions to cut each feature into
    /// - records: parsed features (or the errors they failed with), in input order
    ///
    pub fn build(&self, layout: &EventLayout, records: &[FeatureRecord]) -> Result<BuiltMaps> {
        if let Conditions::Paired {
            normalization: PairedNormalization::Entropy { pseudocount },
            ..
        } = self.conditions
            && !(pseudocount > 0.0 && pseudocount.is_finite())
        {
            return Err(RbpMapsError::InvalidParameter(format!(
                "pseudocount must be a positive number, got {}",
                pseudocount
            )));
        }

        let results: Vec<std::result::Result<(String, Rows), Exclusion>> = records
            .par_iter()
            .enumerate()
            .map(|(index, record)| match record {
                Ok(feature) => self.feature_rows(layout, feature).map_err(|reason| Exclusion {
                    index,
                    label: Some(feature.label().to_string()),
                    reason,
                }),
                Err(e) => Err(Exclusion {
                    index,
                    label: None,
                    reason: ExclusionReason::from(e),
                }),
            })
            .collect();

        let names = layout.names();
        let mut widths: Vec<Option<usize>> = vec![None; names.len()];
        let mut labels = Vec::new();
        let mut columns: Vec<Vec<Vec<f64>>> = vec![Vec::new(); names.len()];
        let mut excluded = Vec::new();

        for (index, result) in results.into_iter().enumerate() {
            let (label, rows) = match result {
                Ok(ok) => ok,
                Err(exclusion) => {
                    debug!(
                        "Excluding record {} ({}): {}",
                        index,
                        exclusion.label.as_deref().unwrap_or("unparsed"),
                        exclusion.reason
                    );
                    excluded.push(exclusion);
                    continue;
                }
            };

            // the first feature fixes the width of variable regions
            let mismatch = rows.iter().enumerate().find_map(|(r, row)| match widths[r] {
                Some(w) if w != row.len() => Some(ExclusionReason::WidthMismatch {
                    region: names[r].to_string(),
                    expected: w,
                    found: row.len(),
                }),
                _ => None,
            });
            if let Some(reason) = mismatch {
                debug!("Excluding record {} ({}): {}", index, label, reason);
                excluded.push(Exclusion {
                    index,
                    label: Some(label),
                    reason,
                });
                continue;
            }

            for (r, row) in rows.into_iter().enumerate() {
                widths[r].get_or_insert(row.len());
                columns[r].push(row);
            }
            labels.push(label);
        }

        let mut matrices = RegionMatrices::new();
        for ((region, rows), width) in layout.regions().iter().zip(columns).zip(widths) {
            let matrix = if rows.is_empty() {
                let width = width.unwrap_or(match region.rule {
                    RegionRule::Site { .. } => self.projector.site_width(),
                    RegionRule::Interval { .. } => 0,
                });
                DensityMatrix::new(width)
            } else {
                DensityMatrix::from_rows(labels.clone(), rows)?
            };
            matrices.insert(region.name, matrix);
        }

        info!(
            "Built {} {} maps: {} features, {} excluded",
            names.len(),
            layout.event_type(),
            labels.len(),
            excluded.len()
        );

        Ok(BuiltMaps { matrices, excluded })
    }

    fn feature_rows(
        &self,
        layout: &EventLayout,
        feature: &Feature,
    ) -> std::result::Result<(String, Rows), ExclusionReason> {
        let (row, widths) = match self.conditions {
            Conditions::Single(source) => {
                let (row, widths) = self.event_row(layout, source, feature)?;
                (self.scale(&row), widths)
            }
            Conditions::Paired {
                foreground,
                background,
                normalization,
            } => {
                let (fg, widths) = self.event_row(layout, foreground, feature)?;
                let (bg, _) = self.event_row(layout, background, feature)?;

                let combined = match normalization {
                    PairedNormalization::Subtract => subtract(&self.scale(&fg), &self.scale(&bg)),
                    PairedNormalization::Entropy { pseudocount } => kl_divergence(&fg, &bg, pseudocount),
                }
                .map_err(|e| ExclusionReason::from(&e))?;
                (combined, widths)
            }
        };

        let mut rows = Vec::with_capacity(widths.len());
        let mut offset = 0;
        for width in widths {
            rows.push(row[offset..offset + width].to_vec());
            offset += width;
        }

        Ok((feature.label().to_string(), rows))
    }

    /// The concatenated event row from one source and each region's width.
    fn event_row(
        &self,
        layout: &EventLayout,
        source: &dyn SignalSource,
        feature: &Feature,
    ) -> std::result::Result<(Vec<f64>, Vec<usize>), ExclusionReason> {
        let projections = layout
            .project(&self.projector, source, feature)
            .map_err(|e| ExclusionReason::from(&e))?;

        let widths = projections.iter().map(|p| p.width()).collect();
        let row: Vec<f64> = projections.into_iter().flat_map(|p| p.values).collect();

        if row.iter().all(|v| is_sentinel(*v)) {
            return Err(ExclusionReason::EmptySignal);
        }
        Ok((row, widths))
    }

    fn scale(&self, row: &[f64]) -> Vec<f64> {
        match self.row_normalization {
            RowNormalization::Raw => row.to_vec(),
            RowNormalization::Pdf => pdf(row),
            RowNormalization::Presence => presence(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rbpmaps_core::models::{EventType, GenomicInterval, Strand};
    use rbpmaps_signal::{MemoryTrack, StrandedSignal};
    use rstest::*;

    fn signal(values: Vec<f64>) -> StrandedSignal<MemoryTrack> {
        let track = MemoryTrack::from_chroms(vec![("chr1", values)]);
        StrandedSignal::new(track.clone(), track)
    }

    fn interval_feature(label: &str, chrom: &str, start: u64, end: u64) -> FeatureRecord {
        let interval = GenomicInterval::new(chrom, start, end, Strand::Plus)?;
        Feature::new(label, vec![interval])
    }

    fn spec() -> WindowSpec {
        WindowSpec {
            left_margin: 1,
            right_margin: 1,
            ..Default::default()
        }
    }

    #[rstest]
    fn test_rows_follow_input_order() {
        let source = signal((0..100).map(|v| v as f64).collect());
        let records: Vec<FeatureRecord> = (0..20)
            .map(|i| interval_feature(&format!("f{}", i), "chr1", 10 + i, 13 + i))
            .collect();

        let maps = MatrixBuilder::new(spec(), &source)
            .build(&EventLayout::for_event(EventType::Interval), &records)
            .unwrap();

        let matrix = maps.matrices.get("interval").unwrap();
        assert_eq!(matrix.n_rows(), 20);
        assert_eq!(matrix.labels()[7], "f7");
        assert_eq!(matrix.row(7).to_vec(), vec![16.0, 17.0, 18.0, 19.0, 20.0]);
    }

    #[rstest]
    fn test_exclusions_are_reported() {
        let source = signal(vec![1.0; 100]);
        let records = vec![
            interval_feature("good", "chr1", 10, 13),
            Err(RbpMapsError::InvalidStrand(".".to_string())),
            interval_feature("elsewhere", "chr2", 10, 13),
            interval_feature("wider", "chr1", 10, 20),
            Err(RbpMapsError::MalformedFeature("bad line".to_string())),
        ];

        let maps = MatrixBuilder::new(spec(), &source)
            .build(&EventLayout::for_event(EventType::Interval), &records)
            .unwrap();

        assert_eq!(maps.n_features(), 1);
        assert_eq!(maps.excluded_count(), 4);

        let reasons: Vec<&ExclusionReason> = maps.excluded.iter().map(|e| &e.reason).collect();
        assert_eq!(reasons[0], &ExclusionReason::InvalidStrand(".".to_string()));
        assert_eq!(reasons[1], &ExclusionReason::EmptySignal);
        assert!(matches!(reasons[2], ExclusionReason::WidthMismatch { expected: 5, found: 12, .. }));
        assert!(matches!(reasons[3], ExclusionReason::MalformedFeature(_)));
        assert_eq!(maps.excluded[2].label.as_deref(), Some("wider"));
        assert_eq!(maps.excluded[0].index, 1);
    }

    #[rstest]
    fn test_all_excluded_keeps_an_empty_matrix() {
        let source = signal(vec![1.0; 10]);
        let records = vec![interval_feature("gone", "chrX", 1, 3)];

        let maps = MatrixBuilder::new(WindowSpec::default(), &source)
            .build(&EventLayout::for_event(EventType::SkippedExon), &records)
            .unwrap();

        assert_eq!(maps.matrices.len(), 4);
        assert!(maps.matrices.iter().all(|(_, m)| m.is_empty() && m.n_cols() == 350));
    }

    #[rstest]
    fn test_pdf_rows_sum_to_one() {
        let source = signal((0..100).map(|v| v as f64).collect());
        let records = vec![interval_feature("f", "chr1", 10, 13)];

        let maps = MatrixBuilder::new(spec(), &source)
            .with_row_normalization(RowNormalization::Pdf)
            .build(&EventLayout::for_event(EventType::Interval), &records)
            .unwrap();

        let total: f64 = maps.matrices.get("interval").unwrap().row(0).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[rstest]
    fn test_paired_subtract() {
        let fg = signal(vec![3.0; 100]);
        let bg = signal(vec![1.0; 100]);
        let records = vec![interval_feature("f", "chr1", 10, 13)];

        let maps = MatrixBuilder::paired(spec(), &fg, &bg, PairedNormalization::Subtract)
            .build(&EventLayout::for_event(EventType::Interval), &records)
            .unwrap();
        assert_eq!(maps.matrices.get("interval").unwrap().row(0).to_vec(), vec![2.0; 5]);
    }

    #[rstest]
    fn test_paired_entropy_of_equal_shapes_is_zero() {
        let fg = signal(vec![4.0; 100]);
        let bg = signal(vec![2.0; 100]);
        let records = vec![interval_feature("f", "chr1", 10, 13)];

        let maps = MatrixBuilder::paired(spec(), &fg, &bg, PairedNormalization::default())
            .build(&EventLayout::for_event(EventType::Interval), &records)
            .unwrap();
        let row = maps.matrices.get("interval").unwrap().row(0).to_vec();
        assert!(row.iter().all(|v| v.abs() < 1e-12));
    }

    #[rstest]
    fn test_paired_without_background_signal_is_excluded() {
        let fg = signal(vec![4.0; 100]);
        let bg = StrandedSignal::new(MemoryTrack::new(), MemoryTrack::new());
        let records = vec![interval_feature("f", "chr1", 10, 13)];

        let maps = MatrixBuilder::paired(spec(), &fg, &bg, PairedNormalization::Subtract)
            .build(&EventLayout::for_event(EventType::Interval), &records)
            .unwrap();
        assert_eq!(maps.excluded[0].reason, ExclusionReason::EmptySignal);
    }

    #[rstest]
    fn test_bad_pseudocount_fails_the_call() {
        let fg = signal(vec![4.0; 100]);
        let records = vec![interval_feature("f", "chr1", 10, 13)];

        let result = MatrixBuilder::paired(spec(), &fg, &fg, PairedNormalization::Entropy { pseudocount: 0.0 })
            .build(&EventLayout::for_event(EventType::Interval), &records);
        assert!(matches!(result, Err(RbpMapsError::InvalidParameter(_))));
    }
}
