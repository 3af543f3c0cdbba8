use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use rbpmaps_density::BuiltMaps;
use rbpmaps_stats::{StatResult, summarize};

/// Per-position mean and SEM of one region. Sentinel positions serialize as `null`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RegionSummary {
    pub region: String,
    pub n_positions: usize,
    pub mean: Vec<f64>,
    pub sem: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neg_log10_p: Option<Vec<f64>>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExcludedFeature {
    pub index: usize,
    pub label: Option<String>,
    pub reason: String,
}

/// Everything written to `<name>.summary.json`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub name: String,
    pub event_type: String,
    pub n_features: usize,
    pub n_excluded: usize,
    /// Fewer features than the configured minimum.
    pub low_confidence: bool,
    pub regions: Vec<RegionSummary>,
    pub excluded: Vec<ExcludedFeature>,
}

impl RunSummary {
    pub fn from_maps(
        name: &str,
        event_type: &str,
        maps: &BuiltMaps,
        min_features: usize,
        outlier_quantile: Option<f64>,
    ) -> Result<Self> {
        let regions = maps
            .matrices
            .iter()
            .map(|(region, matrix)| -> Result<RegionSummary> {
                let summary = summarize(matrix, outlier_quantile)?;
                Ok(RegionSummary {
                    region: region.to_string(),
                    n_positions: matrix.n_cols(),
                    mean: summary.iter().map(|s| s.mean).collect(),
                    sem: summary.iter().map(|s| s.sem).collect(),
                    neg_log10_p: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let excluded = maps
            .excluded
            .iter()
            .map(|e| ExcludedFeature {
                index: e.index,
                label: e.label.clone(),
                reason: e.reason.to_string(),
            })
            .collect();

        Ok(RunSummary {
            name: name.to_string(),
            event_type: event_type.to_string(),
            n_features: maps.n_features(),
            n_excluded: maps.excluded_count(),
            low_confidence: maps.n_features() < min_features,
            regions,
            excluded,
        })
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("Can't create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("Can't write {}", path.display()))?;
        writer.flush()?;
        Ok(())
    }
}

/// `-log10(p)` of each result, signed by direction.
pub fn signed_log_p(results: &[StatResult]) -> Vec<f64> {
    results.iter().map(|r| r.signed_log_p()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rbpmaps_density::{DensityMatrix, Exclusion, ExclusionReason, RegionMatrices};
    use rstest::*;

    #[fixture]
    fn maps() -> BuiltMaps {
        let mut matrices = RegionMatrices::new();
        matrices.insert(
            "interval",
            DensityMatrix::from_rows(
                vec!["a".to_string(), "b".to_string()],
                vec![vec![1.0, f64::NAN], vec![3.0, f64::NAN]],
            )
            .unwrap(),
        );
        BuiltMaps {
            matrices,
            excluded: vec![Exclusion {
                index: 2,
                label: Some("c".to_string()),
                reason: ExclusionReason::EmptySignal,
            }],
        }
    }

    #[rstest]
    fn test_summary_fields(maps: BuiltMaps) {
        let summary = RunSummary::from_maps("RBFOX2", "bed", &maps, 100, None).unwrap();
        assert_eq!(summary.n_features, 2);
        assert_eq!(summary.n_excluded, 1);
        assert!(summary.low_confidence);
        assert_eq!(summary.regions[0].mean[0], 2.0);
        assert_eq!(summary.excluded[0].reason, "no signal");
    }

    #[rstest]
    fn test_json_writes_sentinel_as_null(maps: BuiltMaps) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RBFOX2.summary.json");
        RunSummary::from_maps("RBFOX2", "bed", &maps, 1, None)
            .unwrap()
            .write_json(&path)
            .unwrap();

        let json: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(json["name"], "RBFOX2");
        assert_eq!(json["low_confidence"], false);
        assert!(json["regions"][0]["mean"][1].is_null());
        assert!(json["regions"][0].get("neg_log10_p").is_none());
    }
}
