use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use log::{error, info, warn};

use rbpmaps_core::annotation::read_features;
use rbpmaps_core::models::FeatureRecord;
use rbpmaps_density::{BuiltMaps, EventLayout, MatrixBuilder, RowNormalization};
use rbpmaps_signal::{PeakAggregation, PeakFilter, PeakSource};
use rbpmaps_stats::{Alternative, fisher_compare, fraction_summary, neg_log10_p};

use crate::config::RunConfig;
use crate::manifest::{PeakRow, read_peak_manifest};
use crate::progress::batch_progress;
use crate::summary::{RegionSummary, RunSummary};

/// Everything one manifest row needs besides its own peaks.
struct PeakRun<'a> {
    config: &'a RunConfig,
    filter: PeakFilter,
    aggregation: PeakAggregation,
    layout: EventLayout,
    foreground: &'a [FeatureRecord],
    background: &'a [FeatureRecord],
    output: &'a Path,
}

pub fn run_peaks(matches: &ArgMatches) -> Result<()> {
    let manifest = matches
        .get_one::<String>("manifest")
        .context("A manifest is required.")?;
    let annotation = matches
        .get_one::<String>("annotation")
        .context("An annotation file is required.")?;
    let background = matches
        .get_one::<String>("background")
        .context("A background annotation is required.")?;
    let output = PathBuf::from(
        matches
            .get_one::<String>("output")
            .context("An output directory is required.")?,
    );

    let config = RunConfig::from_matches(matches)?;
    let filter = PeakFilter {
        min_log10_pvalue: *matches.get_one::<f64>("min-log10p").unwrap_or(&3.0),
        min_log2_fold_change: *matches.get_one::<f64>("min-log2fc").unwrap_or(&3.0),
    };
    let aggregation = match matches.get_one::<String>("aggregation").map(String::as_str) {
        Some("min") => PeakAggregation::Min,
        Some("sum") | None => PeakAggregation::Sum,
        Some(other) => return Err(anyhow!("Unknown aggregation: {}", other)),
    };

    let rows = read_peak_manifest(manifest)?;
    let foreground = read_features(annotation, config.event_type)
        .with_context(|| format!("Can't read annotation {}", annotation))?;
    let background = read_features(background, config.event_type)
        .with_context(|| format!("Can't read background {}", background))?;
    info!(
        "{} peak sets, {} events against {} background events",
        rows.len(),
        foreground.len(),
        background.len()
    );
    create_dir_all(&output)?;

    let run = PeakRun {
        config: &config,
        filter,
        aggregation,
        layout: EventLayout::for_event(config.event_type),
        foreground: &foreground,
        background: &background,
        output: &output,
    };

    let bar = batch_progress(rows.len())?;
    let mut failed = Vec::new();
    for row in &rows {
        bar.set_message(row.name.clone());
        if let Err(e) = run.row(row) {
            error!("{}: {:#}", row.name, e);
            failed.push(row.name.as_str());
        }
        bar.inc(1);
    }
    bar.finish_with_message("done");

    if !failed.is_empty() {
        bail!(
            "{} of {} manifest rows failed: {}",
            failed.len(),
            rows.len(),
            failed.join(", ")
        );
    }
    Ok(())
}

impl PeakRun<'_> {
    fn build(&self, source: &PeakSource, records: &[FeatureRecord]) -> Result<BuiltMaps> {
        let maps = MatrixBuilder::new(self.config.window, source)
            .with_row_normalization(RowNormalization::Presence)
            .build(&self.layout, records)?;
        Ok(maps)
    }

    /// Fraction and SEM per region, with `-log10 p` of foreground enrichment.
    fn region_summaries(&self, foreground: &BuiltMaps, background: &BuiltMaps) -> Result<Vec<RegionSummary>> {
        foreground
            .matrices
            .iter()
            .map(|(region, matrix)| -> Result<RegionSummary> {
                let fractions = fraction_summary(matrix)?;
                let control = background
                    .matrices
                    .get(region)
                    .ok_or_else(|| anyhow!("No background matrix for {}", region))?;
                let neg_log10_p = if control.is_empty() {
                    None
                } else {
                    let tests = fisher_compare(matrix, control, Alternative::Greater)?;
                    Some(tests.iter().map(|t| neg_log10_p(t.p_value)).collect())
                };

                Ok(RegionSummary {
                    region: region.to_string(),
                    n_positions: matrix.n_cols(),
                    mean: fractions.fraction,
                    sem: fractions.sem,
                    neg_log10_p,
                })
            })
            .collect()
    }

    fn row(&self, row: &PeakRow) -> Result<()> {
        let source = PeakSource::from_bed(&row.peaks, self.filter)
            .with_context(|| format!("Can't read peaks {}", row.peaks.display()))?
            .with_aggregation(self.aggregation);

        let foreground = self.build(&source, self.foreground)?;
        let background = self.build(&source, self.background)?;

        for (region, matrix) in foreground.matrices.iter() {
            let path = self.output.join(format!("{}.{}.tsv.gz", row.name, region));
            matrix
                .write_tsv(&path)
                .with_context(|| format!("Can't write {}", path.display()))?;
        }

        let mut summary = RunSummary::from_maps(
            &row.name,
            self.config.event_type.as_str(),
            &foreground,
            self.config.min_features,
            None,
        )?;
        summary.regions = self.region_summaries(&foreground, &background)?;
        if summary.low_confidence {
            warn!(
                "{}: only {} features (minimum {}), map is low confidence",
                row.name, summary.n_features, self.config.min_features
            );
        }
        summary.write_json(self.output.join(format!("{}.summary.json", row.name)))?;

        info!(
            "{}: {} features against {} background",
            row.name,
            summary.n_features,
            background.n_features()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::peaks::cli::create_peaks_cli;

    #[rstest]
    fn test_peak_run_writes_fraction_and_pvalues() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, content: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            path.to_str().unwrap().to_string()
        };

        // every foreground interval is covered by a peak, no background one is
        let annotation = write(
            "fg.bed",
            "chr1\t100\t110\tf1\t0\t+\nchr1\t200\t210\tf2\t0\t+\nchr1\t300\t310\tf3\t0\t+\n",
        );
        let background = write(
            "bg.bed",
            "chr1\t1000\t1010\tb1\t0\t+\nchr1\t2000\t2010\tb2\t0\t+\nchr1\t3000\t3010\tb3\t0\t+\n",
        );
        let peaks = write(
            "peaks.bed",
            "chr1\t90\t400\t10.0\t5.0\t+\nchr1\t500\t600\t1.0\t5.0\t+\n",
        );
        let manifest = write("manifest.tsv", &format!("RBFOX2\t{}\n", peaks));
        let output = dir.path().join("out");

        let matches = create_peaks_cli()
            .try_get_matches_from([
                "peaks",
                "--manifest",
                manifest.as_str(),
                "--annotation",
                annotation.as_str(),
                "--background",
                background.as_str(),
                "--event-type",
                "bed",
                "--output",
                output.to_str().unwrap(),
            ])
            .unwrap();
        run_peaks(&matches).unwrap();

        assert!(output.join("RBFOX2.interval.tsv.gz").exists());
        let json: serde_json::Value =
            serde_json::from_reader(std::fs::File::open(output.join("RBFOX2.summary.json")).unwrap()).unwrap();
        let region = &json["regions"][0];
        assert_eq!(region["region"], "interval");
        assert_eq!(region["mean"][0], 1.0);
        assert!(region["neg_log10_p"][0].as_f64().unwrap() > 1.0);
    }
}
