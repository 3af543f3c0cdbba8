use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use log::{error, info, warn};

use rbpmaps_core::annotation::read_features;
use rbpmaps_core::models::FeatureRecord;
use rbpmaps_density::{BuiltMaps, EventLayout, MatrixBuilder};
use rbpmaps_signal::{BigWigTrack, StrandedSignal};

use crate::config::RunConfig;
use crate::manifest::{ManifestRow, SignalPair, read_manifest};
use crate::progress::batch_progress;
use crate::summary::RunSummary;

pub fn run_density(matches: &ArgMatches) -> Result<()> {
    let manifest = matches
        .get_one::<String>("manifest")
        .context("A manifest is required.")?;
    let annotation = matches
        .get_one::<String>("annotation")
        .context("An annotation file is required.")?;
    let output = PathBuf::from(
        matches
            .get_one::<String>("output")
            .context("An output directory is required.")?,
    );

    let config = RunConfig::from_matches(matches)?;
    let rows = read_manifest(manifest)?;
    let records = read_features(annotation, config.event_type)
        .with_context(|| format!("Can't read annotation {}", annotation))?;
    let layout = EventLayout::for_event(config.event_type);

    info!(
        "{} libraries, {} {} events, normalization {:?}",
        rows.len(),
        records.len(),
        config.event_type,
        config.normalization
    );
    create_dir_all(&output)?;

    let bar = batch_progress(rows.len())?;
    let mut failed = Vec::new();
    for row in &rows {
        bar.set_message(row.name.clone());
        if let Err(e) = run_row(row, &records, &layout, &config, &output) {
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

fn open_signal(pair: &SignalPair, config: &RunConfig) -> Result<StrandedSignal<BigWigTrack>> {
    let forward = BigWigTrack::open(&pair.forward)
        .with_context(|| format!("Can't open {}", pair.forward.display()))?;
    let reverse = BigWigTrack::open(&pair.reverse)
        .with_context(|| format!("Can't open {}", pair.reverse.display()))?;
    Ok(StrandedSignal::new(forward, reverse)
        .flipped(config.flip)
        .absolute(config.absolute))
}

fn build_maps(
    row: &ManifestRow,
    records: &[FeatureRecord],
    layout: &EventLayout,
    config: &RunConfig,
) -> Result<BuiltMaps> {
    if config.normalization.needs_input() && row.input.is_none() {
        bail!(
            "{:?} normalization needs input tracks, but {} has none",
            config.normalization,
            row.name
        );
    }
    let ip = open_signal(&row.ip, config)?;

    let maps = match (config.paired_normalization(), &row.input) {
        (Some(normalization), Some(input)) => {
            let input = open_signal(input, config)?;
            MatrixBuilder::paired(config.window, &ip, &input, normalization)
                .with_row_normalization(config.row_normalization())
                .build(layout, records)?
        }
        _ => MatrixBuilder::new(config.window, &ip)
            .with_row_normalization(config.row_normalization())
            .build(layout, records)?,
    };
    Ok(maps)
}

fn run_row(
    row: &ManifestRow,
    records: &[FeatureRecord],
    layout: &EventLayout,
    config: &RunConfig,
    output: &Path,
) -> Result<()> {
    let maps = build_maps(row, records, layout, config)?;

    for (region, matrix) in maps.matrices.iter() {
        let path = output.join(format!("{}.{}.tsv.gz", row.name, region));
        matrix
            .write_tsv(&path)
            .with_context(|| format!("Can't write {}", path.display()))?;
    }

    let summary = RunSummary::from_maps(
        &row.name,
        config.event_type.as_str(),
        &maps,
        config.min_features,
        config.outlier_quantile,
    )?;
    if summary.low_confidence {
        warn!(
            "{}: only {} features (minimum {}), map is low confidence",
            row.name, summary.n_features, config.min_features
        );
    }
    summary.write_json(output.join(format!("{}.summary.json", row.name)))?;

    info!(
        "{}: {} features, {} excluded",
        row.name, summary.n_features, summary.n_excluded
    );
    Ok(())
}
