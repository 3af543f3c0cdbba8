use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use log::info;

use rbpmaps_density::DensityMatrix;
use rbpmaps_stats::{Alternative, StatResult, fisher_compare, ks_compare};

pub fn run_compare(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<String>("input")
        .context("An input matrix is required.")?;
    let control = matches
        .get_one::<String>("control")
        .context("A control matrix is required.")?;
    let output = matches
        .get_one::<String>("output")
        .context("An output path is required.")?;
    let test = matches.get_one::<String>("test").map(String::as_str).unwrap_or("ks");

    let input_matrix = DensityMatrix::read_tsv(input).with_context(|| format!("Can't read {}", input))?;
    let control_matrix = DensityMatrix::read_tsv(control).with_context(|| format!("Can't read {}", control))?;

    let results = match test {
        "ks" => ks_compare(&input_matrix, &control_matrix)?,
        "fisher" => fisher_compare(&input_matrix, &control_matrix, Alternative::Greater)?,
        other => bail!("Unknown test: {}", other),
    };

    write_results(&results, output)?;
    info!(
        "{} test over {} positions ({} vs {} rows) written to {}",
        test,
        results.len(),
        input_matrix.n_rows(),
        control_matrix.n_rows(),
        output
    );
    Ok(())
}

fn write_results<P: AsRef<Path>>(results: &[StatResult], path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Can't create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "position\tstatistic\tp_value\tsigned_log_p\tsigned_log_d")?;
    for (position, result) in results.iter().enumerate() {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            position,
            result.statistic,
            result.p_value,
            result.signed_log_p(),
            result.signed_log_statistic()
        )?;
    }
    writer.flush()?;
    Ok(())
}
