use clap::{Arg, Command, arg, value_parser};

use crate::config::with_window_args;

pub const PEAKS_CMD: &str = "peaks";

pub fn create_peaks_cli() -> Command {
    with_window_args(
        Command::new(PEAKS_CMD)
            .about("Map the fraction of events covered by significant peaks, tested against background events."),
    )
    .arg(
        arg!(--manifest <MANIFEST>)
            .required(true)
            .help("TSV of name, input-normalized peak BED (a bare BED path is named after the file)"),
    )
    .arg(
        arg!(--background <BACKGROUND>)
            .required(true)
            .help("Background events, same format as --annotation"),
    )
    .arg(
        Arg::new("min-log10p")
            .long("min-log10p")
            .value_parser(value_parser!(f64))
            .default_value("3")
            .help("Keep peaks with -log10(p) at least this"),
    )
    .arg(
        Arg::new("min-log2fc")
            .long("min-log2fc")
            .value_parser(value_parser!(f64))
            .default_value("3")
            .help("Keep peaks with log2 fold change at least this"),
    )
    .arg(
        arg!(--aggregation <AGGREGATION>)
            .required(false)
            .value_parser(["sum", "min"])
            .default_value("sum")
            .help("Combine overlapping peaks by summing scores or keeping the smallest"),
    )
}
