use clap::{Arg, ArgAction, Command, arg};

use crate::config::with_window_args;

pub const DENSITY_CMD: &str = "density";

pub fn create_density_cli() -> Command {
    with_window_args(
        Command::new(DENSITY_CMD)
            .about("Build positional density maps from stranded bigWig tracks around annotated events."),
    )
    .arg(
        arg!(--manifest <MANIFEST>)
            .required(true)
            .help("TSV of name, ip_forward, ip_reverse[, input_forward, input_reverse]"),
    )
    .arg(
        Arg::new("flip")
            .long("flip")
            .action(ArgAction::SetTrue)
            .help("Swap forward and reverse tracks (reads land on the opposite strand)"),
    )
    .arg(
        arg!(--normalization <NORMALIZATION>)
            .required(false)
            .help("raw, pdf, subtract or entropy; subtract and entropy need input tracks (default: raw)"),
    )
}
