use clap::{Command, arg};

pub const COMPARE_CMD: &str = "compare";

pub fn create_compare_cli() -> Command {
    Command::new(COMPARE_CMD)
        .about("Test two saved density matrices against each other, position by position.")
        .arg(
            arg!(--input <INPUT>)
                .required(true)
                .help("Matrix TSV written by density or peaks"),
        )
        .arg(
            arg!(--control <CONTROL>)
                .required(true)
                .help("Matrix TSV of the same region and width"),
        )
        .arg(
            arg!(--output <OUTPUT>)
                .required(true)
                .help("Per-position statistics TSV"),
        )
        .arg(
            arg!(--test <TEST>)
                .required(false)
                .value_parser(["ks", "fisher"])
                .default_value("ks")
                .help("ks for continuous densities, fisher for presence matrices"),
        )
}
