mod compare;
mod config;
mod density;
mod manifest;
mod peaks;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use log::Level;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "rbpmaps";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Positional maps of RNA-binding protein signal around splice sites and genomic features.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log per-feature exclusions and other debug output"),
        )
        .subcommand(density::cli::create_density_cli())
        .subcommand(peaks::cli::create_peaks_cli())
        .subcommand(compare::cli::create_compare_cli())
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    let level = if matches.get_flag("verbose") {
        Level::Debug
    } else {
        Level::Info
    };
    simple_logger::init_with_level(level)?;

    match matches.subcommand() {
        //
        // DENSITY MAPS
        //
        Some((density::cli::DENSITY_CMD, matches)) => {
            density::handlers::run_density(matches)?;
        }

        //
        // PEAK MAPS
        //
        Some((peaks::cli::PEAKS_CMD, matches)) => {
            peaks::handlers::run_peaks(matches)?;
        }

        //
        // CONDITION COMPARISON
        //
        Some((compare::cli::COMPARE_CMD, matches)) => {
            compare::handlers::run_compare(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::*;

    #[rstest]
    fn test_parser_is_consistent() {
        build_parser().debug_assert();
    }

    #[rstest]
    #[case(&["rbpmaps", "compare", "--input", "a.tsv", "--control", "b.tsv", "--output", "c.tsv", "--verbose"])]
    #[case(&["rbpmaps", "-v", "density", "--manifest", "m.tsv", "--annotation", "se.txt", "--output", "out"])]
    fn test_verbose_is_global(#[case] args: &[&str]) {
        let matches = build_parser().try_get_matches_from(args).unwrap();
        assert!(matches.get_flag("verbose"));
    }
}
