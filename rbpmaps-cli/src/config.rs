use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, arg, value_parser};
use serde::{Deserialize, Serialize};

use rbpmaps_core::models::{EventType, WindowSpec};
use rbpmaps_density::{PairedNormalization, RowNormalization};

/// How a row's density is scaled, and whether an input/control is used.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    #[default]
    Raw,
    Pdf,
    Subtract,
    Entropy,
}

impl Normalization {
    pub fn needs_input(&self) -> bool {
        matches!(self, Normalization::Subtract | Normalization::Entropy)
    }
}

impl FromStr for Normalization {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(Normalization::Raw),
            "pdf" => Ok(Normalization::Pdf),
            "subtract" => Ok(Normalization::Subtract),
            "entropy" => Ok(Normalization::Entropy),
            other => Err(anyhow!(
                "Unknown normalization '{}' (expected raw, pdf, subtract or entropy)",
                other
            )),
        }
    }
}

///
/// Settings for one batch run, read from an optional TOML file and then
/// overridden by command line flags.
///
/// ```toml
/// event_type = "se"
/// normalization = "entropy"
/// pseudocount = 1.0
///
/// [window]
/// exon_offset = 50
/// intron_offset = 300
/// middle_stop = true
/// ```
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub window: WindowSpec,
    pub event_type: EventType,
    pub normalization: Normalization,
    pub pseudocount: f64,
    /// Maps over fewer features than this are flagged as low confidence.
    pub min_features: usize,
    /// Libraries whose reads land on the opposite strand.
    pub flip: bool,
    /// Read reverse-strand tracks as magnitudes.
    pub absolute: bool,
    pub outlier_quantile: Option<f64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            window: WindowSpec::default(),
            event_type: EventType::SkippedExon,
            normalization: Normalization::default(),
            pseudocount: 1.0,
            min_features: 100,
            flip: false,
            absolute: true,
            outlier_quantile: None,
        }
    }
}

impl RunConfig {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = read_to_string(path).with_context(|| format!("Can't read config {}", path.display()))?;
        let config = toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// The config file named by `--config` (or the defaults) with every
    /// flag the user passed applied on top.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let mut config = match matches.get_one::<String>("config") {
            Some(path) => Self::from_toml(path)?,
            None => Self::default(),
        };

        let window = &mut config.window;
        if let Some(v) = matches.get_one::<u64>("exon-offset") {
            window.exon_offset = *v;
        }
        if let Some(v) = matches.get_one::<u64>("intron-offset") {
            window.intron_offset = *v;
        }
        if let Some(v) = matches.get_one::<u64>("left-margin") {
            window.left_margin = *v;
        }
        if let Some(v) = matches.get_one::<u64>("right-margin") {
            window.right_margin = *v;
        }
        if flag(matches, "no-truncate") {
            window.truncate = false;
        }
        if flag(matches, "middle-stop") {
            window.middle_stop = true;
        }
        if flag(matches, "flip") {
            config.flip = true;
        }

        if let Some(event_type) = matches.get_one::<String>("event-type") {
            config.event_type = event_type.parse()?;
        }
        if let Ok(Some(normalization)) = matches.try_get_one::<String>("normalization") {
            config.normalization = normalization.parse()?;
        }
        if let Ok(Some(n)) = matches.try_get_one::<usize>("min-features") {
            config.min_features = *n;
        }

        Ok(config)
    }

    pub fn row_normalization(&self) -> RowNormalization {
        match self.normalization {
            Normalization::Pdf | Normalization::Subtract => RowNormalization::Pdf,
            Normalization::Raw | Normalization::Entropy => RowNormalization::Raw,
        }
    }

    pub fn paired_normalization(&self) -> Option<PairedNormalization> {
        match self.normalization {
            Normalization::Subtract => Some(PairedNormalization::Subtract),
            Normalization::Entropy => Some(PairedNormalization::Entropy {
                pseudocount: self.pseudocount,
            }),
            Normalization::Raw | Normalization::Pdf => None,
        }
    }
}

/// True when a boolean flag exists on this subcommand and was set.
fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches!(matches.try_get_one::<bool>(id), Ok(Some(true)))
}

/// Annotation, config and window flags shared by the map-building commands.
pub fn with_window_args(cmd: Command) -> Command {
    cmd.arg(
        arg!(--annotation <ANNOTATION>)
            .required(true)
            .help("Event table (rMATS) or BED6 file, optionally gzipped"),
    )
    .arg(
        Arg::new("event-type")
            .long("event-type")
            .required(false)
            .help("se, a3ss, a5ss, ri or bed (default: se)"),
    )
    .arg(
        arg!(--output <OUTPUT>)
            .required(true)
            .help("Output directory"),
    )
    .arg(
        arg!(--config <CONFIG>)
            .required(false)
            .help("TOML run config; flags override its values"),
    )
    .arg(
        Arg::new("exon-offset")
            .long("exon-offset")
            .value_parser(value_parser!(u64))
            .help("Bases read into the exon at each splice site (default: 50)"),
    )
    .arg(
        Arg::new("intron-offset")
            .long("intron-offset")
            .value_parser(value_parser!(u64))
            .help("Bases read into the intron at each splice site (default: 300)"),
    )
    .arg(
        Arg::new("left-margin")
            .long("left-margin")
            .value_parser(value_parser!(u64))
            .help("Bases upstream of BED intervals"),
    )
    .arg(
        Arg::new("right-margin")
            .long("right-margin")
            .value_parser(value_parser!(u64))
            .help("Bases downstream of BED intervals"),
    )
    .arg(
        Arg::new("no-truncate")
            .long("no-truncate")
            .action(ArgAction::SetTrue)
            .help("Read the full offsets even past neighbouring exons"),
    )
    .arg(
        Arg::new("middle-stop")
            .long("middle-stop")
            .action(ArgAction::SetTrue)
            .help("Stop reads into short introns at the intron midpoint"),
    )
    .arg(
        Arg::new("min-features")
            .long("min-features")
            .value_parser(value_parser!(usize))
            .help("Flag maps built from fewer features than this (default: 100)"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn command() -> Command {
        with_window_args(Command::new("test")).arg(Arg::new("normalization").long("normalization"))
    }

    #[rstest]
    fn test_defaults() {
        let matches = command()
            .try_get_matches_from(["test", "--annotation", "a.txt", "--output", "out"])
            .unwrap();
        let config = RunConfig::from_matches(&matches).unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.window.site_width(), 350);
    }

    #[rstest]
    fn test_toml_with_flag_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            "event_type = \"a3ss\"\nnormalization = \"entropy\"\npseudocount = 0.5\n\n[window]\nexon_offset = 20\nmiddle_stop = true\n",
        )
        .unwrap();

        let matches = command()
            .try_get_matches_from([
                "test",
                "--annotation",
                "a.txt",
                "--output",
                "out",
                "--config",
                path.to_str().unwrap(),
                "--intron-offset",
                "100",
                "--no-truncate",
            ])
            .unwrap();
        let config = RunConfig::from_matches(&matches).unwrap();

        assert_eq!(config.event_type, EventType::Alt3SS);
        assert_eq!(config.window.exon_offset, 20);
        assert_eq!(config.window.intron_offset, 100);
        assert!(config.window.middle_stop);
        assert!(!config.window.truncate);
        assert_eq!(
            config.paired_normalization(),
            Some(PairedNormalization::Entropy { pseudocount: 0.5 })
        );
    }

    #[rstest]
    fn test_bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, "event_type = \"nope\"\n").unwrap();
        assert!(RunConfig::from_toml(&path).is_err());
    }

    #[rstest]
    #[case("raw", RowNormalization::Raw, None)]
    #[case("pdf", RowNormalization::Pdf, None)]
    #[case("subtract", RowNormalization::Pdf, Some(PairedNormalization::Subtract))]
    fn test_normalization_mapping(
        #[case] name: &str,
        #[case] row: RowNormalization,
        #[case] paired: Option<PairedNormalization>,
    ) {
        let config = RunConfig {
            normalization: name.parse().unwrap(),
            ..Default::default()
        };
        assert_eq!(config.row_normalization(), row);
        assert_eq!(config.paired_normalization(), paired);
        assert_eq!(config.normalization.needs_input(), paired.is_some());
    }
}
