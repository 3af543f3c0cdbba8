//! Annotation readers that turn event tables into [`Feature`]s.
//!
//! Two layouts are understood:
//!
//! - rMATS-style event tables (`se`, `a3ss`, `a5ss`, `ri`), located by header name
//! - BED6 (`bed`), one interval per line
//!
//! Every line yields a [`FeatureRecord`]: failures on a single line are kept as
//! `Err` records so that the caller can skip them and report how many were lost.
//! Only problems with the file as a whole (I/O, missing header columns) are
//! returned as errors.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use log::debug;

use crate::errors::{RbpMapsError, Result};
use crate::models::{EventType, Feature, FeatureRecord, GenomicInterval, Strand};
use crate::utils::{get_dynamic_reader, is_comment_line};

/// Header columns holding the (start, end) pairs of each event type, in the
/// order the pairs are read.
fn coordinate_columns(event_type: EventType) -> &'static [(&'static str, &'static str)] {
    match event_type {
        EventType::SkippedExon => &[
            ("upstreamES", "upstreamEE"),
            ("exonStart_0base", "exonEnd"),
            ("downstreamES", "downstreamEE"),
        ],
        EventType::Alt3SS | EventType::Alt5SS => &[
            ("longExonStart_0base", "longExonEnd"),
            ("shortES", "shortEE"),
            ("flankingES", "flankingEE"),
        ],
        EventType::RetainedIntron => &[
            ("upstreamES", "upstreamEE"),
            ("downstreamES", "downstreamEE"),
        ],
        EventType::Interval => &[],
    }
}

///
/// Read every event of a given type from an annotation file (plain or gzip'd).
///
/// # Arguments
/// - path: path to the rMATS table or BED6 file
/// - event_type: the layout of the file
///
pub fn read_features<P: AsRef<Path>>(path: P, event_type: EventType) -> Result<Vec<FeatureRecord>> {
    let reader = get_dynamic_reader(path.as_ref())?;
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?);
    }

    let records = match event_type {
        EventType::Interval => parse_bed6(&lines),
        _ => parse_event_table(&lines, event_type)?,
    };

    debug!(
        "Read {} {} records from {}",
        records.len(),
        event_type,
        path.as_ref().display()
    );

    Ok(records)
}

///
/// Parse BED6 lines (`chrom start end name score strand`) into single-interval features.
///
pub fn parse_bed6<S: AsRef<str>>(lines: &[S]) -> Vec<FeatureRecord> {
    lines
        .iter()
        .map(|l| l.as_ref())
        .enumerate()
        .filter(|(_, line)| !is_comment_line(line))
        .map(|(i, line)| parse_bed6_line(line, i + 1))
        .collect()
}

fn parse_bed6_line(line: &str, line_no: usize) -> FeatureRecord {
    let fields: Vec<&str> = line.split('\t').map(|f| f.trim()).collect();
    if fields.len() < 6 {
        return Err(RbpMapsError::MalformedFeature(format!(
            "line {}: expected 6 BED columns, found {}",
            line_no,
            fields.len()
        )));
    }

    let start = parse_coordinate(fields[1], "start", line_no)?;
    let end = parse_coordinate(fields[2], "end", line_no)?;
    let strand: Strand = fields[5].parse()?;
    let interval = GenomicInterval::new(fields[0], start, end, strand)?;

    Feature::new(fields[3], vec![interval])
}

///
/// Parse an rMATS-style event table. The first non-comment line is the header.
///
pub fn parse_event_table<S: AsRef<str>>(
    lines: &[S],
    event_type: EventType,
) -> Result<Vec<FeatureRecord>> {
    let mut body = lines
        .iter()
        .map(|l| l.as_ref())
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with('#'));

    let Some((_, header)) = body.next() else {
        return Ok(Vec::new());
    };

    let columns: HashMap<&str, usize> = header
        .split('\t')
        .enumerate()
        .map(|(i, name)| (name.trim(), i))
        .collect();

    let lookup = |name: &str| -> Result<usize> {
        columns.get(name).copied().ok_or_else(|| {
            RbpMapsError::MalformedFeature(format!(
                "{} table is missing the '{}' column",
                event_type, name
            ))
        })
    };

    let chrom_col = lookup("chr")?;
    let strand_col = lookup("strand")?;
    let id_col = columns.get("ID").copied();
    let pairs = coordinate_columns(event_type)
        .iter()
        .map(|(s, e)| Ok((lookup(s)?, lookup(e)?)))
        .collect::<Result<Vec<(usize, usize)>>>()?;

    let layout = TableLayout {
        event_type,
        chrom_col,
        strand_col,
        id_col,
        pairs,
    };

    Ok(body
        .map(|(i, line)| layout.parse_line(line, i + 1))
        .collect())
}

struct TableLayout {
    event_type: EventType,
    chrom_col: usize,
    strand_col: usize,
    id_col: Option<usize>,
    pairs: Vec<(usize, usize)>,
}

impl TableLayout {
    fn parse_line(&self, line: &str, line_no: usize) -> FeatureRecord {
        let fields: Vec<&str> = line.split('\t').map(|f| f.trim()).collect();
        let field = |col: usize| -> Result<&str> {
            fields.get(col).copied().ok_or_else(|| {
                RbpMapsError::MalformedFeature(format!(
                    "line {}: expected at least {} columns, found {}",
                    line_no,
                    col + 1,
                    fields.len()
                ))
            })
        };

        let chrom = field(self.chrom_col)?;
        let strand: Strand = field(self.strand_col)?.parse()?;

        let mut intervals = Vec::with_capacity(self.pairs.len());
        for (start_col, end_col) in &self.pairs {
            let start = parse_coordinate(field(*start_col)?, "start", line_no)?;
            let end = parse_coordinate(field(*end_col)?, "end", line_no)?;
            intervals.push(GenomicInterval::new(chrom, start, end, strand)?);
        }

        let intervals = transcript_order(self.event_type, intervals, strand);

        let label = match self.id_col {
            Some(col) => field(col)?.to_string(),
            None => String::new(),
        };

        let feature = Feature::new(label, intervals)?;
        if feature.label().is_empty() {
            let label = feature.to_string();
            return Feature::new(label, feature.intervals().to_vec());
        }
        Ok(feature)
    }
}

/// Reorder intervals read from the table (`pairs` order) into transcript order.
///
/// Event tables name exons by genomic position ("upstream" = lower
/// coordinates), so on the minus strand the flanking exons swap places.
fn transcript_order(
    event_type: EventType,
    mut intervals: Vec<GenomicInterval>,
    strand: Strand,
) -> Vec<GenomicInterval> {
    match event_type {
        EventType::SkippedExon | EventType::RetainedIntron => {
            if strand.is_minus() {
                intervals.reverse();
            }
            intervals
        }
        // read as [long, short, flanking]
        EventType::Alt3SS => {
            intervals.rotate_right(1);
            intervals
        }
        EventType::Alt5SS | EventType::Interval => intervals,
    }
}

fn parse_coordinate(field: &str, name: &str, line_no: usize) -> Result<u64> {
    field.parse::<u64>().map_err(|_| {
        RbpMapsError::MalformedFeature(format!(
            "line {}: can't parse {} coordinate '{}'",
            line_no, name, field
        ))
    })
}
