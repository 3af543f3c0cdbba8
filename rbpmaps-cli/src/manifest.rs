use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use rbpmaps_core::utils::{get_dynamic_reader, remove_all_extensions};

/// Forward and reverse strand signal files of one library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalPair {
    pub forward: PathBuf,
    pub reverse: PathBuf,
}

/// One `density` manifest row: an IP library and, optionally, its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    pub name: String,
    pub ip: SignalPair,
    pub input: Option<SignalPair>,
}

/// One `peaks` manifest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakRow {
    pub name: String,
    pub peaks: PathBuf,
}

/// Tab-separated records of a manifest, without blank, `#` and header lines.
fn records(path: &Path) -> Result<Vec<(usize, Vec<String>)>> {
    let reader = get_dynamic_reader(path).with_context(|| format!("Can't open manifest {}", path.display()))?;

    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<String> = trimmed.split('\t').map(|f| f.trim().to_string()).collect();
        if fields[0] == "name" {
            continue;
        }
        records.push((i + 1, fields));
    }
    Ok(records)
}

///
/// Read a `density` manifest: `name ip_forward ip_reverse [input_forward input_reverse]`.
///
pub fn read_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<ManifestRow>> {
    let path = path.as_ref();
    records(path)?
        .into_iter()
        .map(|(line_no, fields)| {
            let pair = |f: usize| SignalPair {
                forward: PathBuf::from(&fields[f]),
                reverse: PathBuf::from(&fields[f + 1]),
            };
            match fields.len() {
                3 => Ok(ManifestRow {
                    name: fields[0].clone(),
                    ip: pair(1),
                    input: None,
                }),
                5 => Ok(ManifestRow {
                    name: fields[0].clone(),
                    ip: pair(1),
                    input: Some(pair(3)),
                }),
                n => bail!(
                    "{} line {}: expected 3 or 5 columns, found {}",
                    path.display(),
                    line_no,
                    n
                ),
            }
        })
        .collect()
}

/// Read a `peaks` manifest: `name peaks_bed`, or just `peaks_bed` to name
/// the row after the file.
pub fn read_peak_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<PeakRow>> {
    let path = path.as_ref();
    records(path)?
        .into_iter()
        .map(|(line_no, fields)| match fields.as_slice() {
            [peaks] => Ok(PeakRow {
                name: remove_all_extensions(Path::new(peaks)),
                peaks: PathBuf::from(peaks),
            }),
            [name, peaks] => Ok(PeakRow {
                name: name.clone(),
                peaks: PathBuf::from(peaks),
            }),
            _ => bail!(
                "{} line {}: expected 1 or 2 columns, found {}",
                path.display(),
                line_no,
                fields.len()
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn write(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.tsv");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[rstest]
    fn test_read_manifest() {
        let (_dir, path) = write(
            "name\tip_forward\tip_reverse\n\
             # comment\n\
             RBFOX2\tip.pos.bw\tip.neg.bw\tin.pos.bw\tin.neg.bw\n\
             \n\
             QKI\tqki.pos.bw\tqki.neg.bw\n",
        );
        let rows = read_manifest(&path).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "RBFOX2");
        assert_eq!(
            rows[0].input,
            Some(SignalPair {
                forward: PathBuf::from("in.pos.bw"),
                reverse: PathBuf::from("in.neg.bw"),
            })
        );
        assert_eq!(rows[1].ip.reverse, PathBuf::from("qki.neg.bw"));
        assert!(rows[1].input.is_none());
    }

    #[rstest]
    fn test_bad_column_count() {
        let (_dir, path) = write("A\ta.bw\n");
        let err = read_manifest(&path).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[rstest]
    fn test_read_peak_manifest() {
        let (_dir, path) = write("RBFOX2\trbfox2.peaks.bed\nQKI\tqki.peaks.bed.gz\n");
        let rows = read_peak_manifest(&path).unwrap();
        assert_eq!(rows[1].peaks, PathBuf::from("qki.peaks.bed.gz"));

        let (_bare_dir, bare) = write("peaks/HNRNPC.peaks.bed.gz\n");
        assert_eq!(read_peak_manifest(&bare).unwrap()[0].name, "HNRNPC");

        let (_bad_dir, bad) = write("A\tb\tc\n");
        assert!(read_peak_manifest(&bad).is_err());
    }
}
