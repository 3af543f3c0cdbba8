use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bigtools::BigWigRead;
use bigtools::utils::reopen::ReopenableFile;
use fxhash::FxHashMap;

use rbpmaps_core::errors::{RbpMapsError, Result};

use crate::track::Track;
use crate::sentinel_fill;

///
/// A bigWig file read as a [`Track`].
///
/// The file is opened once; the reader sits behind a mutex so one handle can
/// serve queries from several threads. Bases the file has no interval for are
/// reported as [`SENTINEL`](crate::SENTINEL). The handle is released when the track is dropped.
///
pub struct BigWigTrack {
    path: PathBuf,
    reader: Mutex<BigWigRead<ReopenableFile>>,
    chrom_sizes: FxHashMap<String, u32>,
}

impl BigWigTrack {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = BigWigRead::open_file(&path).map_err(|e| {
            io::Error::other(format!("Can't open bigWig {}: {}", path.display(), e))
        })?;

        let chrom_sizes = reader
            .chroms()
            .iter()
            .map(|c| (c.name.clone(), c.length))
            .collect();

        Ok(BigWigTrack {
            path,
            reader: Mutex::new(reader),
            chrom_sizes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn chrom_size(&self, chrom: &str) -> Option<u32> {
        self.chrom_sizes.get(chrom).copied()
    }
}

impl Track for BigWigTrack {
    fn query(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<f64>> {
        let chrom_size = self
            .chrom_size(chrom)
            .ok_or_else(|| RbpMapsError::MissingChromosome(chrom.to_string()))?
            as u64;

        let mut values = sentinel_fill(end.saturating_sub(start) as usize);
        let query_end = end.min(chrom_size);
        if start >= query_end {
            return Ok(values);
        }

        let mut reader = self
            .reader
            .lock()
            .map_err(|_| io::Error::other("bigWig reader lock poisoned"))?;

        let intervals = reader
            .get_interval(chrom, start as u32, query_end as u32)
            .map_err(|e| io::Error::other(e.to_string()))?;

        for interval in intervals {
            let interval = interval.map_err(|e| io::Error::other(e.to_string()))?;
            // clip interval to requested region
            let s = (interval.start as u64).max(start);
            let e = (interval.end as u64).min(query_end);
            for pos in s..e {
                values[(pos - start) as usize] = interval.value as f64;
            }
        }

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    fn test_open_missing_file_is_io_error() {
        let result = BigWigTrack::open("not/a/real/file.bw");
        assert!(matches!(result, Err(RbpMapsError::Io(_))));
    }

    #[rstest]
    fn test_open_non_bigwig_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.bw");
        std::fs::write(&path, b"definitely not a bigwig").unwrap();

        assert!(BigWigTrack::open(&path).is_err());
    }
}
