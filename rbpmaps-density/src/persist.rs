//! Delimited-text persistence for [`DensityMatrix`].
//!
//! One row per feature, tab separated, with a `label` column followed by the
//! window positions. Sentinels are written as `NaN`, so "no data" survives a
//! round trip and is never confused with `0`. Paths ending in `.gz` are
//! gzip-compressed on write and transparently decompressed on read.

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use rbpmaps_core::errors::{RbpMapsError, Result};
use rbpmaps_core::utils::get_dynamic_reader;

use crate::matrix::DensityMatrix;

/// Output file, gzip-compressed when the path ends in `.gz`.
enum TsvWriter {
    Plain(BufWriter<File>),
    Gzip(BufWriter<GzEncoder<File>>),
}

impl TsvWriter {
    fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        let is_gzipped = path.extension() == Some(std::ffi::OsStr::new("gz"));

        Ok(if is_gzipped {
            TsvWriter::Gzip(BufWriter::new(GzEncoder::new(file, Compression::default())))
        } else {
            TsvWriter::Plain(BufWriter::new(file))
        })
    }

    /// Flush buffered rows and, for gzip, write the trailer.
    fn finish(self) -> Result<()> {
        match self {
            TsvWriter::Plain(mut writer) => writer.flush()?,
            TsvWriter::Gzip(writer) => {
                let encoder = writer.into_inner().map_err(|e| e.into_error())?;
                encoder.finish()?;
            }
        }
        Ok(())
    }
}

impl Write for TsvWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            TsvWriter::Plain(w) => w.write(buf),
            TsvWriter::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            TsvWriter::Plain(w) => w.flush(),
            TsvWriter::Gzip(w) => w.flush(),
        }
    }
}

fn invalid_data(msg: String) -> RbpMapsError {
    RbpMapsError::Io(io::Error::new(io::ErrorKind::InvalidData, msg))
}

impl DensityMatrix {
    ///
    /// Write the matrix as a tab-separated table, rows are features.
    ///
    /// # Arguments
    ///
    /// - path: output file; a `.gz` extension enables compression
    ///
    pub fn write_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = TsvWriter::create(path.as_ref())?;

        write!(writer, "label")?;
        for j in 0..self.n_cols() {
            write!(writer, "\t{}", j)?;
        }
        writeln!(writer)?;

        for (label, row) in self.labels().iter().zip(self.values().rows()) {
            write!(writer, "{}", label)?;
            for value in row {
                write!(writer, "\t{}", value)?;
            }
            writeln!(writer)?;
        }

        writer.finish()
    }

    /// Write the matrix with positions as rows and features as columns.
    pub fn write_tsv_transposed<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = TsvWriter::create(path.as_ref())?;

        write!(writer, "position")?;
        for label in self.labels() {
            write!(writer, "\t{}", label)?;
        }
        writeln!(writer)?;

        for (j, column) in self.values().columns().into_iter().enumerate() {
            write!(writer, "{}", j)?;
            for value in column {
                write!(writer, "\t{}", value)?;
            }
            writeln!(writer)?;
        }

        writer.finish()
    }

    /// Read a matrix written by [`DensityMatrix::write_tsv`].
    pub fn read_tsv<P: AsRef<Path>>(path: P) -> Result<DensityMatrix> {
        let path = path.as_ref();
        let reader = get_dynamic_reader(path)?;
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(invalid_data(format!("{} is empty", path.display()))),
        };
        let n_cols = header.split('\t').count().saturating_sub(1);

        let mut matrix = DensityMatrix::new(n_cols);
        let mut row = Vec::with_capacity(n_cols);

        for (i, line) in lines.enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split('\t');
            let label = fields.next().unwrap_or_default().to_string();

            row.clear();
            for field in fields {
                let value = field.parse::<f64>().map_err(|_| {
                    invalid_data(format!(
                        "{} line {}: '{}' is not a number",
                        path.display(),
                        i + 2,
                        field
                    ))
                })?;
                row.push(value);
            }

            matrix.push_row(label, &row)?;
        }

        Ok(matrix)
    }
}
