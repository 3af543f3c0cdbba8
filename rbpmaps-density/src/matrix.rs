use std::fmt::{self, Display};

use ndarray::{Array2, ArrayView1, Axis, concatenate};

use rbpmaps_core::errors::{RbpMapsError, Result};
use rbpmaps_signal::is_sentinel;

///
/// Feature-by-position matrix. Row `i` is the window of feature `labels[i]`;
/// every row has the same number of columns.
///
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMatrix {
    labels: Vec<String>,
    values: Array2<f64>,
}

impl DensityMatrix {
    /// An empty matrix `n_cols` wide.
    pub fn new(n_cols: usize) -> Self {
        DensityMatrix {
            labels: Vec::new(),
            values: Array2::zeros((0, n_cols)),
        }
    }

    pub fn from_rows(labels: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if labels.len() != rows.len() {
            return Err(RbpMapsError::DimensionMismatch {
                expected: labels.len(),
                found: rows.len(),
            });
        }

        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut flat = Vec::with_capacity(rows.len() * n_cols);
        for row in &rows {
            if row.len() != n_cols {
                return Err(RbpMapsError::DimensionMismatch {
                    expected: n_cols,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }

        let values = Array2::from_shape_vec((rows.len(), n_cols), flat)
            .map_err(|e| RbpMapsError::InvalidParameter(e.to_string()))?;
        Ok(DensityMatrix { labels, values })
    }

    pub fn push_row(&mut self, label: impl Into<String>, row: &[f64]) -> Result<()> {
        if row.len() != self.n_cols() {
            return Err(RbpMapsError::DimensionMismatch {
                expected: self.n_cols(),
                found: row.len(),
            });
        }
        self.values
            .push_row(ArrayView1::from(row))
            .map_err(|e| RbpMapsError::InvalidParameter(e.to_string()))?;
        self.labels.push(label.into());
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    pub fn column(&self, j: usize) -> ArrayView1<'_, f64> {
        self.values.column(j)
    }

    /// Non-sentinel values of column `j`, in row order.
    pub fn column_values(&self, j: usize) -> Vec<f64> {
        self.values
            .column(j)
            .iter()
            .copied()
            .filter(|v| !is_sentinel(*v))
            .collect()
    }

    ///
    /// Stitch matrices side by side, left to right.
    ///
    /// All parts must have the same number of rows; labels come from the
    /// first part.
    ///
    pub fn concat_columns(parts: &[&DensityMatrix]) -> Result<DensityMatrix> {
        let Some(first) = parts.first() else {
            return Ok(DensityMatrix::new(0));
        };

        for part in parts {
            if part.n_rows() != first.n_rows() {
                return Err(RbpMapsError::DimensionMismatch {
                    expected: first.n_rows(),
                    found: part.n_rows(),
                });
            }
        }

        let views: Vec<_> = parts.iter().map(|p| p.values.view()).collect();
        let values = concatenate(Axis(1), &views).map_err(|e| RbpMapsError::InvalidParameter(e.to_string()))?;

        Ok(DensityMatrix {
            labels: first.labels.clone(),
            values,
        })
    }
}

impl Display for DensityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DensityMatrix({} features x {} positions)", self.n_rows(), self.n_cols())
    }
}

///
/// Named region matrices of one event map, in layout order.
///
/// All matrices share the same rows (the same features, in input order).
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionMatrices {
    regions: Vec<(String, DensityMatrix)>,
}

impl RegionMatrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, matrix: DensityMatrix) {
        let name = name.into();
        match self.regions.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = matrix,
            None => self.regions.push((name, matrix)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DensityMatrix> {
        self.regions.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DensityMatrix)> {
        self.regions.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn names(&self) -> Vec<&str> {
        self.regions.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of feature rows (shared by every region).
    pub fn n_rows(&self) -> usize {
        self.regions.first().map(|(_, m)| m.n_rows()).unwrap_or(0)
    }

    /// All regions stitched left to right into one matrix.
    pub fn concatenated(&self) -> Result<DensityMatrix> {
        let parts: Vec<&DensityMatrix> = self.regions.iter().map(|(_, m)| m).collect();
        DensityMatrix::concat_columns(&parts)
    }
}

impl IntoIterator for RegionMatrices {
    type Item = (String, DensityMatrix);
    type IntoIter = std::vec::IntoIter<(String, DensityMatrix)>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.into_iter()
    }
}
