//! Type aliases and common data types.

use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

use crate::error::EstimationError;

/// 2x2 matrix for the kernel bandwidth and sample covariance.
pub type Matrix2 = SMatrix<f64, 2, 2>;

/// 2-dimensional vector for bivariate points and offsets.
pub type Vector2 = SVector<f64, 2>;

/// A point in physical units, `(x, y)` in the two variables' own scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// First variable's value.
    pub x: f64,
    /// Second variable's value.
    pub y: f64,
}

impl Point {
    /// Creates a point from its two coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Which conditioning regime contributed a merged isoline point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegimeSource {
    /// Only the regime conditioned on the first variable.
    First,
    /// Only the regime conditioned on the second variable.
    Second,
    /// Both regimes agree at this point (or the point is synthetic closure).
    Both,
}

/// A column-oriented numeric table with named variables.
///
/// The optional `index` column (dates or labels) is carried through for
/// downstream consumers but ignored by all modeling operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    /// Optional leading index column, one entry per row.
    pub index: Option<Vec<String>>,
    /// Variable names, one per column.
    pub names: Vec<String>,
    /// Column-major data; all columns have the same length.
    pub columns: Vec<Vec<f64>>,
}

impl DataTable {
    /// Builds a table from names and equally sized columns.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::LengthMismatch`] when the number of names
    /// differs from the number of columns, or when column lengths differ.
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self, EstimationError> {
        if names.len() != columns.len() {
            return Err(EstimationError::LengthMismatch {
                expected: names.len(),
                got: columns.len(),
                field: "columns".to_string(),
            });
        }
        if let Some(first) = columns.first() {
            for (name, col) in names.iter().zip(&columns) {
                if col.len() != first.len() {
                    return Err(EstimationError::LengthMismatch {
                        expected: first.len(),
                        got: col.len(),
                        field: name.clone(),
                    });
                }
            }
        }
        Ok(Self {
            index: None,
            names,
            columns,
        })
    }

    /// Attaches an index column (must match the row count).
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::LengthMismatch`] when the index length
    /// differs from the row count.
    pub fn with_index(mut self, index: Vec<String>) -> Result<Self, EstimationError> {
        if index.len() != self.n_rows() {
            return Err(EstimationError::LengthMismatch {
                expected: self.n_rows(),
                got: index.len(),
                field: "index".to_string(),
            });
        }
        self.index = Some(index);
        Ok(self)
    }

    /// Number of rows (0 for an empty table).
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Number of variable columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Looks up a column by variable name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rejects_ragged_columns() {
        let result = DataTable::new(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 2.0], vec![1.0]],
        );
        assert!(matches!(
            result,
            Err(EstimationError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn table_lookup_by_name() {
        let table = DataTable::new(
            vec!["rain".into(), "surge".into()],
            vec![vec![1.0, 2.0], vec![0.3, 0.5]],
        )
        .unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column("surge"), Some(&[0.3, 0.5][..]));
        assert_eq!(table.column("wind"), None);
    }

    #[test]
    fn index_length_checked() {
        let table = DataTable::new(vec!["a".into()], vec![vec![1.0, 2.0]]).unwrap();
        assert!(table.clone().with_index(vec!["x".into()]).is_err());
        assert!(table.with_index(vec!["x".into(), "y".into()]).is_ok());
    }
}
