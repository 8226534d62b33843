//! Named-column feature table
//!
//! Rows are indexed by timestamp; columns are addressed by name so a caller
//! may hand the model its columns in any order.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::builder::{build, FeatureRow, FEATURE_COLUMNS};
use crate::data::Candle;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("column {column} has {actual} values, table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("missing columns: {0:?}")]
    MissingColumns(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    index: Vec<DateTime<Utc>>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Empty table over `index`
    pub fn new(index: Vec<DateTime<Utc>>) -> Self {
        Self {
            index,
            names: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Table with `FEATURE_COLUMNS`; undefined indicator values become NaN.
    pub fn from_rows(rows: &[FeatureRow]) -> Self {
        let mut table = Self::new(rows.iter().map(|r| r.timestamp).collect());
        for name in FEATURE_COLUMNS {
            table.names.push(name.to_string());
            table
                .columns
                .push(rows.iter().map(|r| r.get(name).unwrap_or(f64::NAN)).collect());
        }
        table
    }

    /// Shorthand for `from_rows(&build(candles))`
    pub fn from_candles(candles: &[Candle]) -> Self {
        Self::from_rows(&build(candles))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|i| self.columns[i].as_slice())
    }

    /// Adds a column, replacing one of the same name.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), TableError> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(TableError::LengthMismatch {
                column: name,
                expected: self.len(),
                actual: values.len(),
            });
        }
        match self.position(&name) {
            Some(i) => self.columns[i] = values,
            None => {
                self.names.push(name);
                self.columns.push(values);
            }
        }
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Vec<f64>> {
        let i = self.position(name)?;
        self.names.remove(i);
        Some(self.columns.remove(i))
    }

    /// Row-major matrix of `names`, in that order.
    pub fn rows_for(&self, names: &[String]) -> Result<Vec<Vec<f64>>, TableError> {
        let mut missing = Vec::new();
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            match self.column(name) {
                Some(values) => selected.push(values),
                None => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(TableError::MissingColumns(missing));
        }

        Ok((0..self.len())
            .map(|row| selected.iter().map(|col| col[row]).collect())
            .collect())
    }

    /// First `n` rows (all rows when `n >= len`).
    pub fn head(&self, n: usize) -> FeatureTable {
        let end = n.min(self.len());
        FeatureTable {
            index: self.index[..end].to_vec(),
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c[..end].to_vec()).collect(),
        }
    }

    /// Last `n` rows (all rows when `n >= len`).
    pub fn tail(&self, n: usize) -> FeatureTable {
        let start = self.len().saturating_sub(n);
        FeatureTable {
            index: self.index[start..].to_vec(),
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c[start..].to_vec()).collect(),
        }
    }

    /// Appends the rows of `other`, matching columns by name.
    pub fn append(&mut self, other: &FeatureTable) -> Result<(), TableError> {
        if self.names.is_empty() && self.is_empty() {
            *self = other.clone();
            return Ok(());
        }
        let missing: Vec<String> = self
            .names
            .iter()
            .filter(|name| other.column(name).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(TableError::MissingColumns(missing));
        }

        for (name, column) in self.names.iter().zip(self.columns.iter_mut()) {
            if let Some(values) = other.column(name) {
                column.extend_from_slice(values);
            }
        }
        self.index.extend_from_slice(&other.index);
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}
