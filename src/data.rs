use std::fmt;

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// A single observed value: tokenized input is either numeric or text.
/// Absent/null entries are represented as `None` at the cell level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    (*n as i64).to_string()
                } else {
                    n.to_string()
                }
            }
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

pub type Cell = Option<Value>;

/// An ordered collection of rows sharing one header. Rows are stored
/// positionally, aligned to the header, so attribute lookups are index-based.
/// Insertion order is preserved end to end; it carries no meaning beyond
/// stable rendering for clients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Builds a dataset, validating that every row matches the header width.
    /// Ragged rows are a caller error; the cleaning pipeline assumes aligned
    /// rows and never re-checks.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        for (idx, row) in rows.iter().enumerate() {
            ensure!(
                row.len() == headers.len(),
                "Row {} has {} field(s) but the header defines {}",
                idx + 1,
                row.len(),
                headers.len()
            );
        }
        Ok(Self { headers, rows })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(Option::as_ref)
    }

    pub(crate) fn clear_cell(&mut self, row: usize, column: usize) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = None;
        }
    }

    /// Non-null values of one column, in row order.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &Value> {
        self.rows
            .iter()
            .filter_map(move |row| row.get(column).and_then(Option::as_ref))
    }

    /// Returns a dataset with the given column indices removed, preserving
    /// the relative order of the remaining columns.
    pub fn without_columns(self, discard: &[usize]) -> Dataset {
        if discard.is_empty() {
            return self;
        }
        let keep = |idx: &usize| !discard.contains(idx);
        let headers = self
            .headers
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| keep(idx))
            .map(|(_, h)| h)
            .collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .filter(|(idx, _)| keep(idx))
                    .map(|(_, cell)| cell)
                    .collect()
            })
            .collect();
        Dataset { headers, rows }
    }
}
