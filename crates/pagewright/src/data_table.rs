//! Step data tables.
//!
//! The first row is the header row. Steps that take a table state the exact
//! header set they expect and reject anything else before acting.

use std::collections::{BTreeSet, HashMap};

use crate::result::{PagewrightError, PagewrightResult};

/// Header row plus data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Build from raw rows; the first row is the header row
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut rows = rows.into_iter();
        let headers = rows
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        Self {
            headers,
            rows: rows.collect(),
        }
    }

    /// Build from string slices, for tests and literals
    #[must_use]
    pub fn from_slices(rows: &[&[&str]]) -> Self {
        Self::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|c| (*c).to_string()).collect())
                .collect(),
        )
    }

    /// Header row
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no data rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fail unless the header set is exactly `expected`, in any order
    pub fn require_headers(&self, expected: &[&str]) -> PagewrightResult<()> {
        let wanted: BTreeSet<&str> = expected.iter().copied().collect();
        let found: BTreeSet<&str> = self.headers.iter().map(String::as_str).collect();
        if wanted == found && self.headers.len() == expected.len() {
            return Ok(());
        }
        Err(PagewrightError::DataTableShape {
            expected: expected.iter().map(|h| (*h).to_string()).collect(),
            found: self.headers.clone(),
        })
    }

    /// Data rows keyed by header. Missing cells read as empty.
    #[must_use]
    pub fn rows_as_maps(&self) -> Vec<HashMap<String, String>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| (h.clone(), row.get(i).cloned().unwrap_or_default()))
                    .collect()
            })
            .collect()
    }

    /// All cells under `header`
    #[must_use]
    pub fn column(&self, header: &str) -> Option<Vec<String>> {
        let index = self.headers.iter().position(|h| h == header)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).cloned().unwrap_or_default())
                .collect(),
        )
    }

    /// Each data row's cells joined with ", "
    #[must_use]
    pub fn flatten_rows(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.join(", ")).collect()
    }

    /// Copy with every data cell passed through `f`. Headers are left alone.
    pub fn transform_cells<F>(&self, mut f: F) -> PagewrightResult<Self>
    where
        F: FnMut(&str) -> PagewrightResult<String>,
    {
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| f(cell)).collect())
            .collect::<PagewrightResult<Vec<Vec<String>>>>()?;
        Ok(Self {
            headers: self.headers.clone(),
            rows,
        })
    }
}
