//! The tabular model produced by query execution: an ordered sequence
//! of tables, each an ordered header plus equal-width string rows.
//!
//! Results are built once per query invocation and handed to a
//! rendering caller; nothing here is mutated after construction.

#![deny(rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self
)]

use snafu::{ensure, Snafu};

pub mod format;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display(
        "row has {} cells but the table header has {} columns",
        row_width,
        header_width
    ))]
    WidthMismatch {
        row_width: usize,
        header_width: usize,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One grouped result set.
///
/// Every row holds exactly as many cells as the header has columns;
/// `push_row` rejects anything else. A table with an empty header and
/// no rows is a valid empty result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with the given column names.
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Creates a table from a header and rows, validating that every
    /// row matches the header width.
    pub fn try_new(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut table = Self::new(header);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Appends a row, rejecting it if its width does not match the header.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        ensure!(
            row.len() == self.header.len(),
            WidthMismatch {
                row_width: row.len(),
                header_width: self.header.len(),
            }
        );
        self.rows.push(row);
        Ok(())
    }

    /// Ordered column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Ordered rows; each row is ordered cell values.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// True for the empty result set (no columns, no rows).
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty()
    }
}

/// The ordered sequence of tables produced by one query execution, in
/// the order each table was first encountered in the response.
pub type QueryResult = Vec<Table>;

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn push_row_accepts_matching_width() {
        let mut table = Table::new(strings(&["host", "value"]));
        table.push_row(strings(&["serverA", "1"])).unwrap();
        table.push_row(strings(&["serverB", "2"])).unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.rows()[1], strings(&["serverB", "2"]));
    }

    #[test]
    fn push_row_rejects_width_mismatch() {
        let mut table = Table::new(strings(&["host", "value"]));
        let err = table.push_row(strings(&["serverA"])).unwrap_err();

        assert_eq!(
            err.to_string(),
            "row has 1 cells but the table header has 2 columns"
        );
        assert_eq!(table.num_rows(), 0);
    }

    #[test]
    fn try_new_validates_every_row() {
        let rows = vec![strings(&["a", "1"]), strings(&["b", "2", "extra"])];
        assert!(Table::try_new(strings(&["host", "value"]), rows).is_err());
    }

    #[test]
    fn default_table_is_the_empty_result_set() {
        let table = Table::default();
        assert!(table.is_empty());
        assert_eq!(table.header().len(), 0);
        assert_eq!(table.num_rows(), 0);
    }
}
