//! Incremental grouping of streamed query rows into tables.
//!
//! The streaming transport delivers rows one at a time with no explicit
//! table boundary event; grouping is inferred purely from contiguous
//! runs of identical values in the designated table-id column. The last
//! table can only be closed when the stream ends, never by a row event,
//! so completion must flush it explicitly.

use std::sync::Arc;

use futures::{pin_mut, Stream, StreamExt};
use tracing::debug;

use query_tables::Table;

use crate::error::{MalformedResponse, Result};

/// Name of the column that carries the table id in streamed rows.
pub const TABLE_ID_COLUMN: &str = "table";

/// The ordered column list a streamed row was delivered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSchema {
    columns: Vec<String>,
}

impl RowSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// One streamed row: its cell values plus a handle to the schema it
/// arrived under. Rows of one table share the same schema handle.
#[derive(Debug, Clone)]
pub struct StreamRow {
    pub schema: Arc<RowSchema>,
    pub values: Vec<String>,
}

/// Groups streamed rows into tables by contiguous table-id runs.
///
/// All state is per-invocation and owned here: the completed tables,
/// the in-progress table and the id it accumulates under. `None` for
/// the id means no table has been started yet, which no real id can
/// collide with.
#[derive(Debug, Default)]
pub struct TableAccumulator {
    tables: Vec<Table>,
    current: Option<(i64, Table)>,
}

impl TableAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one row.
    ///
    /// A row whose table id matches the in-progress table extends it; a
    /// differing id closes the in-progress table into the result
    /// sequence and starts a new one whose header is copied from the
    /// row's schema. Later schema changes by the transport cannot
    /// retroactively alter headers already captured.
    pub fn push(&mut self, row: StreamRow) -> Result<()> {
        let id = table_id(&row)?;

        match &mut self.current {
            Some((current_id, table)) if *current_id == id => table
                .push_row(row.values)
                .map_err(|e| crate::Error::MalformedResponse {
                    message: e.to_string(),
                })?,
            _ => {
                if let Some((closed_id, closed)) = self.current.take() {
                    debug!(table_id = closed_id, rows = closed.num_rows(), "table closed");
                    self.tables.push(closed);
                }
                let mut table = Table::new(row.schema.columns().to_vec());
                table
                    .push_row(row.values)
                    .map_err(|e| crate::Error::MalformedResponse {
                        message: e.to_string(),
                    })?;
                self.current = Some((id, table));
            }
        }

        Ok(())
    }

    /// Closes the in-progress table, if any, and returns the
    /// accumulated sequence in arrival order.
    pub fn finish(mut self) -> Vec<Table> {
        if let Some((_, table)) = self.current.take() {
            self.tables.push(table);
        }
        self.tables
    }
}

fn table_id(row: &StreamRow) -> Result<i64> {
    let index = match row.schema.column_index(TABLE_ID_COLUMN) {
        Some(index) => index,
        None => {
            return MalformedResponse {
                message: format!("streamed row schema has no '{}' column", TABLE_ID_COLUMN),
            }
            .fail()
        }
    };

    let cell = match row.values.get(index) {
        Some(cell) => cell,
        None => {
            return MalformedResponse {
                message: "streamed row is too short to hold its table id",
            }
            .fail()
        }
    };

    cell.parse().map_err(|_| crate::Error::MalformedResponse {
        message: format!("table id '{}' is not an integer", cell),
    })
}

/// Drives a [`TableAccumulator`] over a row stream to completion.
///
/// Stream items map onto the transport's callback triple: `Some(Ok(row))`
/// delivers a row, `Some(Err(e))` aborts the query (any in-progress
/// table is discarded, no partial result is returned) and the end of
/// the stream flushes the final in-progress table. Dropping the
/// returned future cancels the query; no tables are observable from a
/// cancelled invocation.
pub async fn collect_tables<S>(rows: S) -> Result<Vec<Table>>
where
    S: Stream<Item = Result<StreamRow>>,
{
    pin_mut!(rows);

    let mut accumulator = TableAccumulator::new();
    while let Some(event) = rows.next().await {
        accumulator.push(event?)?;
    }
    Ok(accumulator.finish())
}
