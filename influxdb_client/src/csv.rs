//! Parsers for the annotated CSV bodies returned by 2.x query
//! endpoints: a batch parser over one complete body, and an incremental
//! decoder that turns body chunks into schema-tagged rows for the
//! streaming path.

use std::sync::Arc;

use snafu::ensure;

use query_tables::Table;

use crate::error::{MalformedResponse, Result};
use crate::stream::{RowSchema, StreamRow};

/// Lines with this prefix carry annotation metadata, not data.
pub const ANNOTATION_PREFIX: char = '#';

/// Leading fields of every record that belong to the transport, not the
/// result. They are stripped before a header or row becomes visible to
/// callers.
pub const BOOKKEEPING_FIELDS: usize = 3;

/// Parses one complete annotated CSV body into tables.
///
/// The body is a sequence of blank-line-separated groups, one table
/// per group. Within a group, annotation lines are discarded, the
/// first remaining record is the header and the rest are rows; the
/// leading bookkeeping fields of every record are stripped.
///
/// Groups left empty by the split (a terminal delimiter, stray blank
/// lines) are dropped. A group that carries annotations but no header
/// record is malformed: without the header, column alignment for the
/// group is lost.
pub fn parse_annotated_csv(body: &str) -> Result<Vec<Table>> {
    let body = body.replace('\r', "");

    let mut tables = Vec::new();
    for group in body.split("\n\n") {
        let lines: Vec<&str> = group
            .lines()
            .filter(|line| !line.is_empty() && !line.starts_with(ANNOTATION_PREFIX))
            .collect();

        let (head, data) = match lines.split_first() {
            Some(parts) => parts,
            None => {
                ensure!(
                    !group.lines().any(|line| line.starts_with(ANNOTATION_PREFIX)),
                    MalformedResponse {
                        message: "annotated group has no header record",
                    }
                );
                continue;
            }
        };

        let mut table = Table::new(visible_fields(head));
        for record in data {
            table
                .push_row(visible_fields(record))
                .map_err(|e| crate::Error::MalformedResponse {
                    message: e.to_string(),
                })?;
        }
        tables.push(table);
    }

    Ok(tables)
}

fn visible_fields(record: &str) -> Vec<String> {
    record
        .split(',')
        .skip(BOOKKEEPING_FIELDS)
        .map(str::to_string)
        .collect()
}

/// Incremental decoder from annotated CSV body chunks to
/// [`StreamRow`]s.
///
/// Chunk boundaries carry no meaning: partial trailing lines are held
/// until the terminating newline arrives (call [`finish`](Self::finish)
/// to flush an unterminated final line). A blank line ends the current
/// section; the first non-annotation line of the next section is taken
/// as its header. Rows keep every field of the record — the batch
/// parser's bookkeeping strip does not apply here, since the streaming
/// consumer locates columns by name through the schema.
#[derive(Debug, Default)]
pub struct CsvRowDecoder {
    schema: Option<Arc<RowSchema>>,
    pending: Vec<u8>,
}

impl CsvRowDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes a body chunk, returning the rows it completed.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Vec<StreamRow>> {
        self.pending.extend_from_slice(chunk);

        let mut rows = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = strip_line_ending(&line);
            let text = decode_utf8(line)?;
            self.consume_line(text, &mut rows);
        }
        Ok(rows)
    }

    /// Flushes a trailing line that arrived without a newline.
    pub fn finish(&mut self) -> Result<Vec<StreamRow>> {
        let pending = std::mem::take(&mut self.pending);
        let line = strip_line_ending(&pending);

        let mut rows = Vec::new();
        if !line.is_empty() {
            let text = decode_utf8(line)?;
            self.consume_line(text, &mut rows);
        }
        Ok(rows)
    }

    fn consume_line(&mut self, line: &str, rows: &mut Vec<StreamRow>) {
        if line.is_empty() {
            // section boundary: the next non-annotation line is a header
            self.schema = None;
            return;
        }
        if line.starts_with(ANNOTATION_PREFIX) {
            return;
        }

        let fields: Vec<String> = line.split(',').map(str::to_string).collect();
        match &self.schema {
            None => self.schema = Some(Arc::new(RowSchema::new(fields))),
            Some(schema) => rows.push(StreamRow {
                schema: Arc::clone(schema),
                values: fields,
            }),
        }
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = match line.split_last() {
        Some((&b'\n', rest)) => rest,
        _ => line,
    };
    match line.split_last() {
        Some((&b'\r', rest)) => rest,
        _ => line,
    }
}

fn decode_utf8(line: &[u8]) -> Result<&str> {
    std::str::from_utf8(line).map_err(|e| crate::Error::MalformedResponse {
        message: format!("invalid utf-8 in response: {}", e),
    })
}
