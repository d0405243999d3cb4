//! Parser for the JSON result/series body returned by 1.x query
//! endpoints.

use serde::Deserialize;
use serde_json::Value;

use query_tables::Table;

use crate::error::{QueryExecution, Result};

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    series: Vec<Series>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Parses one complete 1.x response body into tables.
///
/// A server-reported `error` on the first result aborts parsing and
/// surfaces as a query error with that exact message. An empty
/// `results` array maps to a single empty table, not to zero tables —
/// callers render "no results" from it. (The 2.x CSV parser returns
/// zero tables for an empty body; the two formats genuinely differ
/// here and both behaviors are load-bearing.)
pub fn parse_results_json(body: &str) -> Result<Vec<Table>> {
    let response: QueryResponse =
        serde_json::from_str(body).map_err(|e| crate::Error::MalformedResponse {
            message: e.to_string(),
        })?;

    let first = match response.results.into_iter().next() {
        Some(first) => first,
        None => return Ok(vec![Table::default()]),
    };

    if let Some(message) = first.error {
        return QueryExecution { message }.fail();
    }

    first
        .series
        .into_iter()
        .map(|series| {
            let rows = series
                .values
                .into_iter()
                .map(|row| row.into_iter().map(cell_to_string).collect())
                .collect();
            Table::try_new(series.columns, rows).map_err(|e| crate::Error::MalformedResponse {
                message: e.to_string(),
            })
        })
        .collect()
}

/// Wire cells are arbitrary JSON scalars; the tabular model is
/// string-valued. Strings pass through unquoted, null renders empty,
/// everything else keeps its JSON display form.
fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
