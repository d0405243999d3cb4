//! Output formatting utilities for query results

use serde::Deserialize;
use serde_json::json;
use snafu::{ResultExt, Snafu};

use crate::Table;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Json formatting error: {}", source))]
    JsonFormat { source: serde_json::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Deserialize, Debug, Copy, Clone, PartialEq)]
/// Requested output format for query results
pub enum OutputFormat {
    /// Aligned, box-drawn tables (default)
    #[serde(rename = "pretty")]
    Pretty,
    /// Comma separated values
    #[serde(rename = "csv")]
    CSV,
    /// JSON array of header/rows objects
    #[serde(rename = "json")]
    JSON,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Pretty
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "csv" => Ok(Self::CSV),
            "json" => Ok(Self::JSON),
            _ => Err(format!(
                "Invalid output format '{}'. Valid options: pretty, csv, json",
                s
            )),
        }
    }
}

impl OutputFormat {
    /// Return the content type of the relevant format
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pretty => "text/plain",
            Self::CSV => "text/csv",
            Self::JSON => "application/json",
        }
    }

    /// Format the tables into a String in one of the following formats:
    ///
    /// Pretty:
    /// ```text
    /// +--------------+-----------------+------------+
    /// | location     | surface_degrees | time       |
    /// +--------------+-----------------+------------+
    /// | santa_monica | 65.2            | 1568756160 |
    /// +--------------+-----------------+------------+
    /// ```
    ///
    /// CSV:
    /// ```text
    /// location,surface_degrees,time
    /// santa_monica,65.2,1568756160
    /// ```
    ///
    /// JSON:
    /// ```text
    /// [{"header":["location","surface_degrees","time"],
    ///   "rows":[["santa_monica","65.2","1568756160"]]}]
    /// ```
    pub fn format(&self, tables: &[Table]) -> Result<String> {
        match self {
            Self::Pretty => Ok(tables_to_pretty(tables)),
            Self::CSV => Ok(tables_to_csv(tables)),
            Self::JSON => tables_to_json(tables),
        }
    }
}

fn tables_to_pretty(tables: &[Table]) -> String {
    let mut out = String::new();
    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        pretty_table(table, &mut out);
    }
    out
}

fn pretty_table(table: &Table, out: &mut String) {
    let mut widths: Vec<usize> = table.header().iter().map(|c| c.len()).collect();
    for row in table.rows() {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let rule = |out: &mut String| {
        out.push('+');
        for width in &widths {
            out.push_str(&"-".repeat(width + 2));
            out.push('+');
        }
        out.push('\n');
    };
    let line = |cells: &[String], out: &mut String| {
        out.push('|');
        for (width, cell) in widths.iter().zip(cells) {
            out.push(' ');
            out.push_str(cell);
            out.push_str(&" ".repeat(width - cell.len() + 1));
            out.push('|');
        }
        out.push('\n');
    };

    rule(out);
    line(table.header(), out);
    rule(out);
    for row in table.rows() {
        line(row, out);
    }
    rule(out);
}

fn tables_to_csv(tables: &[Table]) -> String {
    let mut out = String::new();
    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        csv_record(table.header(), &mut out);
        for row in table.rows() {
            csv_record(row, &mut out);
        }
    }
    out
}

fn csv_record(cells: &[String], out: &mut String) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if cell.contains(|c| c == ',' || c == '"' || c == '\n' || c == '\r') {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

fn tables_to_json(tables: &[Table]) -> Result<String> {
    let values: Vec<_> = tables
        .iter()
        .map(|table| {
            json!({
                "header": table.header(),
                "rows": table.rows(),
            })
        })
        .collect();
    serde_json::to_string(&values).context(JsonFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_table() -> Table {
        Table::try_new(
            vec!["location".to_string(), "surface_degrees".to_string()],
            vec![
                vec!["santa_monica".to_string(), "65.2".to_string()],
                vec!["boston".to_string(), "50.4".to_string()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn pretty_output_is_aligned() {
        let expected = "\
+--------------+-----------------+
| location     | surface_degrees |
+--------------+-----------------+
| santa_monica | 65.2            |
| boston       | 50.4            |
+--------------+-----------------+
";
        let actual = OutputFormat::Pretty.format(&[example_table()]).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn pretty_separates_tables_with_a_blank_line() {
        let out = OutputFormat::Pretty
            .format(&[example_table(), example_table()])
            .unwrap();
        assert!(out.contains("+\n\n+"));
    }

    #[test]
    fn csv_quotes_fields_that_need_it() {
        let table = Table::try_new(
            vec!["name".to_string(), "note".to_string()],
            vec![vec!["a,b".to_string(), "say \"hi\"\nbye".to_string()]],
        )
        .unwrap();

        let out = OutputFormat::CSV.format(&[table]).unwrap();
        assert_eq!(out, "name,note\n\"a,b\",\"say \"\"hi\"\"\nbye\"\n");
    }

    #[test]
    fn json_round_trips_through_serde() {
        let out = OutputFormat::JSON.format(&[example_table()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value[0]["header"][1], "surface_degrees");
        assert_eq!(value[0]["rows"][1][0], "boston");
    }

    #[test]
    fn content_types_match_formats() {
        assert_eq!(OutputFormat::Pretty.content_type(), "text/plain");
        assert_eq!(OutputFormat::CSV.content_type(), "text/csv");
        assert_eq!(OutputFormat::JSON.content_type(), "application/json");
    }

    #[test]
    fn format_parses_from_str() {
        assert_eq!("pretty".parse::<OutputFormat>().unwrap(), OutputFormat::Pretty);
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::CSV);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
