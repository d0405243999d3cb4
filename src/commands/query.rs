//! Implementation of the `query` command

use std::time::Instant;

use snafu::{ResultExt, Snafu};
use tracing::debug;

use influxdb_client::Client;
use query_tables::format::OutputFormat;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Error running query: {}", source))]
    Query { source: influxdb_client::Error },

    #[snafu(display("Error formatting results: {}", source))]
    Format {
        source: query_tables::format::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub async fn command(
    client: &Client,
    database: &str,
    format: OutputFormat,
    query: &str,
    stream: bool,
) -> Result<()> {
    let now = Instant::now();
    debug!(stream = stream, "dispatching query");

    let tables = if stream {
        client.query_stream(query).await.context(Query)?
    } else {
        client.query(database, query).await.context(Query)?
    };

    let row_count: usize = tables.iter().map(|t| t.num_rows()).sum();

    if tables.is_empty() {
        println!(
            "0 rows in set. Query took {} seconds.",
            now.elapsed().as_secs()
        );
    } else {
        println!("{}", format.format(&tables).context(Format)?);
        println!(
            "{} rows in set. Query took {} seconds.",
            row_count,
            now.elapsed().as_secs()
        );
    }

    Ok(())
}
