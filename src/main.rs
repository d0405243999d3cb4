//! Command line workbench for browsing and querying InfluxDB
//! instances, speaking both protocol generations:
//!
//! ```shell
//! # list buckets on a 2.x instance
//! influx_workbench --url http://localhost:8086 --token TOKEN --org my-org buckets
//!
//! # run a Flux query and render the result tables
//! influx_workbench --token TOKEN --org my-org query 'buckets()'
//!
//! # InfluxQL against a 1.x instance
//! influx_workbench --v1 --database telegraf query 'SELECT * FROM cpu LIMIT 5'
//! ```

use structopt::StructOpt;

use influxdb_client::{ApiVersion, Client, ConnectionConfig};
use query_tables::format::OutputFormat;

mod commands {
    pub mod logging;
    pub mod query;
    pub mod schema;
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "influx_workbench",
    about = "Workbench for browsing and querying InfluxDB instances"
)]
struct Config {
    #[structopt(flatten)]
    logging: commands::logging::Config,

    #[structopt(flatten)]
    connection: ConnectionFlags,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
struct ConnectionFlags {
    /// Base URL of the InfluxDB instance
    #[structopt(long, global = true, default_value = "http://127.0.0.1:8086")]
    url: String,

    /// API token (2.x instances)
    #[structopt(long, global = true, default_value = "", hide_default_value = true)]
    token: String,

    /// Organization name (2.x instances)
    #[structopt(long, global = true, default_value = "")]
    org: String,

    /// Target database (1.x instances)
    #[structopt(long, global = true, default_value = "")]
    database: String,

    /// Talk to a 1.x instance (InfluxQL over the legacy query endpoint)
    #[structopt(long, global = true)]
    v1: bool,
}

impl ConnectionFlags {
    fn to_config(&self) -> ConnectionConfig {
        let version = if self.v1 {
            ApiVersion::V1
        } else {
            ApiVersion::V2
        };

        ConnectionConfig::new("cli", self.url.as_str(), version)
            .token(self.token.as_str())
            .org(self.org.as_str())
    }
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Run a query and print its result tables
    Query {
        /// Output format for result tables
        #[structopt(short, long, default_value = "pretty")]
        format: OutputFormat,

        /// Group rows into tables as the response streams in (2.x only)
        #[structopt(long)]
        stream: bool,

        /// Flux (2.x) or InfluxQL (1.x) source text
        query: String,
    },

    /// List buckets (2.x) or databases (1.x)
    Buckets,

    /// List measurements within a bucket
    Measurements { bucket: String },

    /// List tag keys of a measurement
    TagKeys { bucket: String, measurement: String },
}

#[tokio::main]
async fn main() {
    let config = Config::from_args();
    let _guard = commands::logging::init(&config.logging);

    let client = Client::new(config.connection.to_config());

    let result: Result<(), Box<dyn std::error::Error>> = match config.command {
        Command::Query {
            format,
            stream,
            query,
        } => commands::query::command(&client, &config.connection.database, format, &query, stream)
            .await
            .map_err(Into::into),
        Command::Buckets => commands::schema::buckets(&client).await.map_err(Into::into),
        Command::Measurements { bucket } => commands::schema::measurements(&client, &bucket)
            .await
            .map_err(Into::into),
        Command::TagKeys {
            bucket,
            measurement,
        } => commands::schema::tag_keys(&client, &bucket, &measurement)
            .await
            .map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
