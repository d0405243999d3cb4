//! Log initialization and setup

use clap::arg_enum;
use structopt::StructOpt;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Logging configuration, shared by every command
#[derive(Debug, StructOpt)]
pub struct Config {
    /// Increases logging verbosity (-v = info, -vv = debug, -vvv = trace)
    #[structopt(
        short = "v",
        long = "verbose",
        global = true,
        parse(from_occurrences)
    )]
    pub log_verbose_count: u8,

    /// Logging filter directive; overridden by --verbose
    #[structopt(long = "log-filter", global = true, default_value = "warn")]
    pub log_filter: String,

    /// Logging output format
    #[structopt(
        long = "log-format",
        global = true,
        default_value = "full",
        possible_values = &LogFormat::variants(),
        case_insensitive = true
    )]
    pub log_format: LogFormat,
}

/// Start the log emitter. Panics on error.
pub fn init(config: &Config) -> TracingGuard {
    let (log_format_full, log_format_pretty, log_format_json) = match config.log_format {
        LogFormat::Full => (Some(fmt::layer()), None, None),
        LogFormat::Pretty => (None, Some(fmt::layer().pretty()), None),
        LogFormat::Json => (None, None, Some(fmt::layer().json())),
    };

    let log_layer_filter = match config.log_verbose_count {
        0 => EnvFilter::try_new(&config.log_filter).unwrap(),
        1 => EnvFilter::try_new("info").unwrap(),
        2 => EnvFilter::try_new("debug,hyper::proto::h1=info,h2=info").unwrap(),
        _ => EnvFilter::try_new("trace,hyper::proto::h1=info,h2=info").unwrap(),
    };

    let subscriber = tracing_subscriber::Registry::default()
        .with(log_format_json)
        .with(log_format_pretty)
        .with(log_format_full)
        .with(log_layer_filter);

    TracingGuard(tracing::subscriber::set_default(subscriber))
}

/// An RAII guard. On Drop, the log subscriber is unregistered.
pub struct TracingGuard(tracing::subscriber::DefaultGuard);

arg_enum! {
    #[derive(Debug, Clone, Copy)]
    pub enum LogFormat {
        Full,
        Pretty,
        Json,
    }
}
