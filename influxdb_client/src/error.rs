use snafu::Snafu;

/// Errors surfaced by query execution and response parsing.
///
/// Nothing is retried: every failure is raised to the immediate caller,
/// which owns user-facing presentation.
#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    /// The response body does not conform to the wire grammar
    #[snafu(display("malformed response: {}", message))]
    MalformedResponse { message: String },

    /// The server reported a query-level error, or the transport failed;
    /// the message is the most specific one available (server message
    /// over raw transport text)
    #[snafu(display("query failed: {}", message))]
    QueryExecution { message: String },

    /// The streaming transport signaled an error mid-stream; any
    /// in-progress table is discarded and no partial result is returned
    #[snafu(display("stream error: {}", message))]
    Stream { message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
