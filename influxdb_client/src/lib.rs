//! Client for querying InfluxDB instances over HTTP, covering both
//! wire protocol generations the product speaks:
//!
//! * 2.x: Flux queries posted to `/api/v2/query`, answered with
//!   annotated CSV ([`csv`]), either as one body ([`csv::parse_annotated_csv`])
//!   or incrementally row by row ([`stream`]).
//! * 1.x: InfluxQL queries issued against `/query`, answered with the
//!   JSON result/series document ([`json`]).
//!
//! Both paths reduce a response to the same render-ready
//! [`query_tables::Table`] sequence. [`client::Client`] selects the
//! transport and parser from the [`connection::ApiVersion`] carried by
//! a connection descriptor.

#![deny(rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self
)]

pub mod client;
pub mod connection;
pub mod csv;
mod error;
pub mod json;
pub mod stream;

pub use client::Client;
pub use connection::{ApiVersion, ConnectionConfig};
pub use error::{Error, Result};
