//! Query dispatch across the two wire protocol generations.
//!
//! A [`Client`] is built once per connection descriptor; the
//! descriptor's [`ApiVersion`] selects how a query travels (URL
//! parameter vs request body) and which parser reduces the response.

use std::collections::VecDeque;

use futures::{stream, Stream};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use hyper::{body::HttpBody, client::HttpConnector, Body, Method, Request, StatusCode};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use snafu::ensure;
use tracing::debug;

use query_tables::Table;

use crate::connection::{ApiVersion, ConnectionConfig};
use crate::csv::{self, CsvRowDecoder};
use crate::error::{QueryExecution, Result};
use crate::json;
use crate::stream::{collect_tables, StreamRow};

/// An InfluxDB query client for one connection descriptor.
#[derive(Debug, Clone)]
pub struct Client {
    config: ConnectionConfig,
    http: hyper::Client<HttpConnector>,
}

impl Client {
    /// Creates a client for the given descriptor.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            http: hyper::Client::new(),
        }
    }

    /// Runs a query and reduces the complete response body to tables.
    ///
    /// `database` names the 1.x target database; 2.x Flux scripts name
    /// their bucket inline and ignore it.
    pub async fn query(&self, database: &str, query: &str) -> Result<Vec<Table>> {
        debug!(version = ?self.config.version, url = %self.config.url, "running query");

        match self.config.version {
            ApiVersion::V1 => {
                let body = self.send(v1_request(&self.config, database, query)?).await?;
                json::parse_results_json(&body)
            }
            ApiVersion::V2 => {
                let body = self.send(v2_request(&self.config, query)?).await?;
                csv::parse_annotated_csv(&body)
            }
        }
    }

    /// Runs a 2.x query, grouping rows into tables as body chunks
    /// arrive instead of buffering the full response.
    ///
    /// Dropping the returned future cancels the query; a cancelled or
    /// failed invocation never yields tables.
    pub async fn query_stream(&self, query: &str) -> Result<Vec<Table>> {
        ensure!(
            self.config.version == ApiVersion::V2,
            QueryExecution {
                message: "streaming queries require a 2.x connection",
            }
        );

        let request = v2_request(&self.config, query)?;
        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| crate::Error::QueryExecution {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response.into_body()).await?;
            return QueryExecution {
                message: server_error_message(status, &body),
            }
            .fail();
        }

        collect_tables(row_stream(response.into_body())).await
    }

    /// Names of the buckets (2.x) or databases (1.x) on the instance.
    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        let tables = match self.config.version {
            ApiVersion::V1 => self.query("", "SHOW DATABASES").await?,
            ApiVersion::V2 => self.query("", "buckets()").await?,
        };
        Ok(column_values(&tables, "name"))
    }

    /// Measurement names within one bucket/database.
    pub async fn list_measurements(&self, bucket: &str) -> Result<Vec<String>> {
        match self.config.version {
            ApiVersion::V1 => {
                let tables = self.query(bucket, "SHOW MEASUREMENTS").await?;
                Ok(column_values(&tables, "name"))
            }
            ApiVersion::V2 => {
                let flux = format!(
                    "import \"influxdata/influxdb/schema\"\nschema.measurements(bucket: \"{}\")",
                    bucket
                );
                let tables = self.query(bucket, &flux).await?;
                Ok(column_values(&tables, "_value"))
            }
        }
    }

    /// Tag keys of one measurement.
    pub async fn list_tag_keys(&self, bucket: &str, measurement: &str) -> Result<Vec<String>> {
        match self.config.version {
            ApiVersion::V1 => {
                let influxql = format!("SHOW TAG KEYS FROM \"{}\"", measurement);
                let tables = self.query(bucket, &influxql).await?;
                Ok(column_values(&tables, "tagKey"))
            }
            ApiVersion::V2 => {
                let flux = format!(
                    "import \"influxdata/influxdb/schema\"\nschema.tagKeys(bucket: \"{}\", predicate: (r) => r._measurement == \"{}\")",
                    bucket, measurement
                );
                let tables = self.query(bucket, &flux).await?;
                Ok(column_values(&tables, "_value"))
            }
        }
    }

    /// Issues the request and returns the body of a successful
    /// response. Transport failures and non-2xx statuses normalize to
    /// one query error carrying the most specific message available.
    async fn send(&self, request: Request<Body>) -> Result<String> {
        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| crate::Error::QueryExecution {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = read_body(response.into_body()).await?;

        ensure!(
            status.is_success(),
            QueryExecution {
                message: server_error_message(status, &body),
            }
        );

        Ok(body)
    }
}

async fn read_body(body: Body) -> Result<String> {
    let bytes = hyper::body::to_bytes(body)
        .await
        .map_err(|e| crate::Error::QueryExecution {
            message: e.to_string(),
        })?;

    String::from_utf8(bytes.to_vec()).map_err(|e| crate::Error::MalformedResponse {
        message: format!("invalid utf-8 in response: {}", e),
    })
}

/// Adapts a chunked response body into the row feed the accumulator
/// consumes. Decoder errors and transport errors both terminate the
/// stream after being yielded.
fn row_stream(body: Body) -> impl Stream<Item = Result<StreamRow>> {
    let state = (body, CsvRowDecoder::new(), VecDeque::new(), false);

    stream::unfold(state, |(mut body, mut decoder, mut queue, mut done)| async move {
        loop {
            if let Some(row) = queue.pop_front() {
                return Some((Ok(row), (body, decoder, queue, done)));
            }
            if done {
                return None;
            }

            match body.data().await {
                Some(Ok(chunk)) => match decoder.decode(&chunk) {
                    Ok(rows) => queue.extend(rows),
                    Err(e) => {
                        done = true;
                        return Some((Err(e), (body, decoder, queue, done)));
                    }
                },
                Some(Err(e)) => {
                    done = true;
                    let error = crate::Error::Stream {
                        message: e.to_string(),
                    };
                    return Some((Err(error), (body, decoder, queue, done)));
                }
                None => {
                    done = true;
                    match decoder.finish() {
                        Ok(rows) => queue.extend(rows),
                        Err(e) => return Some((Err(e), (body, decoder, queue, done))),
                    }
                }
            }
        }
    })
}

fn v1_request(config: &ConnectionConfig, database: &str, query: &str) -> Result<Request<Body>> {
    let uri = format!(
        "{}/query?db={}&q={}",
        config.url.trim_end_matches('/'),
        encode(database),
        encode(query)
    );

    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(ACCEPT, "application/json")
        .body(Body::empty())
        .map_err(|e| crate::Error::QueryExecution {
            message: e.to_string(),
        })
}

fn v2_request(config: &ConnectionConfig, query: &str) -> Result<Request<Body>> {
    let uri = format!(
        "{}/api/v2/query?org={}",
        config.url.trim_end_matches('/'),
        encode(&config.org)
    );

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(ACCEPT, "text/csv")
        .header(CONTENT_TYPE, "application/vnd.flux")
        .header(AUTHORIZATION, format!("Token {}", config.token))
        .body(Body::from(query.to_string()))
        .map_err(|e| crate::Error::QueryExecution {
            message: e.to_string(),
        })
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// Prefers the message the server wrote into an error body over the
/// bare status line.
fn server_error_message(status: StatusCode, body: &str) -> String {
    #[derive(Debug, Default, Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}

fn column_values(tables: &[Table], column: &str) -> Vec<String> {
    let mut values = Vec::new();
    for table in tables {
        if let Some(index) = table.header().iter().position(|c| c == column) {
            values.extend(table.rows().iter().map(|row| row[index].clone()));
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v2_config() -> ConnectionConfig {
        ConnectionConfig::new("local", "http://localhost:8086/", ApiVersion::V2)
            .token("t0k3n")
            .org("my org")
    }

    #[test]
    fn v2_request_posts_the_query_with_auth_and_content_type() {
        let request = v2_request(&v2_config(), "buckets()").unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request.uri(),
            "http://localhost:8086/api/v2/query?org=my%20org"
        );
        assert_eq!(request.headers()[CONTENT_TYPE], "application/vnd.flux");
        assert_eq!(request.headers()[ACCEPT], "text/csv");
        assert_eq!(request.headers()[AUTHORIZATION], "Token t0k3n");
    }

    #[tokio::test]
    async fn v2_request_carries_the_query_as_the_body() {
        let request = v2_request(&v2_config(), "buckets()").unwrap();
        let bytes = hyper::body::to_bytes(request.into_body()).await.unwrap();

        assert_eq!(&bytes[..], b"buckets()");
    }

    #[test]
    fn v1_request_embeds_database_and_query_in_the_url() {
        let config = ConnectionConfig::new("legacy", "http://localhost:8086", ApiVersion::V1);
        let request = v1_request(&config, "telegraf", "SELECT * FROM cpu").unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(
            request.uri(),
            "http://localhost:8086/query?db=telegraf&q=SELECT%20%2A%20FROM%20cpu"
        );
        assert_eq!(request.headers()[ACCEPT], "application/json");
    }

    #[test]
    fn server_message_wins_over_status_and_raw_body() {
        let status = StatusCode::BAD_REQUEST;

        assert_eq!(
            server_error_message(status, r#"{"message":"compilation failed"}"#),
            "compilation failed"
        );
        assert_eq!(
            server_error_message(status, r#"{"error":"database not found"}"#),
            "database not found"
        );
        assert_eq!(server_error_message(status, "plain text detail"), "plain text detail");
        assert_eq!(server_error_message(status, "  "), "400 Bad Request");
    }

    #[tokio::test]
    async fn streaming_requires_a_current_protocol_connection() {
        let config = ConnectionConfig::new("legacy", "http://localhost:8086", ApiVersion::V1);
        let err = Client::new(config).query_stream("buckets()").await.unwrap_err();

        assert!(matches!(err, crate::Error::QueryExecution { .. }));
    }

    #[tokio::test]
    async fn row_stream_groups_body_chunks_into_tables() {
        let (mut sender, body) = Body::channel();
        let feed = tokio::spawn(async move {
            sender
                .send_data(",result,statement,table,_value\n,_r".into())
                .await
                .unwrap();
            sender
                .send_data("esult,0,0,1\n,_result,0,1,2\n".into())
                .await
                .unwrap();
        });

        let tables = collect_tables(row_stream(body)).await.unwrap();
        feed.await.unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows()[0], vec!["", "_result", "0", "0", "1"]);
        assert_eq!(tables[1].rows()[0], vec!["", "_result", "0", "1", "2"]);
    }

    #[test]
    fn column_values_project_across_tables_and_skip_missing_columns() {
        let with = Table::try_new(
            vec!["name".to_string(), "id".to_string()],
            vec![
                vec!["telegraf".to_string(), "1".to_string()],
                vec!["_monitoring".to_string(), "2".to_string()],
            ],
        )
        .unwrap();
        let without = Table::try_new(vec!["other".to_string()], vec![]).unwrap();

        let values = column_values(&[without, with], "name");
        assert_eq!(values, ["telegraf", "_monitoring"]);
    }
}
