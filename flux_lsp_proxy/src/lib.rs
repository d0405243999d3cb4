//! Thin proxy that forwards editor document events to the Flux
//! language analysis server.
//!
//! The proxy only builds JSON-RPC 2.0 notification payloads and tracks
//! per-document versions; delivering the payload (process management,
//! message framing) belongs to the [`Transport`] implementation behind
//! it.

#![deny(rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self
)]

use std::collections::HashMap;

use serde_json::{json, Value};
use snafu::Snafu;
use tracing::debug;

#[derive(Debug, Snafu)]
pub enum Error {
    /// The transport could not deliver a payload
    #[snafu(display("transport error: {}", message))]
    TransportFailed { message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Delivers one serialized notification to the language server.
/// Framing is the implementor's concern.
pub trait Transport {
    fn send(&mut self, payload: &str) -> Result<()>;
}

/// Tracks open documents and proxies their lifecycle events.
///
/// Versions are per document URI, starting at 1 on open and increasing
/// by one per change, as the language server protocol requires.
#[derive(Debug)]
pub struct DocumentProxy<T> {
    transport: T,
    versions: HashMap<String, i64>,
}

impl<T: Transport> DocumentProxy<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            versions: HashMap::new(),
        }
    }

    pub fn did_open(&mut self, uri: &str, text: &str) -> Result<()> {
        self.versions.insert(uri.to_string(), 1);
        self.notify(
            "textDocument/didOpen",
            json!({
                "textDocument": {
                    "uri": uri,
                    "languageId": "flux",
                    "version": 1,
                    "text": text,
                }
            }),
        )
    }

    pub fn did_change(&mut self, uri: &str, text: &str) -> Result<()> {
        let version = self
            .versions
            .entry(uri.to_string())
            .and_modify(|v| *v += 1)
            .or_insert(1);
        let version = *version;

        self.notify(
            "textDocument/didChange",
            json!({
                "textDocument": { "uri": uri, "version": version },
                "contentChanges": [{ "text": text }],
            }),
        )
    }

    pub fn did_save(&mut self, uri: &str) -> Result<()> {
        self.notify(
            "textDocument/didSave",
            json!({ "textDocument": { "uri": uri } }),
        )
    }

    pub fn did_close(&mut self, uri: &str) -> Result<()> {
        self.versions.remove(uri);
        self.notify(
            "textDocument/didClose",
            json!({ "textDocument": { "uri": uri } }),
        )
    }

    fn notify(&mut self, method: &str, params: Value) -> Result<()> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });

        debug!(method = method, "forwarding document event");
        self.transport.send(&payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Captures payloads instead of delivering them.
    #[derive(Debug, Default)]
    struct Recorder {
        sent: Vec<Value>,
    }

    impl Transport for &mut Recorder {
        fn send(&mut self, payload: &str) -> Result<()> {
            self.sent.push(serde_json::from_str(payload).unwrap());
            Ok(())
        }
    }

    #[test]
    fn open_then_change_produce_increasing_versions() {
        let mut recorder = Recorder::default();
        let mut proxy = DocumentProxy::new(&mut recorder);

        proxy.did_open("file:///q.flux", "buckets()").unwrap();
        proxy.did_change("file:///q.flux", "buckets() |> limit(n: 1)").unwrap();
        proxy.did_change("file:///q.flux", "buckets() |> limit(n: 2)").unwrap();
        drop(proxy);

        let sent = &recorder.sent;
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0]["method"], "textDocument/didOpen");
        assert_eq!(sent[0]["params"]["textDocument"]["languageId"], "flux");
        assert_eq!(sent[0]["params"]["textDocument"]["version"], 1);
        assert_eq!(sent[1]["params"]["textDocument"]["version"], 2);
        assert_eq!(sent[2]["params"]["textDocument"]["version"], 3);
        assert_eq!(
            sent[2]["params"]["contentChanges"][0]["text"],
            "buckets() |> limit(n: 2)"
        );
    }

    #[test]
    fn every_payload_is_a_jsonrpc_notification() {
        let mut recorder = Recorder::default();
        let mut proxy = DocumentProxy::new(&mut recorder);

        proxy.did_open("file:///q.flux", "x = 1").unwrap();
        proxy.did_save("file:///q.flux").unwrap();
        proxy.did_close("file:///q.flux").unwrap();
        drop(proxy);

        for payload in &recorder.sent {
            assert_eq!(payload["jsonrpc"], "2.0");
            assert!(payload.get("id").is_none());
        }
        assert_eq!(recorder.sent[1]["method"], "textDocument/didSave");
        assert_eq!(recorder.sent[2]["method"], "textDocument/didClose");
    }

    #[test]
    fn reopening_a_closed_document_restarts_its_version() {
        let mut recorder = Recorder::default();
        let mut proxy = DocumentProxy::new(&mut recorder);

        proxy.did_open("file:///q.flux", "a").unwrap();
        proxy.did_change("file:///q.flux", "b").unwrap();
        proxy.did_close("file:///q.flux").unwrap();
        proxy.did_open("file:///q.flux", "c").unwrap();
        proxy.did_change("file:///q.flux", "d").unwrap();
        drop(proxy);

        assert_eq!(
            recorder.sent[4]["params"]["textDocument"]["version"],
            2
        );
    }

    #[test]
    fn transport_errors_propagate_unchanged() {
        struct Failing;
        impl Transport for Failing {
            fn send(&mut self, _payload: &str) -> Result<()> {
                TransportFailed { message: "pipe closed" }.fail()
            }
        }

        let mut proxy = DocumentProxy::new(Failing);
        let err = proxy.did_open("file:///q.flux", "x").unwrap_err();
        assert_eq!(err.to_string(), "transport error: pipe closed");
    }
}
