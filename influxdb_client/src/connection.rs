//! Connection descriptors for InfluxDB instances.
//!
//! A descriptor is a plain value supplied by the caller per query; where
//! it came from (editor settings, flags, a config store) is not this
//! crate's concern.

/// The wire protocol generation an instance speaks.
///
/// Each version carries its own transport shape and response format;
/// the client selects both from this tag, once per descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    /// 1.x: InfluxQL via URL parameters, JSON result/series responses
    V1,
    /// 2.x: Flux posted as the request body, annotated CSV responses
    V2,
}

/// Everything needed to reach one InfluxDB instance.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Display name of the connection
    pub name: String,
    /// Base URL of the instance, e.g. `http://127.0.0.1:8086`
    pub url: String,
    /// Protocol generation the instance speaks
    pub version: ApiVersion,
    /// API token; used by 2.x authorization headers
    pub token: String,
    /// Organization name; required by 2.x query requests
    pub org: String,
}

impl ConnectionConfig {
    /// Creates a descriptor with empty credentials.
    pub fn new(name: impl Into<String>, url: impl Into<String>, version: ApiVersion) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            version,
            token: String::new(),
            org: String::new(),
        }
    }

    /// Sets the API token, replacing any existing one.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Sets the organization, replacing any existing one.
    pub fn org(mut self, org: impl Into<String>) -> Self {
        self.org = org.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_style_setters() {
        let config = ConnectionConfig::new("local", "http://localhost:8086", ApiVersion::V2)
            .token("secret")
            .org("my-org");

        assert_eq!(config.name, "local");
        assert_eq!(config.version, ApiVersion::V2);
        assert_eq!(config.token, "secret");
        assert_eq!(config.org, "my-org");
    }
}
