//! Data source factory - central configuration for fetches.
//!
//! Owns the transport, the shared default header layer and the policy knobs
//! every data source it creates inherits.

use crate::http::connection::Connector;
use crate::http::requestproperties::{RequestProperties, SharedRequestProperties};
use crate::http::streamfactory::HttpStreamFactory;
use crate::http::validator::{ContentTypePredicate, DEFAULT_MAX_ERROR_BODY_BYTES};
use crate::urlrequest::request::HttpDataSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(8 * 1000);

/// Default read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(8 * 1000);

/// Redirects followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: u8 = 20;

/// Configuration options for `HttpDataSource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpDataSourceConfig {
    /// User-Agent sent with every request; none when unset.
    pub user_agent: Option<String>,

    #[serde(with = "duration_ms", rename = "connect_timeout_ms")]
    pub connect_timeout: Duration,

    #[serde(with = "duration_ms", rename = "read_timeout_ms")]
    pub read_timeout: Duration,

    /// Follow redirects that switch between http and https.
    pub allow_cross_protocol_redirects: bool,

    /// Keep POST (and its body) when following a 302.
    pub keep_post_for_302_redirects: bool,

    pub max_redirects: u8,

    /// Cap on the captured body of a non-2xx response.
    pub max_error_body_bytes: usize,
}

impl Default for HttpDataSourceConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            allow_cross_protocol_redirects: false,
            keep_post_for_302_redirects: false,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_error_body_bytes: DEFAULT_MAX_ERROR_BODY_BYTES,
        }
    }
}

impl HttpDataSourceConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Creates [`HttpDataSource`]s sharing one transport and one default
/// header layer.
///
/// Mutating the defaults affects every data source this factory created,
/// starting with its next `open`.
pub struct HttpDataSourceFactory {
    connector: Arc<dyn Connector>,
    default_request_properties: SharedRequestProperties,
    content_type_predicate: Option<ContentTypePredicate>,
    config: HttpDataSourceConfig,
}

impl HttpDataSourceFactory {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self::with_config(connector, HttpDataSourceConfig::default())
    }

    pub fn with_config(connector: Arc<dyn Connector>, config: HttpDataSourceConfig) -> Self {
        Self {
            connector,
            default_request_properties: SharedRequestProperties::new(),
            content_type_predicate: None,
            config,
        }
    }

    /// The default header layer. Clones share the same store.
    pub fn default_request_properties(&self) -> &SharedRequestProperties {
        &self.default_request_properties
    }

    pub fn set_default_request_property(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &Self {
        self.default_request_properties.set(name, value);
        self
    }

    /// Replace the whole default layer.
    pub fn set_default_request_properties(&self, properties: RequestProperties) -> &Self {
        self.default_request_properties.replace_all(properties);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Reject successful responses whose `Content-Type` fails `predicate`.
    pub fn with_content_type_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.content_type_predicate = Some(Arc::new(predicate));
        self
    }

    pub fn config(&self) -> &HttpDataSourceConfig {
        &self.config
    }

    pub fn create_data_source(&self) -> HttpDataSource {
        let mut source = HttpDataSource::new(
            Arc::clone(&self.connector),
            self.config.clone(),
            Some(self.default_request_properties.clone()),
        );
        if let Some(predicate) = &self.content_type_predicate {
            source.set_content_type_predicate(Arc::clone(predicate));
        }
        source
    }
}

impl Default for HttpDataSourceFactory {
    fn default() -> Self {
        Self::new(Arc::new(HttpStreamFactory::new()))
    }
}

impl std::fmt::Debug for HttpDataSourceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDataSourceFactory")
            .field("default_request_properties", &self.default_request_properties)
            .field("content_type_predicate", &self.content_type_predicate.is_some())
            .field("config", &self.config)
            .finish()
    }
}
