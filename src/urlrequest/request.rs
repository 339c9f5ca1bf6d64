use crate::base::loadstate::FetchState;
use crate::http::connection::Connector;
use crate::http::dataspec::DataSpec;
use crate::http::error::HttpDataSourceError;
use crate::http::requestproperties::{RequestProperties, SharedRequestProperties};
use crate::http::response::ResponseInfo;
use crate::http::validator::ContentTypePredicate;
use crate::urlrequest::context::HttpDataSourceConfig;
use crate::urlrequest::job::HttpFetchJob;
use http::HeaderMap;
use std::sync::Arc;
use url::Url;

/// Reads one HTTP resource at a time.
///
/// Headers sent with a fetch come from three layers, highest first: the
/// `DataSpec`'s own headers, this source's request properties, and the
/// factory defaults. Layers are read when [`open`](Self::open) runs, so
/// changes made between fetches apply to the next one.
///
/// ```rust,ignore
/// let factory = HttpDataSourceFactory::default();
/// factory.set_default_request_property("Accept", "*/*");
///
/// let mut source = factory.create_data_source();
/// source.set_request_property("Authorization", "Bearer t");
/// source.open(DataSpec::new(url)).await?;
/// let mut buf = [0u8; 8192];
/// while source.read(&mut buf).await? > 0 {}
/// source.close();
/// ```
pub struct HttpDataSource {
    connector: Arc<dyn Connector>,
    config: HttpDataSourceConfig,
    default_request_properties: Option<SharedRequestProperties>,
    request_properties: RequestProperties,
    content_type_predicate: Option<ContentTypePredicate>,
    job: Option<HttpFetchJob>,
}

impl HttpDataSource {
    /// `default_request_properties` of `None` behaves as an empty layer.
    pub fn new(
        connector: Arc<dyn Connector>,
        config: HttpDataSourceConfig,
        default_request_properties: Option<SharedRequestProperties>,
    ) -> Self {
        Self {
            connector,
            config,
            default_request_properties,
            request_properties: RequestProperties::new(),
            content_type_predicate: None,
            job: None,
        }
    }

    pub fn set_request_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.request_properties.set(name, value);
    }

    pub fn clear_request_property(&mut self, name: &str) {
        self.request_properties.remove(name);
    }

    pub fn clear_all_request_properties(&mut self) {
        self.request_properties.clear();
    }

    pub fn request_properties(&self) -> &RequestProperties {
        &self.request_properties
    }

    pub fn set_content_type_predicate(&mut self, predicate: ContentTypePredicate) {
        self.content_type_predicate = Some(predicate);
    }

    pub fn config(&self) -> &HttpDataSourceConfig {
        &self.config
    }

    /// Open `data_spec`.
    ///
    /// Returns the number of bytes that can be read, `None` if unknown. On
    /// failure the connection has already been released; a non-2xx response
    /// is reported as [`HttpDataSourceError::InvalidResponseCode`] with the
    /// captured error body.
    pub async fn open(&mut self, data_spec: DataSpec) -> Result<Option<u64>, HttpDataSourceError> {
        if self.state().is_readable() {
            return Err(HttpDataSourceError::AlreadyOpened);
        }

        let defaults = self
            .default_request_properties
            .as_ref()
            .map(SharedRequestProperties::snapshot)
            .unwrap_or_default();

        tracing::debug!(data_spec = %data_spec, "open");
        let job = self.job.insert(HttpFetchJob::new(data_spec));
        job.start(
            self.connector.as_ref(),
            &self.config,
            self.content_type_predicate.as_ref(),
            &defaults,
            &self.request_properties,
        )
        .await
    }

    /// Read into `buf`. Returns 0 at end of input.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, HttpDataSourceError> {
        match self.job.as_mut() {
            Some(job) => job.read(buf).await,
            None => Err(HttpDataSourceError::NotOpened),
        }
    }

    /// Release the current fetch. Idempotent; never fails.
    pub fn close(&mut self) {
        if let Some(job) = self.job.as_mut() {
            job.close();
        }
    }

    /// Final URL of the current fetch, after redirects.
    pub fn uri(&self) -> Option<&Url> {
        self.job.as_ref().map(HttpFetchJob::url)
    }

    pub fn response_code(&self) -> Option<u16> {
        self.job.as_ref().and_then(HttpFetchJob::response_code)
    }

    pub fn response_headers(&self) -> Option<&HeaderMap> {
        self.job.as_ref().map(HttpFetchJob::response_headers)
    }

    pub fn response(&self) -> Option<&ResponseInfo> {
        self.job.as_ref().and_then(HttpFetchJob::response)
    }

    pub fn bytes_read(&self) -> u64 {
        self.job.as_ref().map(HttpFetchJob::bytes_read).unwrap_or(0)
    }

    pub fn bytes_remaining(&self) -> Option<u64> {
        self.job.as_ref().and_then(HttpFetchJob::bytes_remaining)
    }

    pub fn state(&self) -> FetchState {
        self.job
            .as_ref()
            .map(HttpFetchJob::state)
            .unwrap_or_default()
    }
}

impl Drop for HttpDataSource {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for HttpDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDataSource")
            .field("request_properties", &self.request_properties)
            .field("state", &self.state())
            .field("uri", &self.uri().map(Url::as_str))
            .finish()
    }
}
