use crate::base::loadstate::FetchState;
use crate::http::connection::{ConnectionGuard, Connector, PayloadStream};
use crate::http::dataspec::DataSpec;
use crate::http::error::{HttpDataSourceError, OperationType};
use crate::http::opener::ConnectionOpener;
use crate::http::requestproperties::RequestProperties;
use crate::http::resolver;
use crate::http::response::ResponseInfo;
use crate::http::responsebody::ResponseBody;
use crate::http::validator::{self, ContentTypePredicate};
use crate::urlrequest::context::HttpDataSourceConfig;
use http::HeaderMap;
use url::Url;

/// One fetch: resolve headers, open, validate, then stream the payload.
///
/// Whatever happens, the connection is released before an error leaves
/// [`start`](Self::start), and [`close`](Self::close) always ends in
/// [`FetchState::Closed`].
pub struct HttpFetchJob {
    data_spec: DataSpec,
    url: Url,
    state: FetchState,
    connection: Option<ConnectionGuard>,
    body: Option<ResponseBody>,
    response: Option<ResponseInfo>,
    response_code: Option<u16>,
    response_headers: HeaderMap,
    bytes_read: u64,
}

impl HttpFetchJob {
    pub fn new(data_spec: DataSpec) -> Self {
        Self {
            url: data_spec.uri().clone(),
            data_spec,
            state: FetchState::Unopened,
            connection: None,
            body: None,
            response: None,
            response_code: None,
            response_headers: HeaderMap::new(),
            bytes_read: 0,
        }
    }

    /// Run the fetch up to a validated response.
    ///
    /// Returns the number of payload bytes that will be delivered, when
    /// known.
    pub async fn start(
        &mut self,
        connector: &dyn Connector,
        config: &HttpDataSourceConfig,
        content_type_predicate: Option<&ContentTypePredicate>,
        defaults: &RequestProperties,
        instance_overrides: &RequestProperties,
    ) -> Result<Option<u64>, HttpDataSourceError> {
        let result = self
            .do_start(connector, config, content_type_predicate, defaults, instance_overrides)
            .await;
        if result.is_err() {
            self.body = None;
            if let Some(mut connection) = self.connection.take() {
                connection.disconnect();
            }
            if self.state != FetchState::ValidatedFailure {
                self.state = FetchState::Closed;
            }
        }
        result
    }

    async fn do_start(
        &mut self,
        connector: &dyn Connector,
        config: &HttpDataSourceConfig,
        content_type_predicate: Option<&ContentTypePredicate>,
        defaults: &RequestProperties,
        instance_overrides: &RequestProperties,
    ) -> Result<Option<u64>, HttpDataSourceError> {
        let opener = ConnectionOpener::new(connector, config);

        let merged = resolver::resolve(
            defaults,
            instance_overrides,
            self.data_spec.http_request_headers(),
        );
        let headers = opener.request_headers(&self.data_spec, merged);
        self.state = FetchState::HeadersResolved;
        tracing::trace!(url = %self.url, headers = headers.len(), "headers resolved");

        let (guard, url) = opener.open(&self.data_spec, &headers).await?;
        self.url = url;
        self.state = FetchState::ConnectionOpened;
        let guard = self.connection.insert(guard);

        let Some(connection) = guard.get_mut() else {
            return Err(HttpDataSourceError::NotOpened);
        };
        self.response_code = connection.response_code();
        self.response_headers = connection.response_headers().clone();

        let validated = validator::validate(
            connection,
            &self.data_spec,
            config.max_error_body_bytes,
            content_type_predicate,
        )
        .await;

        let info = match validated {
            Ok(info) => info,
            Err(e) => {
                if matches!(e, HttpDataSourceError::InvalidResponseCode(_)) {
                    self.state = FetchState::ValidatedFailure;
                }
                return Err(e);
            }
        };

        let stream = connection
            .take_input_stream()
            .unwrap_or_else(|| -> PayloadStream { Box::pin(tokio::io::empty()) });
        let bytes_to_read = info.bytes_to_read;
        self.body = Some(ResponseBody::new(stream, info.bytes_to_skip, bytes_to_read));
        self.response = Some(info);
        self.state = FetchState::ValidatedSuccess;
        tracing::debug!(url = %self.url, bytes_to_read = ?bytes_to_read, "opened");

        Ok(bytes_to_read)
    }

    /// Read payload bytes. Returns 0 at end of input.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, HttpDataSourceError> {
        if !self.state.is_readable() {
            return Err(HttpDataSourceError::NotOpened);
        }
        let Some(body) = self.body.as_mut() else {
            return Err(HttpDataSourceError::NotOpened);
        };
        let n = body
            .read(buf)
            .await
            .map_err(|e| HttpDataSourceError::transport(OperationType::Read, &self.url, e))?;
        self.bytes_read += n as u64;
        Ok(n)
    }

    /// Release the connection. Safe to call any number of times.
    pub fn close(&mut self) {
        if self.state == FetchState::Closed {
            return;
        }
        self.body = None;
        if let Some(mut connection) = self.connection.take() {
            connection.disconnect();
        }
        tracing::debug!(url = %self.url, "closed");
        self.state = FetchState::Closed;
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Final URL, after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn data_spec(&self) -> &DataSpec {
        &self.data_spec
    }

    pub fn response(&self) -> Option<&ResponseInfo> {
        self.response.as_ref()
    }

    pub fn response_code(&self) -> Option<u16> {
        self.response_code
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// `None` when unknown or once the payload has been released.
    pub fn bytes_remaining(&self) -> Option<u64> {
        self.body.as_ref().and_then(ResponseBody::bytes_remaining)
    }
}

impl Drop for HttpFetchJob {
    fn drop(&mut self) {
        self.close();
    }
}
