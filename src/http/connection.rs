//! Transport capability consumed by the data source.
//!
//! A [`Connector`] hands out one [`HttpConnection`] per exchange. The data
//! source configures it, executes it, inspects the status and reads one of
//! its streams; it never touches sockets directly. The shipped
//! implementation is [`HttpStreamFactory`](crate::http::streamfactory::HttpStreamFactory);
//! tests plug in fakes.

use crate::base::neterror::NetError;
use crate::http::dataspec::HttpMethod;
use http::HeaderMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use url::Url;

/// Future returned by connection operations.
pub type ConnectionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, NetError>> + Send + 'a>>;

/// Response payload or error body.
pub type PayloadStream = Pin<Box<dyn AsyncRead + Send>>;

/// Sink for the request body.
pub type BodyWriter<'a> = Pin<Box<dyn AsyncWrite + Send + 'a>>;

/// Parameters for creating one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub url: Url,
    pub method: HttpMethod,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Whether the transport may follow redirects on its own. The data
    /// source always asks for `false` and applies its own policy.
    pub follow_redirects: bool,
}

/// Creates connections. Implementations must be thread-safe.
pub trait Connector: Send + Sync {
    fn open_connection(
        &self,
        request: &ConnectionRequest,
    ) -> Result<Box<dyn HttpConnection>, NetError>;
}

impl<C: Connector + ?Sized> Connector for Arc<C> {
    fn open_connection(
        &self,
        request: &ConnectionRequest,
    ) -> Result<Box<dyn HttpConnection>, NetError> {
        (**self).open_connection(request)
    }
}

/// One HTTP exchange.
///
/// Lifecycle: configured → executed (`connect`) → streams read →
/// disconnected. Header and body setters are only valid before `connect`.
pub trait HttpConnection: Send {
    fn url(&self) -> &Url;

    /// Fails with [`NetError::RequestAlreadySent`] after execution.
    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), NetError>;

    /// Announce a body of exactly `len` bytes (`Content-Length`).
    fn set_fixed_length_streaming_mode(&mut self, len: u64) -> Result<(), NetError>;

    /// Stream the request body is written to.
    fn output_stream(&mut self) -> Result<BodyWriter<'_>, NetError>;

    /// Execute the exchange; resolves once the response head is available.
    fn connect(&mut self) -> ConnectionFuture<'_, ()>;

    /// `None` until executed.
    fn response_code(&self) -> Option<u16>;

    fn response_message(&self) -> &str;

    fn response_headers(&self) -> &HeaderMap;

    /// Payload of a 2xx response. Yields the stream once.
    fn take_input_stream(&mut self) -> Option<PayloadStream>;

    /// Body of a non-2xx response, if the server sent one. Yields the
    /// stream once.
    fn take_error_stream(&mut self) -> Option<PayloadStream>;

    fn using_proxy(&self) -> bool {
        false
    }

    /// Release the exchange. Must be idempotent and interrupt pending reads.
    fn disconnect(&mut self);
}

/// Owns a connection and disconnects it on every exit path.
pub struct ConnectionGuard {
    inner: Option<Box<dyn HttpConnection>>,
}

impl ConnectionGuard {
    pub fn new(connection: Box<dyn HttpConnection>) -> Self {
        Self {
            inner: Some(connection),
        }
    }

    pub fn get(&self) -> Option<&(dyn HttpConnection + 'static)> {
        self.inner.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut (dyn HttpConnection + 'static)> {
        self.inner.as_deref_mut()
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Disconnect now. Later calls (and the drop) are no-ops.
    pub fn disconnect(&mut self) {
        if let Some(mut connection) = self.inner.take() {
            tracing::trace!(url = %connection.url(), "disconnecting");
            connection.disconnect();
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("url", &self.get().map(|c| c.url().as_str()))
            .finish()
    }
}
