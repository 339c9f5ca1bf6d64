//! Shipped transport: one HTTP/1.1 exchange per connection over hyper.

use crate::base::neterror::NetError;
use crate::http::connection::{
    BodyWriter, ConnectionFuture, ConnectionRequest, Connector, HttpConnection, PayloadStream,
};
use crate::socket::connectjob::ConnectJob;
use crate::socket::tls::TlsConfig;
use bytes::{Buf, Bytes};
use http::header::{CONTENT_LENGTH, HOST};
use http::{HeaderMap, HeaderName, HeaderValue, Request};
use http_body::Body;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Sleep};
use url::{Position, Url};

/// Creates [`HttpStream`]s. Each stream dials its own socket.
#[derive(Debug, Clone, Default)]
pub struct HttpStreamFactory {
    tls: TlsConfig,
}

impl HttpStreamFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tls(tls: TlsConfig) -> Self {
        Self { tls }
    }
}

impl Connector for HttpStreamFactory {
    fn open_connection(
        &self,
        request: &ConnectionRequest,
    ) -> Result<Box<dyn HttpConnection>, NetError> {
        match request.url.scheme() {
            "http" | "https" => {}
            _ => return Err(NetError::DisallowedUrlScheme),
        }
        if request.follow_redirects {
            tracing::trace!(url = %request.url, "transport never follows redirects");
        }
        Ok(Box::new(HttpStream::new(request.clone(), self.tls.clone())))
    }
}

/// One HTTP/1.1 exchange.
pub struct HttpStream {
    request: ConnectionRequest,
    tls: TlsConfig,
    request_headers: HeaderMap,
    fixed_length: Option<u64>,
    body: Vec<u8>,
    executed: bool,
    status: Option<u16>,
    reason: String,
    response_headers: HeaderMap,
    payload: Option<PayloadStream>,
    driver: Option<JoinHandle<()>>,
}

impl HttpStream {
    fn new(request: ConnectionRequest, tls: TlsConfig) -> Self {
        Self {
            request,
            tls,
            request_headers: HeaderMap::new(),
            fixed_length: None,
            body: Vec::new(),
            executed: false,
            status: None,
            reason: String::new(),
            response_headers: HeaderMap::new(),
            payload: None,
            driver: None,
        }
    }

    fn build_request(&mut self) -> Result<Request<Full<Bytes>>, NetError> {
        let url = &self.request.url;
        let target = &url[Position::BeforePath..Position::AfterQuery];
        let target = if target.is_empty() { "/" } else { target };

        let body = std::mem::take(&mut self.body);
        if let Some(len) = self.fixed_length {
            if len != body.len() as u64 {
                return Err(NetError::ContentLengthMismatch);
            }
        }

        let mut req = Request::builder()
            .method(http::Method::from(self.request.method))
            .uri(target)
            .body(Full::new(Bytes::from(body)))
            .map_err(|_| NetError::InvalidUrl)?;

        *req.headers_mut() = std::mem::take(&mut self.request_headers);
        if !req.headers().contains_key(HOST) {
            let authority = &url[Position::BeforeHost..Position::AfterPort];
            let host = HeaderValue::from_str(authority).map_err(|_| NetError::InvalidUrl)?;
            req.headers_mut().insert(HOST, host);
        }
        if let Some(len) = self.fixed_length {
            req.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(len));
        }
        Ok(req)
    }

    async fn execute(&mut self) -> Result<(), NetError> {
        if self.executed {
            return Err(NetError::RequestAlreadySent);
        }
        self.executed = true;

        let url = self.request.url.clone();
        let socket = timeout(
            self.request.connect_timeout,
            ConnectJob::connect(&url, &self.tls),
        )
        .await
        .map_err(|_| NetError::ConnectionTimedOut)??;
        tracing::trace!(url = %url, tls = socket.is_tls(), "socket connected");

        let (mut sender, conn) = http1::handshake::<_, Full<Bytes>>(TokioIo::new(socket))
            .await
            .map_err(|e| {
                tracing::debug!(url = %url, error = %e, "handshake failed");
                NetError::ConnectionFailed
            })?;

        let driver_url = url.clone();
        self.driver = Some(tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(url = %driver_url, error = %e, "connection driver ended");
            }
        }));

        let req = self.build_request()?;
        let response = timeout(self.request.read_timeout, sender.send_request(req))
            .await
            .map_err(|_| NetError::TimedOut)?
            .map_err(|e| map_hyper_error(&e))?;

        let status = response.status();
        self.status = Some(status.as_u16());
        self.reason = match response.extensions().get::<hyper::ext::ReasonPhrase>() {
            Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
            None => status.canonical_reason().unwrap_or_default().to_string(),
        };

        let (parts, incoming) = response.into_parts();
        self.response_headers = parts.headers;
        self.payload = Some(Box::pin(IncomingReader::new(
            incoming,
            self.request.read_timeout,
        )));

        tracing::trace!(url = %url, status = status.as_u16(), "response head received");
        Ok(())
    }

    fn is_success(&self) -> bool {
        matches!(self.status, Some(code) if (200..300).contains(&code))
    }
}

impl HttpConnection for HttpStream {
    fn url(&self) -> &Url {
        &self.request.url
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        if self.executed {
            return Err(NetError::RequestAlreadySent);
        }
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| NetError::InvalidHeader)?;
        let value = HeaderValue::from_str(value).map_err(|_| NetError::InvalidHeader)?;
        self.request_headers.insert(name, value);
        Ok(())
    }

    fn set_fixed_length_streaming_mode(&mut self, len: u64) -> Result<(), NetError> {
        if self.executed {
            return Err(NetError::RequestAlreadySent);
        }
        self.fixed_length = Some(len);
        Ok(())
    }

    fn output_stream(&mut self) -> Result<BodyWriter<'_>, NetError> {
        if self.executed {
            return Err(NetError::RequestAlreadySent);
        }
        Ok(Box::pin(&mut self.body))
    }

    fn connect(&mut self) -> ConnectionFuture<'_, ()> {
        Box::pin(self.execute())
    }

    fn response_code(&self) -> Option<u16> {
        self.status
    }

    fn response_message(&self) -> &str {
        &self.reason
    }

    fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    fn take_input_stream(&mut self) -> Option<PayloadStream> {
        if self.is_success() {
            self.payload.take()
        } else {
            None
        }
    }

    fn take_error_stream(&mut self) -> Option<PayloadStream> {
        if self.status.is_some() && !self.is_success() {
            self.payload.take()
        } else {
            None
        }
    }

    fn disconnect(&mut self) {
        self.payload = None;
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

impl Drop for HttpStream {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn map_hyper_error(e: &hyper::Error) -> NetError {
    tracing::debug!(error = %e, "request failed");
    if e.is_timeout() {
        NetError::TimedOut
    } else if e.is_parse() || e.is_parse_status() {
        NetError::InvalidHttpResponse
    } else if e.is_incomplete_message() {
        NetError::EmptyResponse
    } else if e.is_canceled() || e.is_closed() {
        NetError::ConnectionClosed
    } else {
        NetError::ConnectionFailed
    }
}

/// `AsyncRead` over a hyper body, with a per-read inactivity timeout.
struct IncomingReader {
    body: Incoming,
    chunk: Bytes,
    read_timeout: Duration,
    idle: Option<Pin<Box<Sleep>>>,
    done: bool,
}

impl IncomingReader {
    fn new(body: Incoming, read_timeout: Duration) -> Self {
        Self {
            body,
            chunk: Bytes::new(),
            read_timeout,
            idle: None,
            done: false,
        }
    }
}

impl AsyncRead for IncomingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        loop {
            if !this.chunk.is_empty() {
                let n = buf.remaining().min(this.chunk.len());
                buf.put_slice(&this.chunk[..n]);
                this.chunk.advance(n);
                this.idle = None;
                return Poll::Ready(Ok(()));
            }
            if this.done {
                return Poll::Ready(Ok(()));
            }

            match Pin::new(&mut this.body).poll_frame(cx) {
                Poll::Ready(Some(Ok(frame))) => {
                    if let Ok(data) = frame.into_data() {
                        this.chunk = data;
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    let kind = if e.is_incomplete_message() {
                        io::ErrorKind::UnexpectedEof
                    } else if e.is_timeout() {
                        io::ErrorKind::TimedOut
                    } else {
                        io::ErrorKind::ConnectionReset
                    };
                    return Poll::Ready(Err(io::Error::new(kind, e)));
                }
                Poll::Ready(None) => {
                    this.done = true;
                    return Poll::Ready(Ok(()));
                }
                Poll::Pending => {
                    let read_timeout = this.read_timeout;
                    let idle = this
                        .idle
                        .get_or_insert_with(|| Box::pin(tokio::time::sleep(read_timeout)));
                    if idle.as_mut().poll(cx).is_ready() {
                        this.idle = None;
                        return Poll::Ready(Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "read timed out",
                        )));
                    }
                    return Poll::Pending;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::dataspec::HttpMethod;

    fn request(url: &str) -> ConnectionRequest {
        ConnectionRequest {
            url: Url::parse(url).unwrap(),
            method: HttpMethod::Get,
            connect_timeout: Duration::from_secs(1),
            read_timeout: Duration::from_secs(1),
            follow_redirects: false,
        }
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let factory = HttpStreamFactory::new();
        assert_eq!(
            factory.open_connection(&request("ftp://a.test/")).err(),
            Some(NetError::DisallowedUrlScheme)
        );
    }

    #[test]
    fn test_invalid_header_name() {
        let factory = HttpStreamFactory::new();
        let mut conn = factory.open_connection(&request("http://a.test/")).unwrap();
        assert_eq!(
            conn.set_request_header("bad header", "v"),
            Err(NetError::InvalidHeader)
        );
        assert_eq!(conn.set_request_header("X-Ok", "v"), Ok(()));
        assert_eq!(conn.response_code(), None);
    }

    #[test]
    fn test_build_request_target_and_host() {
        let mut stream = HttpStream::new(request("http://a.test:8080/p/q?x=1#frag"), TlsConfig::default());
        stream.set_request_header("X-Test", "1").unwrap();
        let req = stream.build_request().unwrap();
        assert_eq!(req.uri().to_string(), "/p/q?x=1");
        assert_eq!(req.headers()[HOST], "a.test:8080");
        assert_eq!(req.headers()["x-test"], "1");
    }

    #[test]
    fn test_fixed_length_must_match_body() {
        let mut stream = HttpStream::new(request("http://a.test/"), TlsConfig::default());
        stream.set_fixed_length_streaming_mode(4).unwrap();
        stream.body.extend_from_slice(b"abc");
        assert_eq!(stream.build_request().unwrap_err(), NetError::ContentLengthMismatch);
    }
}
