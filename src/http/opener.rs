//! Connection opening with manual redirect handling.
//!
//! The transport is never allowed to follow redirects by itself: each hop
//! is a separate exchange so the cross-protocol policy and POST handling
//! can be applied between them.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::http::connection::{ConnectionGuard, ConnectionRequest, Connector};
use crate::http::dataspec::{DataSpec, HttpMethod, FLAG_ALLOW_GZIP};
use crate::http::error::{HttpDataSourceError, OperationType, RedirectViolation};
use crate::http::requestbody::RequestBody;
use crate::http::resolver::MergedHeaders;
use crate::urlrequest::context::HttpDataSourceConfig;
use http::header::{ACCEPT_ENCODING, LOCATION, RANGE, USER_AGENT};
use tokio::io::AsyncWriteExt;
use url::Url;

/// Redirect status codes the opener follows.
pub fn is_redirect(code: u16) -> bool {
    matches!(code, 300 | 301 | 302 | 303 | 307 | 308)
}

/// Opens the exchange for one fetch, following redirects.
pub struct ConnectionOpener<'a> {
    connector: &'a dyn Connector,
    config: &'a HttpDataSourceConfig,
}

impl<'a> ConnectionOpener<'a> {
    pub fn new(connector: &'a dyn Connector, config: &'a HttpDataSourceConfig) -> Self {
        Self { connector, config }
    }

    /// Merged layer headers plus the headers the data source owns.
    pub fn request_headers(&self, data_spec: &DataSpec, merged: MergedHeaders) -> MergedHeaders {
        let mut headers = merged;
        if let Some(range) = data_spec.range_header() {
            headers = headers.with_header(RANGE.as_str(), range);
        }
        if let Some(user_agent) = &self.config.user_agent {
            headers = headers.with_header(USER_AGENT.as_str(), user_agent.as_str());
        }
        let encoding = if data_spec.is_flag_set(FLAG_ALLOW_GZIP) {
            "gzip"
        } else {
            "identity"
        };
        headers.with_header(ACCEPT_ENCODING.as_str(), encoding)
    }

    /// Execute the request, following redirects.
    ///
    /// Returns the final exchange (not yet validated) and the URL it was
    /// made to.
    pub async fn open(
        &self,
        data_spec: &DataSpec,
        headers: &MergedHeaders,
    ) -> Result<(ConnectionGuard, Url), HttpDataSourceError> {
        let mut url = data_spec.uri().clone();
        let mut method = data_spec.method();
        let mut body = data_spec.body().clone();
        let mut redirects_left = self.config.max_redirects;

        loop {
            let mut guard = self.open_once(&url, method, headers, &body).await?;
            let Some(connection) = guard.get_mut() else {
                return Err(HttpDataSourceError::transport(
                    OperationType::Open,
                    &url,
                    NetError::ConnectionClosed,
                ));
            };

            let code = match connection.response_code() {
                Some(code) if is_redirect(code) => code,
                _ => return Ok((guard, url)),
            };

            let location = connection
                .response_headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            guard.disconnect();

            let location = location.ok_or_else(|| {
                HttpDataSourceError::transport(OperationType::Open, &url, NetError::InvalidRedirect)
            })?;

            if redirects_left == 0 {
                return Err(HttpDataSourceError::transport(
                    OperationType::Open,
                    &url,
                    NetError::TooManyRedirects,
                ));
            }
            redirects_left -= 1;

            let next = self.redirect_target(&url, &location)?;

            if method == HttpMethod::Post
                && matches!(code, 300..=303)
                && !(code == 302 && self.config.keep_post_for_302_redirects)
            {
                method = HttpMethod::Get;
                body = RequestBody::Absent;
            }

            tracing::debug!(from = %url, to = %next, code, method = %method, "following redirect");
            url = next;
        }
    }

    fn redirect_target(&self, current: &Url, location: &str) -> Result<Url, HttpDataSourceError> {
        let next = current.join(location).map_err(|_| {
            HttpDataSourceError::transport(OperationType::Open, current, NetError::InvalidRedirect)
        })?;

        let scheme = next.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(HttpDataSourceError::RedirectPolicy {
                url: current.clone(),
                violation: RedirectViolation::UnsupportedProtocol {
                    scheme: scheme.to_string(),
                },
            });
        }

        if !self.config.allow_cross_protocol_redirects && scheme != current.scheme() {
            return Err(HttpDataSourceError::RedirectPolicy {
                url: current.clone(),
                violation: RedirectViolation::CrossProtocol {
                    from: current.scheme().to_string(),
                    to: scheme.to_string(),
                },
            });
        }

        Ok(next)
    }

    /// One exchange: configure, send the body, execute.
    async fn open_once(
        &self,
        url: &Url,
        method: HttpMethod,
        headers: &MergedHeaders,
        body: &RequestBody,
    ) -> Result<ConnectionGuard, HttpDataSourceError> {
        let fail = |e: NetError| HttpDataSourceError::transport(OperationType::Open, url, e);

        let request = ConnectionRequest {
            url: url.clone(),
            method,
            connect_timeout: self.config.connect_timeout,
            read_timeout: self.config.read_timeout,
            follow_redirects: false,
        };
        let mut guard = ConnectionGuard::new(self.connector.open_connection(&request).map_err(fail)?);
        let Some(connection) = guard.get_mut() else {
            return Err(fail(NetError::ConnectionClosed));
        };

        for (name, value) in headers.iter() {
            connection.set_request_header(name, value).map_err(fail)?;
        }

        if let Some(bytes) = body.bytes() {
            connection
                .set_fixed_length_streaming_mode(bytes.len() as u64)
                .map_err(fail)?;
            let mut out = connection.output_stream().map_err(fail)?;
            out.write_all(bytes).await.transfer_context().map_err(fail)?;
            out.shutdown().await.transfer_context().map_err(fail)?;
        }

        tracing::debug!(url = %url, method = %method, "opening connection");
        connection.connect().await.map_err(fail)?;
        Ok(guard)
    }
}
