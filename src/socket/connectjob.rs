use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::socket::stream::SocketType;
use crate::socket::tls::TlsConfig;
use boring::ssl::{SslConnector, SslMethod};
use tokio::net::TcpStream;
use url::Url;

/// Runs the connection process: DNS -> TCP -> TLS.
pub struct ConnectJob;

impl ConnectJob {
    pub async fn connect(url: &Url, tls: &TlsConfig) -> Result<SocketType, NetError> {
        let host = url.host_str().ok_or(NetError::InvalidUrl)?;
        let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;
        let https = match url.scheme() {
            "http" => false,
            "https" => true,
            _ => return Err(NetError::DisallowedUrlScheme),
        };

        // 1. DNS
        let lookup_host = host.trim_start_matches('[').trim_end_matches(']');
        let addrs: Vec<_> = tokio::net::lookup_host((lookup_host, port))
            .await
            .map_err(|e| {
                tracing::debug!(host = %host, error = %e, "name resolution failed");
                NetError::NameNotResolved
            })?
            .collect();
        if addrs.is_empty() {
            return Err(NetError::NameNotResolved);
        }

        // 2. TCP, first address that accepts
        let mut last_error = NetError::ConnectionFailed;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect(addr).await.connection_context(host, port) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_error = e,
            }
        }
        let stream = stream.ok_or(last_error)?;
        let _ = stream.set_nodelay(true);

        if !https {
            return Ok(SocketType::Tcp(stream));
        }

        // 3. TLS
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;
        tls.apply_to_builder(&mut builder)?;
        let mut config = builder
            .build()
            .configure()
            .map_err(|_| NetError::SslProtocolError)?;
        if !TlsConfig::should_set_sni(host) {
            config.set_use_server_name_indication(false);
        }
        if !tls.verify_peer {
            config.set_verify_hostname(false);
        }

        let tls_stream = tokio_boring::connect(config, lookup_host, stream)
            .await
            .map_err(|e| {
                tracing::debug!(host = %host, error = ?e, "TLS handshake failed");
                NetError::SslProtocolError
            })?;

        Ok(SocketType::Ssl(tls_stream))
    }
}
