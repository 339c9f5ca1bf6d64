//! Errors surfaced by `HttpDataSource`.
//!
//! Transport problems stay as [`NetError`] codes and are wrapped with the
//! operation and URL they happened on. HTTP-level failures carry the full
//! response diagnostics so an external retry loop can decide what to do.

use crate::base::neterror::NetError;
use crate::http::dataspec::DataSpec;
use bytes::Bytes;
use http::HeaderMap;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Which data source operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Open,
    Read,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Open => f.write_str("open"),
            OperationType::Read => f.write_str("read"),
        }
    }
}

/// A redirect the configured policy refuses to follow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedirectViolation {
    #[error("Disallowed cross-protocol redirect ({from} to {to})")]
    CrossProtocol { from: String, to: String },
    #[error("Unsupported protocol redirect: {scheme}")]
    UnsupportedProtocol { scheme: String },
}

/// Non-2xx response with everything the server told us.
#[derive(Debug, Clone)]
pub struct InvalidResponseCode {
    pub code: u16,
    pub message: String,
    pub headers: HeaderMap,
    /// Captured error body, bounded; empty when the server sent none.
    pub body: Bytes,
    pub data_spec: DataSpec,
}

impl fmt::Display for InvalidResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Response code: {}", self.code)?;
        if !self.message.is_empty() {
            write!(f, " {}", self.message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum HttpDataSourceError {
    #[error("Unable to {op} {url}: {source}")]
    Transport {
        op: OperationType,
        url: Url,
        #[source]
        source: NetError,
    },

    #[error("{violation} while opening {url}")]
    RedirectPolicy {
        url: Url,
        #[source]
        violation: RedirectViolation,
    },

    #[error("{0}")]
    InvalidResponseCode(Box<InvalidResponseCode>),

    #[error("Invalid content type: {content_type}")]
    InvalidContentType { content_type: String, url: Url },

    #[error("Data source is not opened")]
    NotOpened,

    #[error("Data source is already opened")]
    AlreadyOpened,
}

impl HttpDataSourceError {
    pub fn transport(op: OperationType, url: &Url, source: NetError) -> Self {
        HttpDataSourceError::Transport {
            op,
            url: url.clone(),
            source,
        }
    }

    /// The HTTP status when the failure was an invalid response code.
    pub fn response_code(&self) -> Option<u16> {
        match self {
            HttpDataSourceError::InvalidResponseCode(e) => Some(e.code),
            _ => None,
        }
    }

    pub fn invalid_response(&self) -> Option<&InvalidResponseCode> {
        match self {
            HttpDataSourceError::InvalidResponseCode(e) => Some(e),
            _ => None,
        }
    }

    pub fn net_error(&self) -> Option<NetError> {
        match self {
            HttpDataSourceError::Transport { source, .. } => Some(*source),
            _ => None,
        }
    }

    /// Hint for an external retry loop. This crate never retries itself.
    pub fn is_retryable_hint(&self) -> bool {
        match self {
            HttpDataSourceError::Transport { source, .. } => source.is_transient(),
            HttpDataSourceError::InvalidResponseCode(e) => {
                e.code == 408 || e.code == 429 || (500..600).contains(&e.code)
            }
            _ => false,
        }
    }
}

impl From<InvalidResponseCode> for HttpDataSourceError {
    fn from(err: InvalidResponseCode) -> Self {
        HttpDataSourceError::InvalidResponseCode(Box::new(err))
    }
}
