//! Ergonomic error context helpers.
//!
//! Converts `std::io::Error` values coming out of sockets and payload streams
//! into `NetError` codes, logging the detail that the code itself drops.

use crate::base::neterror::NetError;
use std::io;

impl From<&io::Error> for NetError {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => NetError::ConnectionRefused,
            io::ErrorKind::ConnectionReset => NetError::ConnectionReset,
            io::ErrorKind::ConnectionAborted => NetError::ConnectionAborted,
            io::ErrorKind::NotConnected => NetError::SocketNotConnected,
            io::ErrorKind::AddrNotAvailable => NetError::AddressUnreachable,
            io::ErrorKind::TimedOut => NetError::TimedOut,
            io::ErrorKind::BrokenPipe => NetError::ConnectionClosed,
            io::ErrorKind::UnexpectedEof => NetError::ContentLengthMismatch,
            io::ErrorKind::InvalidInput => NetError::InvalidArgument,
            io::ErrorKind::InvalidData => NetError::InvalidResponse,
            io::ErrorKind::Interrupted => NetError::Aborted,
            _ => NetError::ConnectionFailed,
        }
    }
}

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Map a connect-phase IO error, logging the target.
    ///
    /// # Example
    /// ```ignore
    /// use rangenet::base::context::IoResultExt;
    ///
    /// let stream = TcpStream::connect(addr).await
    ///     .connection_context("example.com", 443)?;
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError>;

    /// Map an IO error raised while moving request or response bytes.
    fn transfer_context(self) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError> {
        self.map_err(|e| {
            tracing::debug!(host = %host, port, error = %e, "connection failed");
            NetError::from(&e)
        })
    }

    fn transfer_context(self) -> Result<T, NetError> {
        self.map_err(|e| {
            tracing::debug!(error = %e, "transfer failed");
            NetError::from(&e)
        })
    }
}
