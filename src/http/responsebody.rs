//! Payload reading with skip and length accounting.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::http::connection::PayloadStream;
use tokio::io::AsyncReadExt;

const SKIP_BUFFER_SIZE: usize = 4096;

/// Response payload of a validated fetch.
///
/// Discards `bytes_to_skip` leading bytes before the first read and stops
/// after `bytes_to_read` bytes when that is known.
pub struct ResponseBody {
    inner: PayloadStream,
    bytes_to_skip: u64,
    bytes_skipped: u64,
    bytes_to_read: Option<u64>,
    bytes_read: u64,
}

impl ResponseBody {
    pub fn new(inner: PayloadStream, bytes_to_skip: u64, bytes_to_read: Option<u64>) -> Self {
        Self {
            inner,
            bytes_to_skip,
            bytes_skipped: 0,
            bytes_to_read,
            bytes_read: 0,
        }
    }

    /// Read into `buf`. Returns 0 at end of input or when `buf` is empty.
    ///
    /// Ending early while a length is expected is a
    /// [`NetError::ContentLengthMismatch`].
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        self.skip_internal().await?;

        if buf.is_empty() {
            return Ok(0);
        }

        let mut len = buf.len();
        if let Some(to_read) = self.bytes_to_read {
            let remaining = to_read - self.bytes_read;
            if remaining == 0 {
                return Ok(0);
            }
            len = len.min(usize::try_from(remaining).unwrap_or(usize::MAX));
        }

        let n = self.inner.read(&mut buf[..len]).await.transfer_context()?;
        if n == 0 {
            if self.bytes_to_read.is_some() {
                return Err(NetError::ContentLengthMismatch);
            }
            return Ok(0);
        }

        self.bytes_read += n as u64;
        Ok(n)
    }

    async fn skip_internal(&mut self) -> Result<(), NetError> {
        if self.bytes_skipped == self.bytes_to_skip {
            return Ok(());
        }

        let mut scratch = [0u8; SKIP_BUFFER_SIZE];
        while self.bytes_skipped < self.bytes_to_skip {
            let remaining = self.bytes_to_skip - self.bytes_skipped;
            let len = scratch
                .len()
                .min(usize::try_from(remaining).unwrap_or(usize::MAX));
            let n = self
                .inner
                .read(&mut scratch[..len])
                .await
                .transfer_context()?;
            if n == 0 {
                return Err(NetError::ContentLengthMismatch);
            }
            self.bytes_skipped += n as u64;
        }
        Ok(())
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Bytes still expected; `None` when the length is unknown.
    pub fn bytes_remaining(&self) -> Option<u64> {
        self.bytes_to_read.map(|to_read| to_read - self.bytes_read)
    }

    /// Read everything that is left.
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>, NetError> {
        let mut out = Vec::new();
        let mut chunk = [0u8; SKIP_BUFFER_SIZE];
        loop {
            let n = self.read(&mut chunk).await?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&chunk[..n]);
        }
    }
}
