//! Response validation.
//!
//! Runs once the exchange has been executed. A 2xx response yields a
//! [`ResponseInfo`] and leaves the payload untouched; anything else is turned
//! into an [`InvalidResponseCode`] carrying a bounded copy of the error body.

use crate::base::neterror::NetError;
use crate::http::connection::{HttpConnection, PayloadStream};
use crate::http::dataspec::DataSpec;
use crate::http::error::{HttpDataSourceError, InvalidResponseCode, OperationType};
use crate::http::response::{self, ResponseInfo};
use bytes::Bytes;
use http::header::CONTENT_RANGE;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Cap on captured error bodies.
pub const DEFAULT_MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Vetoes responses by `Content-Type`. Return `false` to reject.
pub type ContentTypePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Read at most `limit` bytes from `reader`.
///
/// Bytes beyond the cap are never pulled from the stream. An I/O failure
/// keeps whatever had been read before it.
pub async fn read_bounded(reader: PayloadStream, limit: usize) -> Bytes {
    let mut captured = Vec::new();
    let mut limited = reader.take(limit as u64);
    if let Err(e) = limited.read_to_end(&mut captured).await {
        tracing::debug!(error = %e, captured = captured.len(), "error body capture interrupted");
    }
    Bytes::from(captured)
}

/// Inspect an executed connection.
pub async fn validate(
    connection: &mut dyn HttpConnection,
    data_spec: &DataSpec,
    max_error_body_bytes: usize,
    content_type_predicate: Option<&ContentTypePredicate>,
) -> Result<ResponseInfo, HttpDataSourceError> {
    let url = connection.url().clone();
    let code = connection.response_code().ok_or_else(|| {
        HttpDataSourceError::transport(OperationType::Open, &url, NetError::InvalidHttpResponse)
    })?;
    let message = connection.response_message().to_string();
    let headers = connection.response_headers().clone();

    if !(200..300).contains(&code) {
        // Asking for a range that starts exactly at the end of the resource.
        if code == 416 {
            let document_size =
                response::document_size(response::header_str(&headers, CONTENT_RANGE.as_str()));
            if document_size == Some(data_spec.position()) {
                tracing::debug!(url = %url, "range starts at end of resource");
                return Ok(ResponseInfo {
                    code,
                    message,
                    headers,
                    content_length: Some(0),
                    bytes_to_skip: 0,
                    bytes_to_read: Some(0),
                });
            }
        }

        let body = match connection.take_error_stream() {
            Some(stream) => read_bounded(stream, max_error_body_bytes).await,
            None => Bytes::new(),
        };
        tracing::debug!(url = %url, code, body_len = body.len(), "invalid response code");
        return Err(InvalidResponseCode {
            code,
            message,
            headers,
            body,
            data_spec: data_spec.clone(),
        }
        .into());
    }

    if let Some(predicate) = content_type_predicate {
        let content_type = response::header_str(&headers, http::header::CONTENT_TYPE.as_str())
            .unwrap_or_default();
        if !predicate(content_type) {
            return Err(HttpDataSourceError::InvalidContentType {
                content_type: content_type.to_string(),
                url,
            });
        }
    }

    // A 200 to a request with a non-zero position means the server ignored
    // the Range header and is sending the whole resource.
    let bytes_to_skip = if code == 200 && data_spec.position() != 0 {
        data_spec.position()
    } else {
        0
    };

    let content_length = response::content_length_of(&headers);
    let bytes_to_read = if response::is_gzip_encoded(&headers) {
        // Header lengths describe the compressed entity.
        data_spec.length()
    } else {
        data_spec
            .length()
            .or_else(|| content_length.map(|len| len.saturating_sub(bytes_to_skip)))
    };

    Ok(ResponseInfo {
        code,
        message,
        headers,
        content_length,
        bytes_to_skip,
        bytes_to_read,
    })
}
