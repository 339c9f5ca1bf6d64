//! Response metadata and length header parsing.

use http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};
use http::HeaderMap;

/// What a successful validation learned about the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInfo {
    pub code: u16,
    pub message: String,
    pub headers: HeaderMap,
    /// Length of the returned entity, from `Content-Length`/`Content-Range`.
    pub content_length: Option<u64>,
    /// Leading payload bytes to discard (server ignored our Range).
    pub bytes_to_skip: u64,
    /// Payload bytes the caller will receive; `None` when unknown.
    pub bytes_to_read: Option<u64>,
}

impl ResponseInfo {
    pub fn content_type(&self) -> Option<&str> {
        header_str(&self.headers, CONTENT_TYPE.as_str())
    }

    pub fn is_gzip(&self) -> bool {
        is_gzip_encoded(&self.headers)
    }
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub(crate) fn is_gzip_encoded(headers: &HeaderMap) -> bool {
    header_str(headers, CONTENT_ENCODING.as_str())
        .map(|v| v.trim().eq_ignore_ascii_case("gzip"))
        .unwrap_or(false)
}

/// Entity length from a response's headers.
pub fn content_length_of(headers: &HeaderMap) -> Option<u64> {
    content_length(
        header_str(headers, CONTENT_LENGTH.as_str()),
        header_str(headers, CONTENT_RANGE.as_str()),
    )
}

/// Entity length from `Content-Length` and `Content-Range` values.
///
/// When both are present and disagree the larger one wins: some servers
/// send a truncated `Content-Length` for ranged responses.
pub fn content_length(content_length: Option<&str>, content_range: Option<&str>) -> Option<u64> {
    let from_length = content_length.and_then(|value| match value.trim().parse::<u64>() {
        Ok(len) => Some(len),
        Err(_) => {
            tracing::error!(value = %value, "unexpected Content-Length");
            None
        }
    });

    let from_range = content_range
        .and_then(parse_byte_range)
        .map(|(first, last)| last - first + 1);

    match (from_length, from_range) {
        (Some(len), Some(range_len)) if len != range_len => {
            tracing::warn!(
                content_length = len,
                content_range = ?content_range,
                "inconsistent headers"
            );
            Some(len.max(range_len))
        }
        (Some(len), _) => Some(len),
        (None, range_len) => range_len,
    }
}

/// Total resource size from `Content-Range` (`bytes a-b/N` or `bytes */N`).
pub fn document_size(content_range: Option<&str>) -> Option<u64> {
    let (_, total) = content_range?.trim().strip_prefix("bytes ")?.split_once('/')?;
    total.trim().parse().ok()
}

/// `(first, last)` of `bytes first-last/total`.
fn parse_byte_range(value: &str) -> Option<(u64, u64)> {
    let (range, total) = value.trim().strip_prefix("bytes ")?.split_once('/')?;
    if total != "*" && total.parse::<u64>().is_err() {
        return None;
    }
    let (first, last) = range.split_once('-')?;
    let first = first.parse::<u64>().ok()?;
    let last = last.parse::<u64>().ok()?;
    (last >= first).then_some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_length_only() {
        assert_eq!(content_length(Some("128"), None), Some(128));
        assert_eq!(content_length(Some(" 5 "), None), Some(5));
        assert_eq!(content_length(None, None), None);
        assert_eq!(content_length(Some("abc"), None), None);
    }

    #[test]
    fn test_content_range_only() {
        assert_eq!(content_length(None, Some("bytes 100-199/1000")), Some(100));
        assert_eq!(content_length(None, Some("bytes 0-0/*")), Some(1));
        assert_eq!(content_length(None, Some("bytes */1000")), None);
        assert_eq!(content_length(None, Some("bytes 9-3/10")), None);
    }

    #[test]
    fn test_inconsistent_takes_max() {
        assert_eq!(
            content_length(Some("50"), Some("bytes 100-199/1000")),
            Some(100)
        );
        assert_eq!(
            content_length(Some("150"), Some("bytes 100-199/1000")),
            Some(150)
        );
    }

    #[test]
    fn test_document_size() {
        assert_eq!(document_size(Some("bytes */1000")), Some(1000));
        assert_eq!(document_size(Some("bytes 0-9/42")), Some(42));
        assert_eq!(document_size(Some("bytes 0-9/*")), None);
        assert_eq!(document_size(Some("items 0-9/42")), None);
        assert_eq!(document_size(None), None);
    }

    #[test]
    fn test_gzip_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_gzip_encoded(&headers));
        headers.insert(CONTENT_ENCODING, "GZIP".parse().unwrap());
        assert!(is_gzip_encoded(&headers));
    }

    #[test]
    fn test_content_length_of_header_map() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, "10".parse().unwrap());
        headers.insert(CONTENT_RANGE, "bytes 0-9/10".parse().unwrap());
        assert_eq!(content_length_of(&headers), Some(10));
    }
}
