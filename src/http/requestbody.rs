//! Request body carried by a `DataSpec`.

use bytes::Bytes;

/// Request body for a fetch.
///
/// `Absent` means no output stream is opened at all. `Bytes` is written with
/// a fixed `Content-Length`, even when it holds zero bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Absent,
    Bytes(Bytes),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<&[u8]> for RequestBody {
    fn from(v: &[u8]) -> Self {
        RequestBody::Bytes(Bytes::copy_from_slice(v))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

impl From<Option<Bytes>> for RequestBody {
    fn from(b: Option<Bytes>) -> Self {
        b.map_or(RequestBody::Absent, RequestBody::Bytes)
    }
}

impl RequestBody {
    pub fn is_absent(&self) -> bool {
        matches!(self, RequestBody::Absent)
    }

    /// Length in bytes; `None` when absent.
    pub fn len(&self) -> Option<u64> {
        match self {
            RequestBody::Absent => None,
            RequestBody::Bytes(b) => Some(b.len() as u64),
        }
    }

    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            RequestBody::Absent => None,
            RequestBody::Bytes(b) => Some(b),
        }
    }
}
