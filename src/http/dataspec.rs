//! Request descriptor for one fetch.

use crate::http::requestbody::RequestBody;
use crate::http::requestproperties::RequestProperties;
use std::fmt;
use url::Url;

/// Allow the server to gzip the response (`Accept-Encoding: gzip`).
pub const FLAG_ALLOW_GZIP: u32 = 1;
/// Opaque to this crate; passed through for caching layers.
pub const FLAG_DONT_CACHE_IF_LENGTH_UNKNOWN: u32 = 1 << 1;
/// Opaque to this crate; passed through for caching layers.
pub const FLAG_ALLOW_CACHE_FRAGMENTATION: u32 = 1 << 2;
/// Opaque to this crate; passed through for bandwidth estimation.
pub const FLAG_MIGHT_NOT_USE_FULL_NETWORK_SPEED: u32 = 1 << 3;

/// Methods a data source may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Head => http::Method::HEAD,
        }
    }
}

/// Immutable description of one fetch.
///
/// Construct with [`DataSpec::new`] or [`DataSpec::builder`]; derive
/// variations with [`build_upon`](Self::build_upon), [`subrange`](Self::subrange)
/// and friends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSpec {
    uri: Url,
    method: HttpMethod,
    body: RequestBody,
    http_request_headers: RequestProperties,
    position: u64,
    length: Option<u64>,
    key: Option<String>,
    flags: u32,
}

impl DataSpec {
    /// A GET of the whole resource.
    pub fn new(uri: Url) -> Self {
        Self::builder(uri).build()
    }

    pub fn builder(uri: Url) -> DataSpecBuilder {
        DataSpecBuilder {
            uri,
            method: HttpMethod::Get,
            body: RequestBody::Absent,
            http_request_headers: RequestProperties::new(),
            position: 0,
            length: None,
            key: None,
            flags: 0,
        }
    }

    /// A builder pre-populated with this spec's fields.
    pub fn build_upon(&self) -> DataSpecBuilder {
        DataSpecBuilder {
            uri: self.uri.clone(),
            method: self.method,
            body: self.body.clone(),
            http_request_headers: self.http_request_headers.clone(),
            position: self.position,
            length: self.length,
            key: self.key.clone(),
            flags: self.flags,
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn http_request_headers(&self) -> &RequestProperties {
        &self.http_request_headers
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Requested length; `None` means "to the end of the resource".
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn is_flag_set(&self, flag: u32) -> bool {
        self.flags & flag == flag
    }

    /// The part of this spec starting `offset` bytes in.
    ///
    /// The remaining length shrinks accordingly when known.
    pub fn subrange(&self, offset: u64) -> DataSpec {
        let length = self.length.map(|len| len.saturating_sub(offset));
        self.subrange_with_length(offset, length)
    }

    pub fn subrange_with_length(&self, offset: u64, length: Option<u64>) -> DataSpec {
        if offset == 0 && self.length == length {
            return self.clone();
        }
        self.build_upon()
            .position(self.position.saturating_add(offset))
            .length(length)
            .build()
    }

    pub fn with_uri(&self, uri: Url) -> DataSpec {
        self.build_upon().uri(uri).build()
    }

    /// A copy whose per-request headers are `additional` overlaid on the
    /// existing ones.
    pub fn with_additional_headers(&self, additional: &RequestProperties) -> DataSpec {
        let mut headers = self.http_request_headers.clone();
        headers.merge(additional);
        self.build_upon().http_request_headers(headers).build()
    }

    /// Value for the `Range` request header, if one is needed.
    pub fn range_header(&self) -> Option<String> {
        match (self.position, self.length) {
            (0, None) => None,
            (position, None) => Some(format!("bytes={}-", position)),
            (position, Some(length)) => {
                let last = position.saturating_add(length).saturating_sub(1);
                Some(format!("bytes={}-{}", position, last))
            }
        }
    }
}

impl fmt::Display for DataSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataSpec[{} {}, {}, ", self.method, self.uri, self.position)?;
        match self.length {
            Some(length) => write!(f, "{}", length)?,
            None => f.write_str("unset")?,
        }
        write!(f, ", {:?}, {}]", self.key, self.flags)
    }
}

/// Builder for [`DataSpec`].
#[derive(Debug, Clone)]
pub struct DataSpecBuilder {
    uri: Url,
    method: HttpMethod,
    body: RequestBody,
    http_request_headers: RequestProperties,
    position: u64,
    length: Option<u64>,
    key: Option<String>,
    flags: u32,
}

impl DataSpecBuilder {
    pub fn uri(mut self, uri: Url) -> Self {
        self.uri = uri;
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    pub fn http_request_headers(mut self, headers: RequestProperties) -> Self {
        self.http_request_headers = headers;
        self
    }

    pub fn position(mut self, position: u64) -> Self {
        self.position = position;
        self
    }

    pub fn length(mut self, length: Option<u64>) -> Self {
        self.length = length;
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn build(self) -> DataSpec {
        DataSpec {
            uri: self.uri,
            method: self.method,
            body: self.body,
            http_request_headers: self.http_request_headers,
            position: self.position,
            length: self.length,
            key: self.key,
            flags: self.flags,
        }
    }
}
