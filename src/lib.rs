//! # rangenet
//!
//! An HTTP data source for streaming byte ranges of remote resources.
//!
//! A fetch is described by a [`DataSpec`](http::DataSpec): URL, method,
//! optional body, byte range and per-request headers. The data source
//! merges its three header layers, opens the exchange (following redirects
//! under a configurable policy), validates the response and then streams
//! the payload.
//!
//! ## Header layers
//!
//! For every header key the value comes from the highest layer defining it:
//!
//! 1. per-request headers on the `DataSpec`
//! 2. request properties set on the `HttpDataSource`
//! 3. default request properties shared by a factory's data sources
//!
//! Keys are compared exactly; no case folding is applied.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rangenet::http::DataSpec;
//! use rangenet::urlrequest::HttpDataSourceFactory;
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = HttpDataSourceFactory::default();
//!     factory.set_default_request_property("Accept", "*/*");
//!
//!     let mut source = factory.create_data_source();
//!     let spec = DataSpec::builder(Url::parse("https://example.com/video.mp4")?)
//!         .position(1024)
//!         .length(Some(4096))
//!         .build();
//!
//!     source.open(spec).await?;
//!     let mut buf = [0u8; 8192];
//!     while source.read(&mut buf).await? > 0 {}
//!     source.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error codes, io error mapping and fetch state
//! - [`http`] - Header layers, connections, validation and payload reading
//! - [`socket`] - DNS, TCP and TLS for the shipped transport
//! - [`urlrequest`] - Data source and factory API

pub mod base;
pub mod http;
pub mod socket;
pub mod urlrequest;

pub use base::neterror::NetError;
pub use crate::http::{DataSpec, HttpDataSourceError};
pub use urlrequest::{HttpDataSource, HttpDataSourceConfig, HttpDataSourceFactory};
