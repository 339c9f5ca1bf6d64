//! Data source API.
//!
//! - [`HttpDataSourceFactory`](context::HttpDataSourceFactory): shared
//!   transport, default headers and configuration
//! - [`HttpDataSource`](request::HttpDataSource): open / read / close
//! - [`HttpFetchJob`](job::HttpFetchJob): state of one fetch

pub mod context;
pub mod job;
pub mod request;

pub use context::{HttpDataSourceConfig, HttpDataSourceFactory};
pub use request::HttpDataSource;
