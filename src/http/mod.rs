//! HTTP layer: header layers, request description, connection capability,
//! redirect-following opener, response validation and payload reading.

pub mod connection;
pub mod dataspec;
pub mod error;
pub mod opener;
pub mod requestbody;
pub mod requestproperties;
pub mod resolver;
pub mod response;
pub mod responsebody;
pub mod streamfactory;
pub mod validator;

// Re-exports for convenience
pub use connection::{ConnectionGuard, ConnectionRequest, Connector, HttpConnection};
pub use dataspec::{DataSpec, DataSpecBuilder, HttpMethod};
pub use error::{HttpDataSourceError, InvalidResponseCode, OperationType, RedirectViolation};
pub use requestbody::RequestBody;
pub use requestproperties::{RequestProperties, SharedRequestProperties};
pub use resolver::{resolve, MergedHeaders};
pub use response::ResponseInfo;
pub use responsebody::ResponseBody;
pub use streamfactory::HttpStreamFactory;
