//! Socket connection for the shipped transport.
//!
//! - [`connectjob`]: DNS → TCP → TLS connection flow
//! - [`stream`]: connected plain or TLS socket
//! - [`tls`]: TLS configuration with BoringSSL

pub mod connectjob;
pub mod stream;
pub mod tls;
