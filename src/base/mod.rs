//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): transport error codes (Chromium numbering)
//! - [`FetchState`](loadstate::FetchState): per-fetch state machine
//! - [`IoResultExt`](context::IoResultExt): io error → `NetError` mapping

pub mod context;
pub mod loadstate;
pub mod neterror;

#[cfg(test)]
mod tests;
