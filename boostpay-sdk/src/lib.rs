//! Shared types for the Boostpay checkout.
//!
//! The `objects` module carries the wire format of the order notification
//! endpoint. The `client` module (behind the `client` feature) provides a
//! typed HTTP client for it.

#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
