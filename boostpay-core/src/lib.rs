#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod catalog;
pub mod chain_selector;
pub mod checkout;
pub mod config;
pub mod confirmation;
pub mod events;
pub mod notify;
pub mod payment;
pub mod wallet;

pub use boostpay_sdk::objects::Network;
