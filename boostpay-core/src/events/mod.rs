//! Event system of a checkout session.
//!
//! A session is driven by two streams:
//!
//! 1. `CheckoutCommand`s issued by the presentation layer (user actions)
//! 2. `CheckoutEvent`s produced by background tasks the session spawned
//!    (receipt watcher, delayed success transition)
//!
//! Events carry the transaction id they belong to so that the session can
//! drop events of an attempt that has since been reset.

pub mod channels;
pub mod types;

pub use channels::{
    CheckoutCommandReceiver, CheckoutCommandSender, CheckoutEventReceiver, CheckoutEventSender,
    DEFAULT_CHANNEL_BUFFER, checkout_command_channel, checkout_event_channel,
};

pub use types::{CheckoutCommand, CheckoutEvent, ReceiptOutcome};
