//! Event channel factories and handles.

use super::types::{CheckoutCommand, CheckoutEvent};
use tokio::sync::mpsc;

/// Default buffer size for event channels.
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;

/// Sender handle for CheckoutEvent events.
pub type CheckoutEventSender = mpsc::Sender<CheckoutEvent>;
/// Receiver handle for CheckoutEvent events.
pub type CheckoutEventReceiver = mpsc::Receiver<CheckoutEvent>;

/// Sender handle for CheckoutCommand messages.
pub type CheckoutCommandSender = mpsc::Sender<CheckoutCommand>;
/// Receiver handle for CheckoutCommand messages.
pub type CheckoutCommandReceiver = mpsc::Receiver<CheckoutCommand>;

/// Create a new CheckoutEvent channel.
///
/// The session keeps the receiver and hands clones of the sender to the
/// tasks it spawns.
pub fn checkout_event_channel() -> (CheckoutEventSender, CheckoutEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new CheckoutCommand channel.
pub fn checkout_command_channel() -> (CheckoutCommandSender, CheckoutCommandReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
