pub mod network;
pub mod notify;

pub use network::Network;
pub use notify::{NotifyErrorBody, NotifyRequest, NotifyResponse};
