//! Runtime configuration structures.
//!
//! These are the processed configuration values the handlers work with,
//! after overrides, secrets and validation have been applied.

use std::net::SocketAddr;
use url::Url;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Everything needed to email the operator.
#[derive(Clone)]
pub struct EmailSettings {
    pub from: String,
    pub operator: String,
    pub api_base: Url,
    /// `None` when `RESEND_API_KEY` is unset; requests are then refused.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSettings")
            .field("from", &self.from)
            .field("operator", &self.operator)
            .field("api_base", &self.api_base.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
