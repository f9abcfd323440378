//! TOML file configuration structures.
//!
//! These structs directly map to the `boostpay-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:3000").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000))
}

/// Email delivery section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Sender, e.g. `Acme <onboarding@resend.dev>`.
    #[serde(default = "default_from")]
    pub from: String,
    /// Recipient of order notifications.
    #[serde(default = "default_operator")]
    pub operator: String,
    /// Base URL of the transactional email API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from: default_from(),
            operator: default_operator(),
            api_base: default_api_base(),
        }
    }
}

fn default_from() -> String {
    "Acme <onboarding@resend.dev>".to_string()
}

fn default_operator() -> String {
    "nick@example.com".to_string()
}

fn default_api_base() -> String {
    "https://api.resend.com".to_string()
}
