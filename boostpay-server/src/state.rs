//! Application state shared across all request handlers.

use crate::config::runtime::EmailSettings;
use crate::mailer::ResendMailer;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub email: Arc<EmailSettings>,
    /// `None` when no API key is configured.
    pub mailer: Option<Arc<ResendMailer>>,
}

impl AppState {
    pub fn new(email: EmailSettings) -> Self {
        let mailer = email
            .api_key
            .clone()
            .map(|key| Arc::new(ResendMailer::new(email.api_base.clone(), key)));
        Self {
            email: Arc::new(email),
            mailer,
        }
    }
}
