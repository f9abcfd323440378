//! Transactional email delivery over the Resend HTTP API.

use kanau::processor::Processor;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors that can occur while handing an email to the provider.
#[derive(Debug, Error)]
pub enum MailError {
    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid email api url: {0}")]
    Url(#[from] url::ParseError),

    /// The provider answered with a non-2xx status.
    #[error("email provider rejected the message with status {status}")]
    Rejected {
        status: u16,
        details: serde_json::Value,
    },
}

/// Request body of `POST /emails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// The provider's acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SentEmail {
    pub id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResendMailer {
    http: reqwest::Client,
    api_base: Url,
    api_key: String,
}

impl ResendMailer {
    /// A path prefix on `api_base` is kept, with or without a trailing slash.
    pub fn new(mut api_base: Url, api_key: String) -> Self {
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_base,
            api_key,
        }
    }

    fn endpoint(&self) -> Result<Url, url::ParseError> {
        self.api_base.join("emails")
    }
}

impl Processor<OutgoingEmail> for ResendMailer {
    type Output = SentEmail;
    type Error = MailError;

    #[tracing::instrument(skip_all, err, name = "Mail:OutgoingEmail")]
    async fn process(&self, email: OutgoingEmail) -> Result<SentEmail, MailError> {
        let url = self.endpoint()?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let body: serde_json::Value =
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), details = %body, "Email provider error");
            return Err(MailError::Rejected {
                status: status.as_u16(),
                details: body,
            });
        }

        let sent: SentEmail = serde_json::from_value(body).unwrap_or_default();
        tracing::info!(email_id = ?sent.id, "Email accepted by provider");
        Ok(sent)
    }
}
