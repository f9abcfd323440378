use reqwest::Client;
use url::Url;

use super::ClientError;
use crate::objects::notify::{NotifyRequest, NotifyResponse};

/// Typed HTTP client for `POST /api/notify`.
#[derive(Debug, Clone)]
pub struct NotifyClient {
    http: Client,
    base_url: Url,
}

impl NotifyClient {
    /// Create a new `NotifyClient` rooted at the site serving the endpoint.
    ///
    /// A path prefix on `base_url` is kept, with or without a trailing slash.
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self) -> Result<Url, url::ParseError> {
        self.base_url.join("api/notify")
    }

    /// `POST /api/notify` – ask the server to email the operator about a
    /// submitted payment.
    pub async fn notify(&self, payload: &NotifyRequest) -> Result<NotifyResponse, ClientError> {
        let url = self.endpoint()?;
        let resp = self.http.post(url).json(payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(ClientError::Json)
    }
}
