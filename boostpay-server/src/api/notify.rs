//! `POST /api/notify` - email the operator about a submitted payment.

use axum::extract::rejection::JsonRejection;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use boostpay_sdk::objects::{Network, NotifyErrorBody, NotifyRequest, NotifyResponse};
use kanau::processor::Processor;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::email::render_order_email;
use crate::mailer::{MailError, OutgoingEmail};
use crate::state::AppState;

/// The request as sent, before required fields are checked.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct IncomingNotify {
    #[serde(default)]
    service: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    price: Option<Decimal>,
    #[serde(default)]
    network: Option<String>,
    #[serde(default)]
    tx_hash: Option<String>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    telegram: Option<String>,
    #[serde(default)]
    wallet_address: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl IncomingNotify {
    /// `None` when `service`, `price`, `network`, `txHash` or
    /// `customerEmail` is missing, empty or zero.
    fn into_request(self) -> Option<NotifyRequest> {
        let network = match present(self.network)?.as_str() {
            "eth" => Network::EthereumSepolia,
            "sol" => Network::SolanaDevnet,
            _ => return None,
        };
        Some(NotifyRequest {
            service: present(self.service)?,
            price: self.price.filter(|p| !p.is_zero())?,
            network,
            tx_hash: present(self.tx_hash)?,
            customer_email: present(self.customer_email)?,
            telegram: present(self.telegram),
            wallet_address: self.wallet_address.unwrap_or_default(),
        })
    }
}

pub(super) async fn notify(
    State(state): State<AppState>,
    payload: Result<Json<IncomingNotify>, JsonRejection>,
) -> Result<Json<NotifyResponse>, NotifyApiError> {
    let Json(payload) = payload.map_err(|e| NotifyApiError::BadBody(e.body_text()))?;
    let order = payload
        .into_request()
        .ok_or(NotifyApiError::MissingFields)?;
    let mailer = state.mailer.as_ref().ok_or(NotifyApiError::NotConfigured)?;

    let rendered = render_order_email(&order, time::OffsetDateTime::now_utc());
    let sent = mailer
        .process(OutgoingEmail {
            from: state.email.from.clone(),
            to: vec![state.email.operator.clone()],
            subject: rendered.subject,
            html: rendered.html,
        })
        .await?;

    tracing::info!(
        tx_hash = %order.tx_hash,
        network = %order.network,
        email_id = ?sent.id,
        "Order notification emailed"
    );
    Ok(Json(NotifyResponse {
        success: true,
        message: "Email sent successfully".to_string(),
        email_id: sent.id,
    }))
}

/// Errors that can occur in the notify handler.
#[derive(Debug)]
pub(super) enum NotifyApiError {
    /// A required field is missing, empty or zero.
    MissingFields,
    /// No email API key configured.
    NotConfigured,
    /// The body is not valid JSON.
    BadBody(String),
    Mail(MailError),
}

impl From<MailError> for NotifyApiError {
    fn from(e: MailError) -> Self {
        NotifyApiError::Mail(e)
    }
}

impl IntoResponse for NotifyApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            NotifyApiError::MissingFields => (
                StatusCode::BAD_REQUEST,
                Json(NotifyErrorBody::new("Missing required fields")),
            )
                .into_response(),
            NotifyApiError::NotConfigured => {
                tracing::error!("RESEND_API_KEY not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(NotifyErrorBody::new("Email service not configured")),
                )
                    .into_response()
            }
            NotifyApiError::Mail(MailError::Rejected { status, details }) => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                let body = NotifyErrorBody {
                    details: Some(details),
                    ..NotifyErrorBody::new("Failed to send email")
                };
                (status, Json(body)).into_response()
            }
            NotifyApiError::Mail(e) => internal_error(e.to_string()),
            NotifyApiError::BadBody(message) => internal_error(message),
        }
    }
}

fn internal_error(message: String) -> axum::response::Response {
    tracing::error!(error = %message, "Email notification error");
    let body = NotifyErrorBody {
        message: Some(message),
        ..NotifyErrorBody::new("Internal server error")
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
