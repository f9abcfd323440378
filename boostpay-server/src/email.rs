//! Operator email rendering.

use boostpay_sdk::objects::NotifyRequest;
use time::OffsetDateTime;
use time::macros::format_description;

/// A rendered notification, ready to be handed to the mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorEmail {
    pub subject: String,
    pub html: String,
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_timestamp(at: OffsetDateTime) -> String {
    let format = format_description!(
        "[weekday], [month repr:long] [day padding:none], [year] at [hour repr:12 padding:none]:[minute]:[second] [period] UTC"
    );
    at.to_offset(time::UtcOffset::UTC)
        .format(&format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

fn detail_row(label: &str, value: &str) -> String {
    format!(
        r#"<div class="detail-row"><div class="label">{label}</div><div class="value">{value}</div></div>"#
    )
}

const STYLE: &str = "body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
.container { max-width: 600px; margin: 0 auto; padding: 20px; }
.header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; border-radius: 10px 10px 0 0; }
.content { background: #f9fafb; padding: 30px; border-radius: 0 0 10px 10px; }
.detail-row { margin: 15px 0; padding: 15px; background: white; border-radius: 8px; border-left: 4px solid #667eea; }
.label { font-weight: bold; color: #667eea; margin-bottom: 5px; }
.value { color: #333; word-break: break-all; }
.highlight { background: #667eea; color: white; padding: 15px; border-radius: 8px; text-align: center; margin: 20px 0; }
.next-steps { margin-top: 30px; padding: 20px; background: #fff3cd; border-radius: 8px; border-left: 4px solid #ffc107; color: #856404; }
.footer { text-align: center; margin-top: 20px; color: #666; font-size: 12px; }";

/// Render the notification sent to the operator for a new order.
pub fn render_order_email(order: &NotifyRequest, at: OffsetDateTime) -> OperatorEmail {
    let subject = format!("New Order: {} - ${} USDC", order.service, order.price);

    let service = escape_html(&order.service);
    let email = escape_html(&order.customer_email);
    let telegram = order
        .telegram
        .as_deref()
        .map(|t| t.trim().trim_start_matches('@'))
        .filter(|t| !t.is_empty())
        .map(escape_html);
    let tx_hash = escape_html(&order.tx_hash);
    let tx_url = escape_html(&order.network.explorer_tx_url(&order.tx_hash));

    let mut rows = vec![
        detail_row("Service", &service),
        detail_row("Network", order.network.label()),
        detail_row("Customer Email", &email),
    ];
    if let Some(handle) = &telegram {
        rows.push(detail_row("Telegram", &format!("@{handle}")));
    }
    rows.push(detail_row(
        "Customer Wallet",
        &format!(
            r#"<span style="font-family: monospace; font-size: 12px;">{}</span>"#,
            escape_html(&order.wallet_address)
        ),
    ));
    rows.push(detail_row(
        "Transaction Hash",
        &format!(r#"<a href="{tx_url}" class="tx-link" target="_blank">{tx_hash}</a>"#),
    ));
    rows.push(detail_row("Time", &format_timestamp(at)));

    let contact = match &telegram {
        Some(handle) => format!("{email} or @{handle} on Telegram"),
        None => email.clone(),
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><style>{STYLE}</style></head>
<body>
<div class="container">
<div class="header">
<h1 style="margin: 0;">New Payment Received!</h1>
<p style="margin: 10px 0 0 0; opacity: 0.9;">Order Notification</p>
</div>
<div class="content">
<div class="highlight">
<h2 style="margin: 0; font-size: 32px;">${price} USDC</h2>
<p style="margin: 5px 0 0 0;">Payment Submitted</p>
</div>
{rows}
<div class="next-steps">
<strong>Next Steps:</strong><br>
1. Verify the transaction on the blockchain explorer<br>
2. Contact the customer at {contact}<br>
3. Schedule the service delivery
</div>
</div>
<div class="footer">
<p>This is an automated order notification</p>
<p>Transaction processed on {testnet}</p>
</div>
</div>
</body>
</html>"#,
        price = order.price,
        rows = rows.join("\n"),
        testnet = order.network.testnet_name(),
    );

    OperatorEmail { subject, html }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boostpay_sdk::objects::Network;
    use rust_decimal::Decimal;
    use time::macros::datetime;

    fn order() -> NotifyRequest {
        NotifyRequest {
            service: "Premium Amplified Post".to_string(),
            price: Decimal::from(800),
            network: Network::SolanaDevnet,
            tx_hash: "5xSig".to_string(),
            customer_email: "a@b.com".to_string(),
            telegram: Some("@alice".to_string()),
            wallet_address: "Payer111".to_string(),
        }
    }

    #[test]
    fn test_subject_and_details() {
        let email = render_order_email(&order(), datetime!(2026-03-05 14:07:09 UTC));
        assert_eq!(email.subject, "New Order: Premium Amplified Post - $800 USDC");
        assert!(email.html.contains("Solana (Devnet)"));
        assert!(email.html.contains("https://explorer.solana.com/tx/5xSig?cluster=devnet"));
        assert!(email.html.contains("a@b.com or @alice on Telegram"));
        assert!(email.html.contains("Payer111"));
        assert!(email.html.contains("Thursday, March 5, 2026 at 2:07:09 PM UTC"));
        assert!(email.html.contains("Solana Devnet"));
    }

    #[test]
    fn test_user_values_are_escaped() {
        let mut order = order();
        order.network = Network::EthereumSepolia;
        order.customer_email = "<script>alert(1)</script>@x.io".to_string();
        order.telegram = None;
        let email = render_order_email(&order, datetime!(2026-03-05 14:07:09 UTC));

        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(!email.html.contains("Telegram"));
        assert!(email.html.contains("https://sepolia.etherscan.io/tx/5xSig"));
        assert!(email.html.contains("Ethereum (Sepolia)"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"a&b "c" 'd'"#), "a&amp;b &quot;c&quot; &#39;d&#39;");
    }
}
