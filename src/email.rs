use async_trait::async_trait;
use base64::Engine;
use chrono::{Datelike, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::EmailConfig;
use crate::models::InvoiceRecord;
use crate::store::safe_file_stem;
use crate::words::format_amount;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("delivery rejected: status={status} body={body}")]
    Delivery { status: u16, body: String },
    #[error("Other: {0}")]
    Other(String),
}

/// An invoice ready to go out, PDF attached.
#[derive(Debug, Clone)]
pub struct InvoiceEmail<'a> {
    pub invoice_number: &'a str,
    pub record: &'a InvoiceRecord,
    pub download_url: &'a str,
    pub attachment: &'a [u8],
}

impl InvoiceEmail<'_> {
    pub fn subject(&self) -> String {
        format!("Invoice {} from Steel Wheel Auto Ltd.", self.invoice_number)
    }

    pub fn attachment_name(&self) -> String {
        format!("{}.pdf", safe_file_stem(self.invoice_number))
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send to the customer and the company; returns the delivery id.
    async fn send_invoice(&self, email: &InvoiceEmail<'_>) -> Result<String, EmailError>;
}

/// Client for a Resend-compatible `POST /emails` API.
pub struct EmailClient {
    client: Client,
    config: EmailConfig,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

impl EmailClient {
    pub fn new(config: EmailConfig) -> Self {
        Self { client: Client::new(), config }
    }

    fn recipients(&self, record: &InvoiceRecord) -> Vec<String> {
        let mut to: Vec<String> = record
            .customer_email
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        to.push(self.config.company.clone());
        to
    }
}

#[async_trait]
impl Mailer for EmailClient {
    async fn send_invoice(&self, email: &InvoiceEmail<'_>) -> Result<String, EmailError> {
        let subject = email.subject();
        let to = self.recipients(email.record);

        let Some(api_key) = self.config.resend_api_key.as_deref() else {
            info!(?to, %subject, attachment_bytes = email.attachment.len(), "demo mode, email not sent");
            return Ok(format!("demo-{}", Uuid::new_v4()));
        };

        let body = json!({
            "from": self.config.from,
            "to": to,
            "subject": subject,
            "html": invoice_html(email),
            "attachments": [{
                "filename": email.attachment_name(),
                "content": base64::engine::general_purpose::STANDARD.encode(email.attachment),
            }],
        });

        let url = format!("{}/emails", self.config.api_base.trim_end_matches('/'));
        info!(%url, ?to, %subject, attachment_bytes = email.attachment.len(), "sending invoice email");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::Http(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| EmailError::Http(e.to_string()))?;
        if !status.is_success() {
            error!(%status, body = %text, "email API rejected the message");
            return Err(EmailError::Delivery { status: status.as_u16(), body: text });
        }

        let parsed: SendResponse =
            serde_json::from_str(&text).map_err(|e| EmailError::Other(format!("parse error: {}: {}", e, text)))?;
        info!(email_id = %parsed.id, "invoice email accepted");
        Ok(parsed.id)
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn row(label: &str, value: &str) -> String {
    format!(
        r#"<tr><td style="padding: 8px; border-bottom: 1px solid #eee;"><strong>{label}:</strong></td><td style="padding: 8px; border-bottom: 1px solid #eee;">{}</td></tr>"#,
        escape(value)
    )
}

pub fn invoice_html(email: &InvoiceEmail<'_>) -> String {
    let r = email.record;
    let field = |v: &Option<String>| v.clone().unwrap_or_default();
    let amount = r.invoice_amount.map(format_amount).unwrap_or_default();
    let rows = [
        row("Invoice No", email.invoice_number),
        row("Vehicle", &r.vehicle_description()),
        row("Chassis No", &field(&r.chassis_no)),
        row("Engine No", &field(&r.engine_no)),
        row("Amount", &format!("JMD ${amount}")),
    ]
    .concat();

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #eee;">
  <div style="text-align: center; margin-bottom: 20px;">
    <h2 style="color: #333;">Steel Wheel Auto Limited</h2>
    <p style="color: #777;">Invoice Confirmation</p>
  </div>
  <p>Dear {name},</p>
  <p>Thank you for choosing Steel Wheel Auto Limited. Your invoice is attached and can also be downloaded below.</p>
  <p><a href="{url}" style="background-color: #4CAF50; color: white; padding: 10px 15px; text-decoration: none; border-radius: 4px; display: inline-block; margin: 10px 0;">Download Invoice</a></p>
  <div style="margin-top: 30px; border-top: 1px solid #eee; padding-top: 20px;">
    <h3 style="color: #333;">Vehicle Details:</h3>
    <table style="width: 100%; border-collapse: collapse;">{rows}</table>
  </div>
  <p style="margin-top: 30px;">If you have any questions regarding your invoice, please don't hesitate to contact us.</p>
  <div style="margin-top: 30px; border-top: 1px solid #eee; padding-top: 20px; text-align: center; color: #777; font-size: 12px;">
    <p>&copy; {year} Steel Wheel Auto Limited. All Rights Reserved.</p>
    <p>Kingston, Jamaica</p>
  </div>
</div>"#,
        name = escape(&field(&r.customer_name)),
        url = escape(email.download_url),
        year = Utc::now().year(),
    )
}
