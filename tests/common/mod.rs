#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chrono::NaiveDate;
use lopdf::content::Content;
use lopdf::{Document, Object};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use steelwheel_invoicing::auth::StaticTokenVerifier;
use steelwheel_invoicing::config::DEFAULT_BANK_INFO;
use steelwheel_invoicing::email::{EmailError, InvoiceEmail, Mailer};
use steelwheel_invoicing::routes::{router, AppState};
use steelwheel_invoicing::store::{LocalBlobStore, MemoryInvoiceStore};
use steelwheel_invoicing::{InvoiceRecord, InvoiceRenderer};

pub const BASE_URL: &str = "http://test.local";

pub fn sample_record() -> InvoiceRecord {
    InvoiceRecord {
        customer_name: Some("John Doe".into()),
        customer_address: Some("123 Main St, Kingston, Jamaica".into()),
        customer_email: Some("john@example.com".into()),
        vehicle_make: Some("Toyota".into()),
        vehicle_model: Some("Corolla".into()),
        vehicle_year: Some(2020),
        vehicle_color: Some("Red".into()),
        chassis_no: Some("JTDBR32E720123456".into()),
        engine_no: Some("1ZZ-4567890".into()),
        invoice_amount: Some(5000.0),
        invoice_date: NaiveDate::from_ymd_opt(2025, 5, 5),
    }
}

/// Every string shown by a text operator on the document's single page.
pub fn pdf_text_runs(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("valid pdf");
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1, "invoice must be a single page");

    let mut runs = Vec::new();
    for page_id in pages.into_values() {
        let content = doc.get_page_content(page_id).expect("page content");
        for op in Content::decode(&content).expect("content stream").operations {
            match op.operator.as_str() {
                "Tj" | "'" | "\"" => op.operands.iter().for_each(|o| push_string(o, &mut runs)),
                "TJ" => {
                    for o in &op.operands {
                        if let Object::Array(items) = o {
                            items.iter().for_each(|i| push_string(i, &mut runs));
                        }
                    }
                }
                _ => {}
            }
        }
    }
    runs
}

fn push_string(obj: &Object, out: &mut Vec<String>) {
    if let Object::String(bytes, _) = obj {
        out.push(bytes.iter().filter(|b| **b != 0).map(|&b| b as char).collect());
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub invoice_number: String,
    pub subject: String,
    pub customer_email: Option<String>,
    pub download_url: String,
    pub attachment: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_invoice(&self, email: &InvoiceEmail<'_>) -> Result<String, EmailError> {
        let mut sent = self.sent.lock();
        sent.push(SentEmail {
            invoice_number: email.invoice_number.to_string(),
            subject: email.subject(),
            customer_email: email.record.customer_email.clone(),
            download_url: email.download_url.to_string(),
            attachment: email.attachment.to_vec(),
        });
        Ok(format!("email-{}", sent.len()))
    }
}

/// Router over in-memory records, blobs under `dir`, and a recording mailer.
/// Tokens: `alice-token` -> alice, `bob-token` -> bob.
pub fn test_app(dir: &Path) -> (Router, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState {
        invoices: Arc::new(MemoryInvoiceStore::default()),
        blobs: Arc::new(LocalBlobStore::new(dir, BASE_URL)),
        mailer: mailer.clone(),
        verifier: Arc::new(StaticTokenVerifier::new(HashMap::from([
            ("alice-token".to_string(), "alice".to_string()),
            ("bob-token".to_string(), "bob".to_string()),
        ]))),
        renderer: InvoiceRenderer::new(),
        bank_info: Arc::from(DEFAULT_BANK_INFO),
    };
    (router(state, "*"), mailer)
}
