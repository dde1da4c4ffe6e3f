use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use uuid::Uuid;

use crate::{
    auth::{AuthUser, StaticTokenVerifier, TokenVerifier},
    config::Config,
    email::{EmailClient, InvoiceEmail, Mailer},
    error::ApiError,
    models::{CreateInvoiceRequest, CreateInvoiceResponse, Field, Invoice, InvoiceRecord, ResendResponse},
    pdf::{InvoiceRenderer, RenderedDocument},
    store::{safe_file_stem, BlobStore, InvoiceStore, LocalBlobStore, MemoryInvoiceStore, StoreError},
};

#[derive(Clone)]
pub struct AppState {
    pub invoices: Arc<dyn InvoiceStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub mailer: Arc<dyn Mailer>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub renderer: InvoiceRenderer,
    pub bank_info: Arc<str>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            invoices: Arc::new(MemoryInvoiceStore::default()),
            blobs: Arc::new(LocalBlobStore::new(&config.storage_dir, config.public_base_url.clone())),
            mailer: Arc::new(EmailClient::new(config.email.clone())),
            verifier: Arc::new(StaticTokenVerifier::new(config.api_tokens.clone())),
            renderer: InvoiceRenderer::new(),
            bank_info: Arc::from(config.bank_info.as_str()),
        }
    }
}

pub fn router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/invoices", post(create_invoice).get(list_invoices))
        .route("/api/invoices/:id", get(get_invoice).delete(delete_invoice))
        .route("/api/invoices/:id/pdf", get(download_pdf))
        .route("/api/invoices/:id/resend", post(resend_invoice))
        .route("/files/invoices/:name", get(serve_file))
        .fallback(not_found)
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let origins = if origin.trim() == "*" {
        AllowOrigin::from(Any)
    } else {
        let list: Vec<HeaderValue> = origin
            .split(',')
            .filter_map(|o| match HeaderValue::from_str(o.trim()) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn generate_invoice_number() -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("INV-{}-{:04}", Utc::now().format("%Y%m%d"), suffix)
}

/// Object name for a user's freshly rendered invoice.
fn pdf_file_name(uid: &str) -> String {
    format!("invoices/{}_{}.pdf", safe_file_stem(uid), Utc::now().timestamp_millis())
}

async fn render(state: &AppState, record: InvoiceRecord) -> Result<RenderedDocument, ApiError> {
    let renderer = state.renderer.clone();
    let bank_info = Arc::clone(&state.bank_info);
    let doc = tokio::task::spawn_blocking(move || renderer.render(&record, &bank_info))
        .await
        .map_err(|e| ApiError::Internal(format!("render task failed: {e}")))??;
    Ok(doc)
}

async fn load_owned(state: &AppState, id: Uuid, user: &AuthUser) -> Result<Invoice, ApiError> {
    let invoice = state.invoices.get(id).await?.ok_or(ApiError::NotFound)?;
    if invoice.created_by != user.0.uid {
        return Err(ApiError::Forbidden);
    }
    Ok(invoice)
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK", "timestamp": Utc::now().to_rfc3339() }))
}

pub async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": format!("The requested endpoint '{}' was not found", uri),
        })),
    )
        .into_response()
}

pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateInvoiceResponse>), ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    body.record
        .require(&Field::SUBMISSION)
        .map_err(|e| ApiError::MissingFields(e.missing))?;

    let invoice_number = body
        .invoice_number
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(generate_invoice_number);

    tracing::info!(%invoice_number, uid = %user.0.uid, "creating invoice");
    let doc = render(&state, body.record.clone()).await?;

    let blob = state.blobs.put(&pdf_file_name(&user.0.uid), doc.clone().into_bytes()).await?;

    let invoice = Invoice {
        id: Uuid::new_v4(),
        invoice_number,
        record: body.record,
        pdf_file: blob.name,
        pdf_url: blob.url,
        created_at: Utc::now(),
        created_by: user.0.uid.clone(),
    };
    state.invoices.add(invoice.clone()).await?;

    let email_id = state
        .mailer
        .send_invoice(&InvoiceEmail {
            invoice_number: &invoice.invoice_number,
            record: &invoice.record,
            download_url: &invoice.pdf_url,
            attachment: doc.as_bytes(),
        })
        .await?;

    tracing::info!(id = %invoice.id, %email_id, pdf_bytes = doc.len(), "invoice created and sent");
    Ok((
        StatusCode::CREATED,
        Json(CreateInvoiceResponse {
            message: "Invoice created and sent successfully".into(),
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number,
            pdf_url: invoice.pdf_url,
            email_id,
        }),
    ))
}

pub async fn list_invoices(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<Invoice>>, ApiError> {
    Ok(Json(state.invoices.list_by_owner(&user.0.uid).await?))
}

pub async fn get_invoice(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Invoice>, ApiError> {
    Ok(Json(load_owned(&state, id, &user).await?))
}

pub async fn download_pdf(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    let invoice = load_owned(&state, id, &user).await?;
    let doc = render(&state, invoice.record).await?;
    let disposition = format!("attachment; filename=\"{}.pdf\"", safe_file_stem(&invoice.invoice_number));
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/pdf".to_string()), (header::CONTENT_DISPOSITION, disposition)],
        doc.into_bytes(),
    )
        .into_response())
}

pub async fn delete_invoice(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let invoice = load_owned(&state, id, &user).await?;
    // A missing or undeletable PDF does not block removing the record.
    if let Err(e) = state.blobs.delete(&invoice.pdf_file).await {
        tracing::warn!(file = %invoice.pdf_file, error = %e, "could not delete invoice pdf");
    }
    state.invoices.delete(id).await?;
    tracing::info!(%id, "invoice deleted");
    Ok(Json(json!({ "message": "Invoice deleted successfully" })))
}

pub async fn resend_invoice(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ResendResponse>, ApiError> {
    let invoice = load_owned(&state, id, &user).await?;
    let pdf = match state.blobs.get(&invoice.pdf_file).await {
        Ok(bytes) => bytes,
        Err(StoreError::NotFound(_)) => {
            tracing::warn!(file = %invoice.pdf_file, "stored pdf missing, re-rendering");
            render(&state, invoice.record.clone()).await?.into_bytes()
        }
        Err(e) => return Err(e.into()),
    };
    let email_id = state
        .mailer
        .send_invoice(&InvoiceEmail {
            invoice_number: &invoice.invoice_number,
            record: &invoice.record,
            download_url: &invoice.pdf_url,
            attachment: &pdf,
        })
        .await?;
    Ok(Json(ResendResponse { message: "Invoice email resent successfully".into(), email_id }))
}

pub async fn serve_file(Path(name): Path<String>, State(state): State<AppState>) -> Result<Response, ApiError> {
    let bytes = state.blobs.get(&format!("invoices/{name}")).await?;
    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
}
