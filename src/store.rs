//! Invoice records and rendered PDFs at rest.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Invoice;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid object name: {0}")]
    InvalidName(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn add(&self, invoice: Invoice) -> Result<(), StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<Invoice>, StoreError>;
    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    /// Invoices created by `owner`, newest first.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Invoice>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryInvoiceStore {
    invoices: RwLock<HashMap<Uuid, Invoice>>,
}

#[async_trait]
impl InvoiceStore for MemoryInvoiceStore {
    async fn add(&self, invoice: Invoice) -> Result<(), StoreError> {
        self.invoices.write().insert(invoice.id, invoice);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Invoice>, StoreError> {
        Ok(self.invoices.read().get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.invoices.write().remove(&id).is_some())
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Invoice>, StoreError> {
        let mut list: Vec<Invoice> = self
            .invoices
            .read()
            .values()
            .filter(|i| i.created_by == owner)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }
}

/// A stored object and the URL it can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub name: String,
    pub url: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, name: &str, data: Bytes) -> Result<StoredBlob, StoreError>;
    async fn get(&self, name: &str) -> Result<Bytes, StoreError>;
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}

/// Blobs as files under a root directory, served back under
/// `{public_base_url}/files/{name}`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self { root: root.into(), public_base_url: public_base_url.into() }
    }

    pub fn url_for(&self, name: &str) -> String {
        format!("{}/files/{}", self.public_base_url, name)
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(name);
        let ok = !name.is_empty() && rel.components().all(|c| matches!(c, Component::Normal(_)));
        if !ok {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

/// `raw` reduced to ASCII letters, digits and `-`, with everything else
/// replaced by `_`. Safe as a path segment and inside a quoted header value.
pub fn safe_file_stem(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn not_found(name: &str) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |e| match e.kind() {
        ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
        _ => StoreError::Io(e),
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, data: Bytes) -> Result<StoredBlob, StoreError> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        tracing::debug!(name, bytes = data.len(), "stored blob");
        Ok(StoredBlob { name: name.to_string(), url: self.url_for(name) })
    }

    async fn get(&self, name: &str) -> Result<Bytes, StoreError> {
        let path = self.resolve(name)?;
        let data = tokio::fs::read(&path).await.map_err(not_found(name))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let path = self.resolve(name)?;
        tokio::fs::remove_file(&path).await.map_err(not_found(name))
    }
}
